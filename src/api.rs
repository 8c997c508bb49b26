use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::cache::Cache;
use crate::expose;

async fn scrape(State(cache): State<Arc<Cache>>) -> Response {
    // Rendering happens entirely under the snapshot guard; the guard is
    // released before the response leaves the handler.
    let body = {
        let snapshot = cache.gather();
        expose::render(&snapshot)
    };
    (
        [(axum::http::header::CONTENT_TYPE, expose::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// HTTP server exposing the metric cache under `GET /metrics`.
pub struct ScrapeServer {
    router: axum::Router,
}

impl ScrapeServer {
    pub fn new(cache: Arc<Cache>) -> Self {
        let router = axum::Router::new()
            .route("/metrics", get(scrape))
            .with_state(cache);
        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("TCP Listener bind");
        axum::serve(listener, self.router.into_make_service())
            .await
            .expect("scrape server exited")
    }
}
