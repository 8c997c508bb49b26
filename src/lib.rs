use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// cgscrape: a container-telemetry agent that samples per-container resource
/// usage from the cgroup v2 filesystem and exposes it as Prometheus metrics.
///
/// The heart of the crate is [`cache`], a transactional metric cache sitting
/// between the per-container stat collectors (writers) and the HTTP scrape
/// handler (readers). Collectors re-declare the full current state once per
/// interval inside a write session; the cache's reset-mode commit prunes
/// whatever was not re-declared, so metrics of removed containers disappear
/// without bookkeeping.
pub mod api;
pub mod cache;
pub mod collector;
pub mod container;
pub mod discovery;
pub mod error;
pub mod expose;
pub mod monitor;

use error::ResultOkLogExt;

/// Runs the scrape agent: discovers containers under the cgroup v2 root,
/// samples them once per interval into the metric cache, and serves the
/// cache on the scrape endpoint.
///
/// # Configuration
///
/// - `CGROUP_ROOT` - cgroup v2 mount point to scan (default `/sys/fs/cgroup`)
/// - `SCRAPE_LISTEN_ADDR` - scrape endpoint address (default `0.0.0.0:9102`)
/// - `SCRAPE_INTERVAL_SECS` - collection interval in seconds (default `1`)
///
/// # Errors
///
/// Returns an error when the configured interval does not parse; a missing
/// cgroup root is logged per cycle rather than fatal, so the agent survives
/// a late-mounting filesystem.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cgroup_root = std::env::var_os("CGROUP_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/sys/fs/cgroup"));
    let listen_addr =
        std::env::var("SCRAPE_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:9102".to_owned());
    let interval_secs = match std::env::var("SCRAPE_INTERVAL_SECS") {
        Ok(raw) => raw.parse::<u64>().map_err(|err| {
            format!("invalid SCRAPE_INTERVAL_SECS `{raw}`: {err}")
        })?,
        Err(_) => 1,
    };
    log::debug!("cgroup root: {}", cgroup_root.display());
    log::debug!("scrape endpoint: {listen_addr}, interval: {interval_secs}s");

    let cache = Arc::new(cache::Cache::new(cache::Mode::Reset));
    let monitor = Arc::new(monitor::Monitor::default());
    let scanner = discovery::Scanner::new(cgroup_root);

    {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            let server = api::ScrapeServer::new(cache);
            server.listen(listen_addr).await
        });
    }

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;

        let cache = Arc::clone(&cache);
        let monitor = Arc::clone(&monitor);
        let scanner = scanner.clone();

        // The session does synchronous file I/O and holds the cache's write
        // lock, so it must stay off the async runtime threads.
        tokio::task::spawn_blocking(move || {
            let _ = scanner.scan(&monitor).ok_log("cgroup scan failed");

            let before = std::time::Instant::now();
            let mut session = cache.begin_session();
            monitor.collect(&mut session);
            session.commit();
            log::trace!(
                "collected {} containers in {} nanoseconds",
                monitor.size(),
                before.elapsed().as_nanos()
            );
        })
        .await
        .expect("spawn_blocking panicked");
    }
}
