/// Entry point for the cgscrape container-telemetry agent.
///
/// Discovers containers via the cgroup v2 filesystem, samples their resource
/// usage once per interval into the transactional metric cache, and serves
/// the cache in the Prometheus text format on the scrape endpoint.
///
/// # Examples
///
/// ```bash
/// SCRAPE_LISTEN_ADDR=0.0.0.0:9102 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    cgscrape::run().await
}
