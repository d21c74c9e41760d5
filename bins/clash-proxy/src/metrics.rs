// Prometheus counters for proxied traffic

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();

    /// Requests handled, by route and response status
    static ref REQUESTS: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new("clash_proxy_requests_total", "Requests handled by the proxy"),
            &["route", "status"],
        )
        .unwrap_or_else(|e| panic!("invalid metric definition: {}", e));
        REGISTRY
            .register(Box::new(counter.clone()))
            .unwrap_or_else(|e| panic!("metric registered twice: {}", e));
        counter
    };
}

pub fn record(route: &str, status: u16) {
    REQUESTS.with_label_values(&[route, &status.to_string()]).inc();
}

/// Render every registered metric in the text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    // touch the counter so its family shows up before the first request
    lazy_static::initialize(&REQUESTS);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
