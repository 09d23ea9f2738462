//! Prometheus metrics registry and instruments.
//!
//! Registered once at startup; the axum layer counts requests per route and
//! `/metrics` serves the encoded registry.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry.
    pub static ref REGISTRY: Registry = Registry::new();

    /// HTTP requests by method, route and status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ccbridge_http_requests_total", "Total number of HTTP requests"),
        &["method", "route", "status"]
    ).expect("metric can be created");

    /// Inbound activities by type.
    pub static ref ACTIVITIES_RECEIVED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ccbridge_activities_received_total", "Inbound ActivityPub activities"),
        &["activity_type"]
    ).expect("metric can be created");

    /// Outbound inbox deliveries by result.
    pub static ref DELIVERIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ccbridge_deliveries_total", "Outbound inbox deliveries"),
        &["result"]
    ).expect("metric can be created");

    /// Person cache lookups by result.
    pub static ref PERSON_CACHE_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ccbridge_person_cache_total", "Person cache lookups"),
        &["result"]
    ).expect("metric can be created");
}

/// Register all instruments with the global registry. Call once at startup.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACTIVITIES_RECEIVED_TOTAL.clone()))
        .expect("ACTIVITIES_RECEIVED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(DELIVERIES_TOTAL.clone()))
        .expect("DELIVERIES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PERSON_CACHE_TOTAL.clone()))
        .expect("PERSON_CACHE_TOTAL can be registered");

    tracing::info!("metrics registry initialized");
}

/// Encode the registry in the Prometheus text exposition format.
#[must_use]
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/ap/acct/{id}", "200"])
            .inc();
        assert!(
            HTTP_REQUESTS_TOTAL
                .with_label_values(&["GET", "/ap/acct/{id}", "200"])
                .get()
                >= 1
        );
    }
}
