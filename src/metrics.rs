// Prometheus metrics definitions for the pvpdex backend.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Ranking entries loaded across all categories and brackets.
    pub static ref RANKING_ENTRIES_LOADED: IntGauge =
        IntGauge::new(
            "pvpdex_ranking_entries_loaded",
            "Ranking entries loaded at startup"
        ).unwrap();

    /// Species templates in the catalog.
    pub static ref CATALOG_SPECIES: IntGauge =
        IntGauge::new(
            "pvpdex_catalog_species",
            "Species templates loaded from the game master"
        ).unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    pub static ref SPREAD_CACHE_HITS_TOTAL: IntCounter = IntCounter::new(
        "pvpdex_spread_cache_hits_total",
        "Top-spread lookups served from cache",
    )
    .unwrap();

    pub static ref SPREAD_CACHE_MISSES_TOTAL: IntCounter = IntCounter::new(
        "pvpdex_spread_cache_misses_total",
        "Top-spread lookups that ran the full IV search",
    )
    .unwrap();

    /// Annotation attempts, by outcome (matched, rejected).
    pub static ref ANNOTATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pvpdex_annotations_total", "PVP annotation attempts"),
        &["outcome"],
    )
    .unwrap();

    pub static ref TEAMS_SYNTHESIZED_TOTAL: IntCounter = IntCounter::new(
        "pvpdex_teams_synthesized_total",
        "Teams returned by the team synthesizer",
    )
    .unwrap();

    pub static ref SEARCH_QUERIES_TOTAL: IntCounter = IntCounter::new(
        "pvpdex_search_queries_total",
        "Search queries evaluated",
    )
    .unwrap();

    pub static ref RECORDS_INGESTED_TOTAL: IntCounter = IntCounter::new(
        "pvpdex_records_ingested_total",
        "Creature records normalized from uploads",
    )
    .unwrap();

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pvpdex_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Wall time of one exhaustive top-spread search.
    pub static ref SPREAD_SEARCH_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pvpdex_spread_search_duration_seconds",
            "Top-spread search duration in seconds",
        )
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1]),
    )
    .unwrap();

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "pvpdex_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(RANKING_ENTRIES_LOADED.clone()),
            Box::new(CATALOG_SPECIES.clone()),
            Box::new(SPREAD_CACHE_HITS_TOTAL.clone()),
            Box::new(SPREAD_CACHE_MISSES_TOTAL.clone()),
            Box::new(ANNOTATIONS_TOTAL.clone()),
            Box::new(TEAMS_SYNTHESIZED_TOTAL.clone()),
            Box::new(SEARCH_QUERIES_TOTAL.clone()),
            Box::new(RECORDS_INGESTED_TOTAL.clone()),
            Box::new(API_REQUESTS_TOTAL.clone()),
            Box::new(SPREAD_SEARCH_DURATION_SECONDS.clone()),
            Box::new(API_REQUEST_DURATION_SECONDS.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::warn!("failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Normalize a URL path for metric labels: replace numeric path segments with `:id`
/// to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
