//! Prometheus metrics and the /metrics endpoint

use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Projector counters, registered on a dedicated registry.
pub struct Metrics {
    registry: Registry,
    pub events_applied: IntCounterVec,
    pub duplicate_events: IntCounter,
    pub missing_aggregates: IntCounter,
    pub clamped_underflows: IntCounter,
    pub out_of_order_events: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events_applied = IntCounterVec::new(
            Opts::new("indexer_events_applied_total", "Events applied, by kind"),
            &["kind"],
        )?;
        let duplicate_events = IntCounter::new(
            "indexer_duplicate_events_total",
            "Events skipped because their raw log entry already existed",
        )?;
        let missing_aggregates = IntCounter::new(
            "indexer_missing_aggregates_total",
            "Aggregate updates dropped because the target entity was absent",
        )?;
        let clamped_underflows = IntCounter::new(
            "indexer_clamped_underflows_total",
            "Unpraise deltas clamped to zero instead of going negative",
        )?;
        let out_of_order_events = IntCounter::new(
            "indexer_out_of_order_events_total",
            "Events observed at or before an already-applied position",
        )?;

        registry.register(Box::new(events_applied.clone()))?;
        registry.register(Box::new(duplicate_events.clone()))?;
        registry.register(Box::new(missing_aggregates.clone()))?;
        registry.register(Box::new(clamped_underflows.clone()))?;
        registry.register(Box::new(out_of_order_events.clone()))?;

        Ok(Self {
            registry,
            events_applied,
            duplicate_events,
            missing_aggregates,
            clamped_underflows,
            out_of_order_events,
        })
    }

    /// Render the registry in Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Start the metrics server
pub async fn start_metrics_server(
    port: u16,
    metrics: Arc<Metrics>,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics);

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Metrics server listening on {}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    Ok(handle)
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> (StatusCode, String) {
    match metrics.encode() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn health_handler() -> &'static str {
    "ok"
}
