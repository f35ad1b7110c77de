//! wirestat-api — HTTP query surface for wirestat.
//!
//! axum handlers over the sample store, rate engine, and the device
//! summary channel. Traffic endpoints answer from stored samples only;
//! nothing here touches the wire.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/traffic?scale=` | Derived bandwidth rates, bit/s |
//! | GET | `/api/v1/values?scale=` | Raw counter values in the window |
//! | GET | `/api/v1/device` | Latest device identity snapshot |
//! | GET | `/healthz` | Liveness and store reachability |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::watch;

use wirestat_collector::{DeviceSummary, MetricCatalog};
use wirestat_store::SampleStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: SampleStore,
    pub catalog: Arc<MetricCatalog>,
    pub summary: watch::Receiver<DeviceSummary>,
}

/// Build the complete query router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/traffic", get(handlers::get_traffic))
        .route("/values", get(handlers::get_values))
        .route("/device", get(handlers::get_device))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz).with_state(state))
}
