//! REST API Handlers
//!
//! Each sizing request carries its own report text and is processed
//! independently against the shared, read-only engine.

use crate::error::{Error, Result};
use crate::ingest::AssemblerOptions;
use crate::metrics::SizingMetrics;
use crate::report::{AllocationReport, TierReport};
use crate::sizing::{AllocationMode, AllocationPolicy, SizingEngine};
use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Tier recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSizingRequest {
    /// Raw usage export text
    pub report: String,
    /// Surface recovered input problems as warnings
    #[serde(default)]
    pub strict: bool,
}

/// Cost allocation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSizingRequest {
    /// Raw usage export text
    pub report: String,
    /// Surface recovered input problems as warnings
    #[serde(default)]
    pub strict: bool,
    /// Override the configured cluster cost (USD/month)
    #[serde(default)]
    pub total_monthly_cost: Option<f64>,
    /// Override the configured share policy: pureSize, blended
    #[serde(default)]
    pub mode: Option<String>,
    /// Extra heavy-IOPS clients for this request
    #[serde(default)]
    pub heavy_iops_clients: Vec<String>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiErrorResponse {
    fn into_response(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    engine: Arc<SizingEngine>,
    metrics: SizingMetrics,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(engine: Arc<SizingEngine>, metrics: SizingMetrics) -> Self {
        Self { engine, metrics }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            engine: self.engine,
            metrics: self.metrics,
        };

        Router::new()
            // Sizing endpoints
            .route("/v1/sizing/tiers", post(size_tiers))
            .route("/v1/sizing/allocation", post(size_allocation))
            .route("/v1/policy", get(get_policy))
            // Operational endpoints
            .route("/metrics", get(get_metrics))
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<SizingEngine>,
    metrics: SizingMetrics,
}

// =============================================================================
// Handlers
// =============================================================================

/// Recommend a tier for every client in the report
async fn size_tiers(
    State(state): State<AppState>,
    Json(request): Json<TierSizingRequest>,
) -> Response {
    debug!("Tier sizing request: {} bytes", request.report.len());

    let options = AssemblerOptions {
        strict: request.strict,
    };
    let run = state.engine.run_tiers(&request.report, options);
    state
        .metrics
        .observe_run("tiers", run.recommendations.len(), &run.stats);

    (StatusCode::OK, Json(TierReport::from(&run))).into_response()
}

/// Allocate the cluster cost across every client in the report
async fn size_allocation(
    State(state): State<AppState>,
    Json(request): Json<AllocationSizingRequest>,
) -> Response {
    debug!("Allocation sizing request: {} bytes", request.report.len());

    let engine = match engine_for_request(&state.engine, &request) {
        Ok(engine) => engine,
        Err(e) => return error_response(e),
    };

    let options = AssemblerOptions {
        strict: request.strict,
    };
    let run = engine.run_allocation(&request.report, options);
    state
        .metrics
        .observe_run("allocation", run.allocation.clients.len(), &run.stats);

    (StatusCode::OK, Json(AllocationReport::from(&run))).into_response()
}

/// Effective sizing policy
async fn get_policy(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.engine.policy().clone()))
}

/// Prometheus metrics
async fn get_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok((content_type, body)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// =============================================================================
// Helpers
// =============================================================================

/// Apply per-request allocation overrides; reuses the shared engine when none
fn engine_for_request(
    engine: &Arc<SizingEngine>,
    request: &AllocationSizingRequest,
) -> Result<Arc<SizingEngine>> {
    if request.total_monthly_cost.is_none()
        && request.mode.is_none()
        && request.heavy_iops_clients.is_empty()
    {
        return Ok(engine.clone());
    }

    let mut allocation: AllocationPolicy = engine.policy().allocation.clone();
    if let Some(total) = request.total_monthly_cost {
        allocation.total_monthly_cost = total;
    }
    if let Some(mode) = &request.mode {
        allocation.mode = mode.parse::<AllocationMode>()?;
    }
    let allocation = allocation.with_heavy_clients(&request.heavy_iops_clients);

    info!(
        mode = %allocation.mode,
        total = allocation.total_monthly_cost,
        "Applying request allocation overrides"
    );
    Ok(Arc::new(engine.with_allocation(allocation)?))
}

fn error_response(e: Error) -> Response {
    if e.is_client_error() {
        ApiErrorResponse {
            error: "invalid_request".into(),
            message: e.to_string(),
        }
        .into_response(StatusCode::BAD_REQUEST)
    } else {
        error!("Sizing request failed: {}", e);
        ApiErrorResponse {
            error: "internal_error".into(),
            message: e.to_string(),
        }
        .into_response(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
