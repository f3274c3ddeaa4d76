//! HTTP API for the faucet service

use crate::error::FaucetResult;
use crate::ledger::EligibilityLedger;
use crate::metrics;
use crate::service::{ClaimOutcome, ClaimRequest, Dispenser};
use apex_chain::LedgerNode;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispenser: Arc<Dispenser>,
    pub ledger: Arc<EligibilityLedger>,
    pub node: Arc<dyn LedgerNode>,
}

/// Claim response: the user-facing message plus the structured outcome.
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ClaimOutcome,
}

/// Faucet status
#[derive(Debug, Serialize)]
pub struct FaucetStatus {
    pub sender_address: String,
    pub balance: u64,
    pub grant_amount: u64,
    pub claimants: u64,
    pub total_granted: u64,
}

/// Claim handler
pub async fn claim_handler(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> impl IntoResponse {
    info!(
        "Claim request: claimant={} address={}",
        request.claimant_id, request.address
    );

    let outcome = state.dispenser.clone().handle_claim(request).await;

    let status = match &outcome {
        ClaimOutcome::Granted { .. } => StatusCode::OK,
        ClaimOutcome::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
        ClaimOutcome::NotYetEligible { .. } => StatusCode::TOO_MANY_REQUESTS,
        ClaimOutcome::Failed => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(ClaimResponse {
            message: outcome.to_string(),
            outcome,
        }),
    )
}

/// Status handler
pub async fn status_handler(
    State(state): State<AppState>,
) -> FaucetResult<Json<FaucetStatus>> {
    let account = state
        .node
        .account_state(&state.dispenser.sender_script_hash())
        .await?;
    let stats = state.ledger.stats()?;

    Ok(Json(FaucetStatus {
        sender_address: state.dispenser.sender_address(),
        balance: account.balance,
        grant_amount: state.dispenser.grant_amount(),
        claimants: stats.claimants,
        total_granted: stats.total_granted,
    }))
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus metrics handler
pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            error!("Metrics encoding failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}

/// Root handler with info
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Apex Faucet",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Rate-limited CPX dispenser for the Apex network",
        "endpoints": {
            "POST /api/claim": "Request a grant",
            "GET /api/status": "Get faucet status",
            "GET /health": "Health check",
            "GET /metrics": "Prometheus metrics"
        }
    }))
}
