//! Error types for the faucet service

use apex_chain::ChainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Faucet service errors
#[derive(Error, Debug)]
pub enum FaucetError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Storage error: {0}")]
    Persistence(#[from] sled::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for FaucetError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match self {
            FaucetError::Chain(ChainError::InvalidAddress(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid address: {}", msg),
                "INVALID_ADDRESS",
            ),
            FaucetError::Chain(err) if err.is_rpc() => (
                StatusCode::BAD_GATEWAY,
                format!("Node RPC error: {}", err),
                "RPC_ERROR",
            ),
            FaucetError::Chain(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Chain error: {}", err),
                "CHAIN_ERROR",
            ),
            FaucetError::Persistence(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", err),
                "PERSISTENCE_ERROR",
            ),
            FaucetError::Codec(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Codec error: {}", err),
                "INTERNAL_ERROR",
            ),
            FaucetError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", msg),
                "INTERNAL_ERROR",
            ),
        };

        let body = Json(json!({
            "error": error_code,
            "message": error_message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));

        (status, body).into_response()
    }
}

pub type FaucetResult<T> = Result<T, FaucetError>;
