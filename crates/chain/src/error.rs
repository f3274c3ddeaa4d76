use thiserror::Error;

/// Errors from the chain-facing layer.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The claimed address failed a shape or checksum check.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The configured sender key could not be decoded.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature bytes could not be interpreted.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// The RPC call never produced a response (timeout, refused connection,
    /// protocol failure).
    #[error("RPC request failed: {0}")]
    RpcTransport(#[from] reqwest::Error),

    /// The node answered with a structured error payload.
    #[error("RPC node error {code}: {message}")]
    RpcNode { code: i64, message: String },

    /// The node answered, but not with anything we could use.
    #[error("Malformed RPC response: {0}")]
    RpcResponse(String),
}

impl ChainError {
    /// True for failures of the remote call itself rather than bad local
    /// input; these are reported to users as a generic failure.
    pub fn is_rpc(&self) -> bool {
        matches!(
            self,
            ChainError::RpcTransport(_) | ChainError::RpcNode { .. } | ChainError::RpcResponse(_)
        )
    }
}
