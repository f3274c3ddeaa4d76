//! Prometheus metrics for the faucet service.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Claim pipeline counters
    pub static ref CLAIMS_RECEIVED: IntCounter = IntCounter::new(
        "apex_faucet_claims_received_total",
        "Total number of claims received"
    ).unwrap();

    pub static ref GRANTS_TOTAL: IntCounter = IntCounter::new(
        "apex_faucet_grants_total",
        "Total number of grants submitted to the ledger"
    ).unwrap();

    pub static ref UNITS_DISPENSED: IntCounter = IntCounter::new(
        "apex_faucet_units_dispensed_total",
        "Total asset units dispensed"
    ).unwrap();

    pub static ref CLAIMS_INVALID_ADDRESS: IntCounter = IntCounter::new(
        "apex_faucet_claims_invalid_address_total",
        "Claims rejected for a malformed or mistyped address"
    ).unwrap();

    pub static ref CLAIMS_NOT_ELIGIBLE: IntCounter = IntCounter::new(
        "apex_faucet_claims_not_eligible_total",
        "Claims rejected because the cooldown window is still open"
    ).unwrap();

    pub static ref CLAIMS_FAILED: IntCounter = IntCounter::new(
        "apex_faucet_claims_failed_total",
        "Claims that failed from storage or node errors"
    ).unwrap();

    // Funding account
    pub static ref SENDER_BALANCE: IntGauge = IntGauge::new(
        "apex_faucet_sender_balance",
        "Last observed balance of the funding account"
    ).unwrap();
}

/// Register all faucet metrics. Call once at startup.
pub fn register() {
    REGISTRY.register(Box::new(CLAIMS_RECEIVED.clone())).unwrap();
    REGISTRY.register(Box::new(GRANTS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(UNITS_DISPENSED.clone())).unwrap();
    REGISTRY.register(Box::new(CLAIMS_INVALID_ADDRESS.clone())).unwrap();
    REGISTRY.register(Box::new(CLAIMS_NOT_ELIGIBLE.clone())).unwrap();
    REGISTRY.register(Box::new(CLAIMS_FAILED.clone())).unwrap();
    REGISTRY.register(Box::new(SENDER_BALANCE.clone())).unwrap();
}

/// Gather metrics as Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    encoder.encode_to_string(&REGISTRY.gather())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_metrics_render_as_text() {
        register();
        CLAIMS_RECEIVED.inc();

        let text = render().unwrap();
        assert!(text.contains("apex_faucet_claims_received_total"));
        assert!(text.contains("apex_faucet_sender_balance"));
    }
}
