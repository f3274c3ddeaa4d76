//! Rate-limited token dispenser for the Apex network
//!
//! The service hands out a fixed grant of CPX per claimant with:
//! - A durable per-claimant eligibility record with a cooldown window
//! - Atomic check-and-grant, serialized per claimant
//! - Globally serialized nonce fetch and transaction submission
//! - Monitoring and metrics

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod service;

pub use config::FaucetConfig;
pub use error::{FaucetError, FaucetResult};
pub use ledger::{ClaimantRecord, EligibilityLedger, GrantDecision, LedgerStats};
pub use service::{ClaimOutcome, ClaimRequest, Dispenser};
