//! Claim dispatch pipeline.

use crate::config::FaucetConfig;
use crate::error::FaucetResult;
use crate::ledger::{EligibilityLedger, GrantDecision};
use crate::metrics;
use apex_chain::{validate_address, ChainError, KeyPair, LedgerNode, ScriptHash, TxBuilder, TxId};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

/// A single claim as delivered by the outer transport.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    /// Platform-assigned claimant identifier
    pub claimant_id: i64,
    /// Raw destination address text
    pub address: String,
    /// Human-readable label, informational only
    #[serde(default)]
    pub display_name: String,
}

/// Terminal outcome of one claim. The `Display` form is the user-facing
/// message forwarded by the transport.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    Granted {
        amount: u64,
        symbol: String,
        address: String,
        tx_id: String,
    },
    InvalidAddress {
        reason: String,
    },
    NotYetEligible {
        next_eligible_at: i64,
    },
    Failed,
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimOutcome::Granted {
                amount,
                symbol,
                address,
                tx_id,
            } => write!(
                f,
                "Success! {} {} are on their way to {} (tx {})",
                amount, symbol, address, tx_id
            ),
            ClaimOutcome::InvalidAddress { reason } => {
                write!(f, "That does not look like a valid address: {}", reason)
            }
            ClaimOutcome::NotYetEligible { next_eligible_at } => write!(
                f,
                "You already received a grant recently. Next claim possible at {}",
                format_instant(*next_eligible_at)
            ),
            ClaimOutcome::Failed => write!(
                f,
                "Something went wrong while sending your grant. Please try again later."
            ),
        }
    }
}

fn format_instant(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(instant) => instant.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{} ms", ms),
    }
}

/// Claim coordinator. Holds the funding key, the eligibility ledger, and the
/// node client; everything here is immutable after construction except the
/// two synchronization points (per-claimant locks inside the ledger, and the
/// global nonce lock).
pub struct Dispenser {
    ledger: Arc<EligibilityLedger>,
    node: Arc<dyn LedgerNode>,
    builder: TxBuilder,
    sender: ScriptHash,
    grant_amount: u64,
    cooldown_ms: i64,
    token_symbol: String,
    /// Held across nonce fetch, build, and submit so concurrent grants get
    /// strictly increasing nonces for the shared funding account.
    nonce_lock: Mutex<()>,
    claim_permits: Semaphore,
}

impl Dispenser {
    pub fn new(
        config: &FaucetConfig,
        ledger: Arc<EligibilityLedger>,
        node: Arc<dyn LedgerNode>,
    ) -> FaucetResult<Arc<Self>> {
        let keypair = KeyPair::from_private_key_hex(&config.private_key)?;
        let builder = TxBuilder::new(keypair, config.tx_version, config.gas_price, config.gas_limit);
        let sender = builder.sender_script_hash();

        info!("Funding account address: {}", sender.to_address());

        Ok(Arc::new(Self {
            ledger,
            node,
            builder,
            sender,
            grant_amount: config.grant_amount,
            cooldown_ms: config.cooldown_ms,
            token_symbol: config.token_symbol.clone(),
            nonce_lock: Mutex::new(()),
            claim_permits: Semaphore::new(config.max_concurrent_claims),
        }))
    }

    /// Handle one claim on its own task. The pipeline keeps running even if
    /// the caller goes away; claims from distinct claimants run in parallel
    /// up to the permit bound.
    pub async fn handle_claim(self: Arc<Self>, request: ClaimRequest) -> ClaimOutcome {
        let handle = tokio::spawn({
            let dispenser = self;
            async move {
                let _permit = match dispenser.claim_permits.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return ClaimOutcome::Failed,
                };
                dispenser.process(request).await
            }
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Claim task failed: {}", e);
                ClaimOutcome::Failed
            }
        }
    }

    async fn process(&self, request: ClaimRequest) -> ClaimOutcome {
        let now_ms = Utc::now().timestamp_millis();
        self.process_at(request, now_ms).await
    }

    /// The claim pipeline with an explicit clock.
    async fn process_at(&self, request: ClaimRequest, now_ms: i64) -> ClaimOutcome {
        metrics::CLAIMS_RECEIVED.inc();
        info!(
            "Claim from {} ({}): address={}",
            request.claimant_id, request.display_name, request.address
        );

        // 1. Validate the address before anything touches disk or network.
        let recipient = match validate_address(&request.address) {
            Ok(hash) => hash,
            Err(e) => {
                metrics::CLAIMS_INVALID_ADDRESS.inc();
                warn!(
                    "Claimant {} sent an invalid address: {}",
                    request.claimant_id, e
                );
                let reason = match e {
                    ChainError::InvalidAddress(reason) => reason,
                    other => other.to_string(),
                };
                return ClaimOutcome::InvalidAddress { reason };
            }
        };

        // 2. Atomically consume the eligibility window. The record is durable
        // before the transfer is attempted; a lost transfer does not reopen
        // the window.
        let decision = match self
            .ledger
            .check_and_grant(
                request.claimant_id,
                &request.address,
                &request.display_name,
                now_ms,
                self.grant_amount,
                self.cooldown_ms,
            )
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                metrics::CLAIMS_FAILED.inc();
                error!(
                    "Ledger failure for claimant {}: {}",
                    request.claimant_id, e
                );
                return ClaimOutcome::Failed;
            }
        };

        let record = match decision {
            GrantDecision::Granted { record } => record,
            GrantDecision::NotYetEligible { next_eligible_at } => {
                metrics::CLAIMS_NOT_ELIGIBLE.inc();
                info!(
                    "Claimant {} not eligible until {}",
                    request.claimant_id, next_eligible_at
                );
                return ClaimOutcome::NotYetEligible { next_eligible_at };
            }
        };

        // 3. Build and submit the transfer.
        match self.submit_transfer(&recipient).await {
            Ok(tx_id) => {
                metrics::GRANTS_TOTAL.inc();
                metrics::UNITS_DISPENSED.inc_by(self.grant_amount);
                info!(
                    "Granted {} {} to claimant {} (tx {})",
                    self.grant_amount, self.token_symbol, request.claimant_id, tx_id
                );
                ClaimOutcome::Granted {
                    amount: self.grant_amount,
                    symbol: self.token_symbol.clone(),
                    address: request.address,
                    tx_id: tx_id.to_string(),
                }
            }
            Err(e) => {
                metrics::CLAIMS_FAILED.inc();
                error!(
                    "Transfer for claimant {} failed after the grant was recorded (next eligible {}): {}",
                    request.claimant_id, record.next_eligible_at, e
                );
                ClaimOutcome::Failed
            }
        }
    }

    /// Fetch the sender nonce, then build, sign, and submit one transfer.
    /// The whole sequence runs under the nonce lock.
    async fn submit_transfer(&self, to: &ScriptHash) -> Result<TxId, ChainError> {
        let _guard = self.nonce_lock.lock().await;

        let state = self.node.account_state(&self.sender).await?;
        metrics::SENDER_BALANCE.set(state.balance as i64);
        if state.balance < self.grant_amount {
            warn!(
                "Funding account balance {} below grant amount {}",
                state.balance, self.grant_amount
            );
        }

        let signed = self.builder.build(*to, self.grant_amount, state.nonce);
        self.node.submit(&signed.to_bytes()).await
    }

    pub fn sender_script_hash(&self) -> ScriptHash {
        self.sender
    }

    pub fn sender_address(&self) -> String {
        self.sender.to_address()
    }

    pub fn grant_amount(&self) -> u64 {
        self.grant_amount
    }
}
