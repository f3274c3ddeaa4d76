//! Durable eligibility ledger tracking one grant record per claimant.

use crate::error::FaucetResult;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Grant record, one per claimant. Created lazily on first claim and never
/// deleted. `next_eligible_at` only moves forward, and only together with
/// `total_granted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimantRecord {
    /// Platform-assigned claimant identifier
    pub claimant_id: i64,
    /// Destination address of the latest grant
    pub address: String,
    /// Display name at the latest grant, informational only
    pub display_name: String,
    /// Instant of the latest grant (ms since epoch)
    pub last_grant_at: i64,
    /// Claims before this instant are rejected (ms since epoch)
    pub next_eligible_at: i64,
    /// Number of grants ever made to this claimant
    pub grants: u64,
    /// Asset units ever dispensed to this claimant
    pub total_granted: u64,
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantDecision {
    Granted { record: ClaimantRecord },
    NotYetEligible { next_eligible_at: i64 },
}

/// Aggregate counters over all claimant records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LedgerStats {
    pub claimants: u64,
    pub grants: u64,
    pub total_granted: u64,
}

/// Eligibility ledger backed by sled. All record mutation goes through
/// [`EligibilityLedger::check_and_grant`], which serializes claims per
/// claimant and flushes before reporting a grant.
pub struct EligibilityLedger {
    db: Db,
    records: Tree,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl EligibilityLedger {
    /// Create or open the ledger at the given path.
    pub fn open(path: impl AsRef<Path>) -> FaucetResult<Self> {
        info!("Opening eligibility ledger at: {}", path.as_ref().display());

        let db = sled::open(path)?;
        let records = db.open_tree("claimants")?;

        Ok(Self {
            db,
            records,
            locks: DashMap::new(),
        })
    }

    fn lock_for(&self, claimant_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(claimant_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Check eligibility and, if eligible, record the grant in one atomic
    /// step. Calls for the same claimant are serialized; distinct claimants
    /// proceed in parallel. The updated record is flushed to disk before
    /// `Granted` is returned, so a crash cannot reopen a consumed window.
    pub async fn check_and_grant(
        &self,
        claimant_id: i64,
        address: &str,
        display_name: &str,
        now_ms: i64,
        grant_amount: u64,
        cooldown_ms: i64,
    ) -> FaucetResult<GrantDecision> {
        let lock = self.lock_for(claimant_id);
        let _guard = lock.lock().await;

        let key = claimant_id.to_be_bytes();
        let existing = match self.records.get(key)? {
            Some(bytes) => Some(bincode::deserialize::<ClaimantRecord>(&bytes)?),
            None => None,
        };

        if let Some(ref record) = existing {
            if now_ms < record.next_eligible_at {
                debug!(
                    "Claimant {} inside cooldown until {}",
                    claimant_id, record.next_eligible_at
                );
                return Ok(GrantDecision::NotYetEligible {
                    next_eligible_at: record.next_eligible_at,
                });
            }
        }

        let (grants, total_granted) = match existing {
            Some(record) => (
                record.grants.saturating_add(1),
                record.total_granted.saturating_add(grant_amount),
            ),
            None => (1, grant_amount),
        };

        let record = ClaimantRecord {
            claimant_id,
            address: address.to_string(),
            display_name: display_name.to_string(),
            last_grant_at: now_ms,
            next_eligible_at: now_ms + cooldown_ms,
            grants,
            total_granted,
        };

        self.records.insert(key, bincode::serialize(&record)?)?;
        self.db.flush_async().await?;

        debug!(
            "Recorded grant for claimant {}: total {} units, next eligible {}",
            claimant_id, record.total_granted, record.next_eligible_at
        );

        Ok(GrantDecision::Granted { record })
    }

    /// Fetch a claimant's record, if one exists.
    pub fn get(&self, claimant_id: i64) -> FaucetResult<Option<ClaimantRecord>> {
        match self.records.get(claimant_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Aggregate counters, computed with a full scan.
    pub fn stats(&self) -> FaucetResult<LedgerStats> {
        let mut stats = LedgerStats::default();

        for item in self.records.iter() {
            let (_, value) = item?;
            let record: ClaimantRecord = bincode::deserialize(&value)?;
            stats.claimants += 1;
            stats.grants += record.grants;
            stats.total_granted = stats.total_granted.saturating_add(record.total_granted);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000_000;
    const COOLDOWN: i64 = 604_800_000;
    const AMOUNT: u64 = 1000;

    fn open_ledger(dir: &TempDir) -> EligibilityLedger {
        EligibilityLedger::open(dir.path().join("ledger")).unwrap()
    }

    async fn grant(ledger: &EligibilityLedger, id: i64, now: i64) -> GrantDecision {
        ledger
            .check_and_grant(id, "APtest", "alice", now, AMOUNT, COOLDOWN)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_claim_is_always_granted() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir);

        match grant(&ledger, 42, T0).await {
            GrantDecision::Granted { record } => {
                assert_eq!(record.total_granted, 1000);
                assert_eq!(record.next_eligible_at, T0 + COOLDOWN);
                assert_eq!(record.grants, 1);
            }
            other => panic!("expected grant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn claim_inside_cooldown_leaves_record_untouched() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir);

        grant(&ledger, 42, T0).await;
        let before = ledger.get(42).unwrap().unwrap();

        match grant(&ledger, 42, T0 + 1000).await {
            GrantDecision::NotYetEligible { next_eligible_at } => {
                assert_eq!(next_eligible_at, T0 + COOLDOWN);
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        assert_eq!(ledger.get(42).unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn eligibility_formula_does_not_drift() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir);

        grant(&ledger, 42, T0).await;

        // One millisecond early is still rejected.
        match grant(&ledger, 42, T0 + COOLDOWN - 1).await {
            GrantDecision::NotYetEligible { next_eligible_at } => {
                assert_eq!(next_eligible_at, T0 + COOLDOWN)
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        // Exactly at the boundary is eligible, and the new window is anchored
        // to the claim instant, not to the previous window.
        let late = T0 + COOLDOWN + 5000;
        match grant(&ledger, 42, late).await {
            GrantDecision::Granted { record } => {
                assert_eq!(record.next_eligible_at, late + COOLDOWN);
                assert_eq!(record.total_granted, 2000);
                assert_eq!(record.grants, 2);
            }
            other => panic!("expected grant, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn grant_refreshes_address_and_display_name() {
        let dir = TempDir::new().unwrap();
        let ledger = open_ledger(&dir);

        ledger
            .check_and_grant(7, "APfirst", "alice", T0, AMOUNT, COOLDOWN)
            .await
            .unwrap();
        ledger
            .check_and_grant(7, "APsecond", "alice-renamed", T0 + COOLDOWN, AMOUNT, COOLDOWN)
            .await
            .unwrap();

        let record = ledger.get(7).unwrap().unwrap();
        assert_eq!(record.address, "APsecond");
        assert_eq!(record.display_name, "alice-renamed");
        assert_eq!(record.total_granted, 2000);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_same_claimant_claims_grant_exactly_once() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(open_ledger(&dir));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .check_and_grant(42, "APtest", "alice", T0, AMOUNT, COOLDOWN)
                    .await
                    .unwrap()
            }));
        }

        let mut granted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                GrantDecision::Granted { .. } => granted += 1,
                GrantDecision::NotYetEligible { .. } => rejected += 1,
            }
        }

        assert_eq!(granted, 1);
        assert_eq!(rejected, 15);
        assert_eq!(ledger.get(42).unwrap().unwrap().total_granted, 1000);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let ledger = open_ledger(&dir);
            grant(&ledger, 42, T0).await;
            grant(&ledger, 43, T0).await;
        }

        let ledger = open_ledger(&dir);
        let record = ledger.get(42).unwrap().unwrap();
        assert_eq!(record.next_eligible_at, T0 + COOLDOWN);

        let stats = ledger.stats().unwrap();
        assert_eq!(stats.claimants, 2);
        assert_eq!(stats.grants, 2);
        assert_eq!(stats.total_granted, 2000);
    }
}
