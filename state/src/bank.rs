//! In-process settlement bank
//!
//! Stands in for the external ledger collaborator: keeps account balances
//! as `account:` records in the state store and executes credits atomically
//! per account.

use crate::locks::KeyedLocks;
use crate::store::{account_key, get_record, set_record, StateStore};
use aerosure_core::{AerosureResult, Address, Amount, SettlementLedger};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Stored account record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountRecord {
    pub balance: u128,
}

/// Settlement ledger backed by the state store
pub struct MemoryBank<S: StateStore> {
    store: Arc<S>,
    locks: KeyedLocks,
}

impl<S: StateStore + 'static> MemoryBank<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }
}

#[async_trait]
impl<S: StateStore + 'static> SettlementLedger for MemoryBank<S> {
    async fn credit(&self, account: &Address, amount: Amount) -> AerosureResult<()> {
        let key = account_key(account);
        let _guard = self.locks.lock(&key).await;

        let mut record: AccountRecord = get_record(self.store.as_ref(), &key)
            .await?
            .unwrap_or_default();
        record.balance = record.balance.saturating_add(amount.0);
        set_record(self.store.as_ref(), &key, &record).await?;

        debug!("Credited {}: {}", account, amount);
        Ok(())
    }

    async fn balance_of(&self, account: &Address) -> AerosureResult<Amount> {
        let key = account_key(account);
        let record: Option<AccountRecord> = get_record(self.store.as_ref(), &key).await?;
        Ok(Amount::new(record.map(|r| r.balance).unwrap_or(0)))
    }
}
