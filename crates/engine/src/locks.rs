//! Per-account write serialization.
//!
//! Registering a movement reads the account balance and then writes a row
//! whose snapshot depends on it. Holding the account's lock across both steps
//! keeps concurrent writers in this process from sharing a prior balance.
//! A slot lives only while someone holds or waits for it.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

#[derive(Debug, Default)]
pub(crate) struct AccountLocks {
    slots: Mutex<HashMap<i64, Slot>>,
}

/// Exclusive access to one account, released on drop.
#[must_use]
#[derive(Debug)]
pub(crate) struct AccountGuard<'a> {
    locks: &'a AccountLocks,
    account_id: i64,
    held: Option<OwnedMutexGuard<()>>,
}

impl AccountLocks {
    fn slots(&self) -> MutexGuard<'_, HashMap<i64, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for exclusive access to `account_id`.
    pub(crate) async fn lock(&self, account_id: i64) -> AccountGuard<'_> {
        let slot = Arc::clone(self.slots().entry(account_id).or_default());
        AccountGuard {
            locks: self,
            account_id,
            held: Some(slot.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots().len()
    }
}

impl Drop for AccountGuard<'_> {
    fn drop(&mut self) {
        drop(self.held.take());
        // The map is locked while counting, so no new waiter can clone the
        // slot between the check and the removal.
        let mut slots = self.locks.slots();
        if slots
            .get(&self.account_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.account_id);
        }
    }
}
