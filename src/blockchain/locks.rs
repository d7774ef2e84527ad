// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-account submission locks.
//!
//! The sequence number of a transaction is read from the node right before
//! signing. Two concurrent submissions from the same account would read the
//! same value and one would be rejected, so the whole
//! fetch-sequence → submit → confirm window runs under the sender's lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::types::AccountAddress;

/// Async mutex per account address.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountAddress, Arc<AsyncMutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `address`. The lock is released when the
    /// returned guard is dropped.
    pub async fn lock(&self, address: AccountAddress) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(address).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of accounts currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_account_is_serialized() {
        let locks = Arc::new(AccountLocks::new());
        let addr = AccountAddress::new([1; 32]);

        let guard = locks.lock(addr).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(addr).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter acquires the lock after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _a = locks.lock(AccountAddress::new([1; 32])).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock(AccountAddress::new([2; 32])),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = AccountLocks::new();
        drop(locks.lock(AccountAddress::new([1; 32])).await);
        drop(locks.lock(AccountAddress::new([2; 32])).await);
        // The second call pruned the first account's idle entry.
        assert_eq!(locks.tracked(), 1);
    }
}
