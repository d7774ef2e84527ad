// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pool of chain clients keyed by RPC endpoint.
//!
//! Handles are connected on first use and reused afterwards, so requests do
//! not pay for a fresh HTTP client (and chain id lookup) on every call.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

use super::client::{ChainClient, ChainError, RpcClient, RpcSettings};

/// Builds a client for an RPC URL.
pub type Connector =
    Arc<dyn Fn(&str) -> Result<Arc<dyn ChainClient>, ChainError> + Send + Sync>;

/// LRU pool of chain clients.
pub struct ClientPool {
    clients: Mutex<LruCache<String, Arc<dyn ChainClient>>>,
    connector: Connector,
}

impl ClientPool {
    /// Create a pool holding at most `capacity` endpoints.
    pub fn new(capacity: usize, connector: Connector) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            clients: Mutex::new(LruCache::new(capacity)),
            connector,
        }
    }

    /// Pool that connects [`RpcClient`]s with the given transport settings.
    pub fn http(capacity: usize, settings: RpcSettings) -> Self {
        let connector: Connector = Arc::new(move |url: &str| {
            let client = RpcClient::new(url, &settings)?;
            Ok(Arc::new(client) as Arc<dyn ChainClient>)
        });
        Self::new(capacity, connector)
    }

    /// Get the client for `rpc_url`, connecting one if none is pooled.
    pub fn acquire(&self, rpc_url: &str) -> Result<Arc<dyn ChainClient>, ChainError> {
        let key = normalize(rpc_url);
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = (self.connector)(&key)?;
        tracing::debug!(rpc_url = %key, "Connected chain client");
        clients.put(key, Arc::clone(&client));
        Ok(client)
    }

    /// Drop the pooled client for `rpc_url`, if any.
    pub fn evict(&self, rpc_url: &str) -> bool {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(&normalize(rpc_url))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(rpc_url: &str) -> String {
    rpc_url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::FakeChain;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_pool(capacity: usize) -> (ClientPool, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connects);
        let connector: Connector = Arc::new(move |_url: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(FakeChain::new() as Arc<dyn ChainClient>)
        });
        (ClientPool::new(capacity, connector), connects)
    }

    #[test]
    fn same_endpoint_reuses_client() {
        let (pool, connects) = counting_pool(4);
        let a = pool.acquire("https://rpc.example").unwrap();
        let b = pool.acquire("https://rpc.example/").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn distinct_endpoints_get_distinct_clients() {
        let (pool, connects) = counting_pool(4);
        let a = pool.acquire("https://one.example").unwrap();
        let b = pool.acquire("https://two.example").unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn least_recently_used_endpoint_is_evicted() {
        let (pool, connects) = counting_pool(1);
        pool.acquire("https://one.example").unwrap();
        pool.acquire("https://two.example").unwrap();
        pool.acquire("https://one.example").unwrap();

        assert_eq!(connects.load(Ordering::SeqCst), 3);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn evict_forces_reconnect() {
        let (pool, connects) = counting_pool(4);
        pool.acquire("https://one.example").unwrap();
        assert!(pool.evict("https://one.example"));
        assert!(pool.is_empty());
        pool.acquire("https://one.example").unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn http_pool_rejects_invalid_urls() {
        let pool = ClientPool::http(2, RpcSettings::default());
        assert!(matches!(
            pool.acquire("::nope::"),
            Err(ChainError::InvalidRpcUrl(_))
        ));
        assert!(pool.is_empty());
    }
}
