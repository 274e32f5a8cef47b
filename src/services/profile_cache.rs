use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::entities::users;

/// Server-side mirror of profile rows keyed by wallet address. Every
/// mutating handler either refreshes or drops the entry, so a reconnecting
/// client always reads current state instead of ambient leftovers.
#[derive(Clone)]
pub struct ProfileCache {
    inner: Arc<Cache<String, users::Model>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300))
            .build();
        Self {
            inner: Arc::new(cache),
        }
    }

    pub async fn get(&self, wallet_address: &str) -> Option<users::Model> {
        self.inner.get(wallet_address).await
    }

    pub async fn store(&self, profile: users::Model) {
        self.inner
            .insert(profile.wallet_address.clone(), profile)
            .await;
    }

    pub async fn invalidate(&self, wallet_address: &str) {
        self.inner.invalidate(wallet_address).await;
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new()
    }
}
