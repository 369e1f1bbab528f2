use crate::model::Card;
use std::collections::HashMap;
use std::sync::Arc;

/// A loaded pool. Shared between the cache, the session and snapshots.
pub type CardPool = Arc<Vec<Card>>;

/// Pools keyed by source key for the lifetime of the session.
#[derive(Debug, Default)]
pub struct PoolCache {
    pools: HashMap<String, CardPool>,
}

impl PoolCache {
    pub fn get(&self, key: &str) -> Option<CardPool> {
        self.pools.get(key).cloned()
    }

    /// Store a freshly fetched pool. A key that is already cached keeps its
    /// first pool; the returned pool is whichever one the cache holds.
    pub fn insert(&mut self, key: &str, cards: Vec<Card>) -> CardPool {
        self.pools
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(cards))
            .clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pool_for_a_key_wins() {
        let mut cache = PoolCache::default();
        let first = cache.insert("k", vec![Card::named("A")]);
        let second = cache.insert("k", vec![Card::named("B"), Card::named("C")]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.get("k").unwrap().len(), 1);
    }
}
