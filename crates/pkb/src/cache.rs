//! Decoded model caching.
//!
//! Decoding is deterministic, so a model can be reused for any asset with the
//! same container, offset and size.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use pkb_decode::DecodedModel;

/// Identifies an asset's bytes within the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    /// Lowercased container name.
    pub container: String,
    pub offset: u32,
    pub size: u32,
}

impl ContentKey {
    #[must_use]
    pub fn new(container: &str, offset: u32, size: u32) -> Self {
        Self {
            container: container.to_ascii_lowercase(),
            offset,
            size,
        }
    }
}

/// Storage for decoded models.
pub trait ModelCache: Send + Sync {
    fn get(&self, key: &ContentKey) -> Option<Arc<DecodedModel>>;
    fn insert(&self, key: ContentKey, model: Arc<DecodedModel>);

    /// Drop every model decoded from `container`, compared case-insensitively.
    fn invalidate_container(&self, container: &str);
}

/// Caches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ModelCache for NoCache {
    fn get(&self, _key: &ContentKey) -> Option<Arc<DecodedModel>> {
        None
    }

    fn insert(&self, _key: ContentKey, _model: Arc<DecodedModel>) {}

    fn invalidate_container(&self, _container: &str) {}
}

/// Unbounded in-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    models: RwLock<HashMap<ContentKey, Arc<DecodedModel>>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.read().map_or(0, |models| models.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut models) = self.models.write() {
            models.clear();
        }
    }
}

impl ModelCache for MemoryCache {
    fn get(&self, key: &ContentKey) -> Option<Arc<DecodedModel>> {
        self.models.read().ok()?.get(key).cloned()
    }

    fn insert(&self, key: ContentKey, model: Arc<DecodedModel>) {
        if let Ok(mut models) = self.models.write() {
            models.insert(key, model);
        }
    }

    fn invalidate_container(&self, container: &str) {
        if let Ok(mut models) = self.models.write() {
            models.retain(|key, _| !key.container.eq_ignore_ascii_case(container));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ignore_container_case() {
        assert_eq!(ContentKey::new("A.PKB", 1, 2), ContentKey::new("a.pkb", 1, 2));
        assert_ne!(ContentKey::new("a.pkb", 1, 2), ContentKey::new("a.pkb", 1, 3));
    }

    #[test]
    fn memory_cache_stores_models() {
        let cache = MemoryCache::new();
        let key = ContentKey::new("a.pkb", 8, 12);
        assert!(cache.get(&key).is_none());

        let model = Arc::new(DecodedModel::unrecognized(&[]));
        cache.insert(key.clone(), Arc::clone(&model));
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &model));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_is_per_container() {
        let cache = MemoryCache::new();
        let model = Arc::new(DecodedModel::unrecognized(&[]));
        cache.insert(ContentKey::new("a.pkb", 8, 12), Arc::clone(&model));
        cache.insert(ContentKey::new("a.pkb", 20, 4), Arc::clone(&model));
        cache.insert(ContentKey::new("b.pkb", 8, 12), model);

        cache.invalidate_container("A.PKB");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&ContentKey::new("b.pkb", 8, 12)).is_some());
    }

    #[test]
    fn no_cache_forgets() {
        let key = ContentKey::new("a.pkb", 8, 12);
        NoCache.insert(key.clone(), Arc::new(DecodedModel::unrecognized(&[])));
        assert!(NoCache.get(&key).is_none());
    }
}
