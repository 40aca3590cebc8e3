//! Archive session state.

use std::collections::HashMap;
use std::sync::Arc;

use pkb_decode::{ContainerDirectory, DecodedModel, IndexEntry, IndexTable, MeshDecoder};

use crate::asset::ExtractedAsset;
use crate::cache::{MemoryCache, ModelCache};
use crate::engine::ExtractionEngine;
use crate::error::{Error, Result};

struct LoadedContainer {
    name: String,
    bytes: Vec<u8>,
}

/// Holds the loaded manifest and container buffers for one archive session.
///
/// Container names are matched case-insensitively. Decoded models are shared
/// through the cache, keyed by the asset's location in its container.
///
/// # Example
///
/// ```
/// use pkb::{ArchiveContext, ContainerBuilder};
///
/// let mut ctx = ArchiveContext::new();
/// ctx.load_container("worlds.pkb", ContainerBuilder::new().file("a.prop", vec![0u8; 4]).build());
/// let assets = ctx.extract("WORLDS.PKB").unwrap();
/// assert_eq!(assets[0].name, "a.prop");
/// ```
pub struct ArchiveContext<C: ModelCache = MemoryCache> {
    manifest: Option<IndexTable>,
    containers: HashMap<String, LoadedContainer>,
    engine: ExtractionEngine,
    decoder: MeshDecoder,
    cache: C,
}

impl Default for ArchiveContext<MemoryCache> {
    fn default() -> Self {
        Self::with_cache(MemoryCache::new())
    }
}

impl ArchiveContext<MemoryCache> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ModelCache> std::fmt::Debug for ArchiveContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveContext")
            .field("manifest_entries", &self.manifest.as_ref().map(IndexTable::len))
            .field("containers", &self.loaded_containers())
            .field("engine", &self.engine)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl<C: ModelCache> ArchiveContext<C> {
    #[must_use]
    pub fn with_cache(cache: C) -> Self {
        Self {
            manifest: None,
            containers: HashMap::new(),
            engine: ExtractionEngine::default(),
            decoder: MeshDecoder::default(),
            cache,
        }
    }

    #[must_use]
    pub fn with_engine(mut self, engine: ExtractionEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: MeshDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Parse and keep a manifest, replacing any earlier one.
    pub fn load_manifest(&mut self, bytes: &[u8]) -> &IndexTable {
        let table = IndexTable::parse(bytes);
        if table.is_recognized() {
            tracing::info!("Loaded manifest with {} entries", table.len());
        } else {
            tracing::warn!("Manifest signature not recognized, kept for name scanning");
        }
        self.manifest.insert(table)
    }

    /// Keep a container buffer under `name`, replacing one with the same name.
    ///
    /// Models cached for a replaced container are evicted.
    pub fn load_container(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        tracing::debug!("Loaded container {name} ({} bytes)", bytes.len());
        if self
            .containers
            .insert(key.clone(), LoadedContainer { name, bytes })
            .is_some()
        {
            tracing::debug!("Evicting cached models of reloaded container {key}");
            self.cache.invalidate_container(&key);
        }
    }

    #[must_use]
    pub fn manifest(&self) -> Option<&IndexTable> {
        self.manifest.as_ref()
    }

    /// Bytes of a loaded container.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<&[u8]> {
        self.containers
            .get(&name.to_ascii_lowercase())
            .map(|c| c.bytes.as_slice())
    }

    /// Names of loaded containers as given on load, sorted.
    #[must_use]
    pub fn loaded_containers(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.containers.values().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Manifest rows naming `container`, in manifest order.
    #[must_use]
    pub fn list_entries(&self, container: &str) -> Vec<&IndexEntry> {
        self.manifest
            .as_ref()
            .map(|m| m.entries_for(container).collect())
            .unwrap_or_default()
    }

    /// Parse the embedded directory of a loaded container.
    pub fn container_directory(&self, name: &str) -> Result<ContainerDirectory> {
        let bytes = self
            .container(name)
            .ok_or_else(|| Error::MissingContainer(name.to_owned()))?;
        Ok(ContainerDirectory::parse(bytes)?)
    }

    /// Extract every asset of a loaded container.
    pub fn extract(&self, name: &str) -> Result<Vec<ExtractedAsset>> {
        let loaded = self
            .containers
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::MissingContainer(name.to_owned()))?;
        self.engine
            .extract_with_table(&loaded.name, self.manifest.as_ref(), &loaded.bytes)
    }

    /// Decode an asset's bytes, reusing a cached model when one exists.
    ///
    /// Placeholder assets are decoded but never cached.
    pub fn decode(&self, asset: &ExtractedAsset) -> Arc<DecodedModel> {
        let key = asset.content_key();
        if let Some(model) = key.as_ref().and_then(|k| self.cache.get(k)) {
            tracing::trace!("Cache hit for {}", asset.name);
            return model;
        }

        let model = Arc::new(self.decoder.decode(&asset.bytes));
        if let Some(key) = key {
            self.cache.insert(key, Arc::clone(&model));
        }
        model
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }
}
