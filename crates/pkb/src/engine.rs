//! Ordered extraction over the locate strategies.

use pkb_decode::{ContainerDirectory, IndexTable, ScanOptions};

use crate::asset::ExtractedAsset;
use crate::error::{Error, Result};
use crate::strategy::{
    DirectContainerStrategy, HeuristicStrategy, IndexStrategy, LocateRequest, LocateStrategy,
};

/// Tries locate strategies in priority order; the first non-empty result wins.
pub struct ExtractionEngine {
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::with_scan_options(ScanOptions::default())
    }
}

impl std::fmt::Debug for ExtractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionEngine")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.method()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ExtractionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard strategy order with custom heuristic scan options.
    #[must_use]
    pub fn with_scan_options(options: ScanOptions) -> Self {
        Self::with_strategies(vec![
            Box::new(IndexStrategy),
            Box::new(DirectContainerStrategy),
            Box::new(HeuristicStrategy::new(options)),
        ])
    }

    /// Engine with an explicit strategy order.
    #[must_use]
    pub fn with_strategies(strategies: Vec<Box<dyn LocateStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extract the assets of `container_name` from raw manifest and container bytes.
    pub fn extract(
        &self,
        container_name: &str,
        manifest: Option<&[u8]>,
        container: &[u8],
    ) -> Result<Vec<ExtractedAsset>> {
        let table = manifest.map(IndexTable::parse);
        self.extract_with_table(container_name, table.as_ref(), container)
    }

    /// Extract the assets of `container_name` using an already parsed manifest.
    ///
    /// Fails with [`Error::MissingManifest`] only when there is no manifest
    /// and the container has no readable directory. Otherwise returns the
    /// assets of the first strategy that finds any, or an empty list.
    pub fn extract_with_table(
        &self,
        container_name: &str,
        manifest: Option<&IndexTable>,
        container: &[u8],
    ) -> Result<Vec<ExtractedAsset>> {
        if manifest.is_none()
            && let Err(e) = ContainerDirectory::parse(container)
        {
            tracing::debug!("Container {container_name} has no directory: {e}");
            return Err(Error::MissingManifest {
                container: container_name.to_owned(),
            });
        }

        let request = LocateRequest {
            container_name,
            manifest,
            container,
        };
        for strategy in &self.strategies {
            if let Some(assets) = strategy.attempt(&request) {
                tracing::info!(
                    "Extracted {} assets from {container_name} via {}",
                    assets.len(),
                    strategy.method()
                );
                return Ok(assets);
            }
            tracing::debug!("{} found nothing in {container_name}", strategy.method());
        }

        tracing::warn!("No strategy located assets in {container_name}: unrecognized format");
        Ok(Vec::new())
    }
}
