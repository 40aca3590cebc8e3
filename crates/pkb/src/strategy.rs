//! Asset location strategies.
//!
//! Each strategy either yields a complete set of assets for a container or
//! declines. The engine never merges results from two strategies.

use pkb_decode::{ContainerDirectory, IndexTable, ScanOptions, scan_names};

use crate::asset::{ExtractedAsset, Method};

/// Inputs available for locating the assets of one container.
#[derive(Debug, Clone, Copy)]
pub struct LocateRequest<'a> {
    pub container_name: &'a str,
    pub manifest: Option<&'a IndexTable>,
    pub container: &'a [u8],
}

/// One way of locating assets.
pub trait LocateStrategy: Send + Sync {
    fn method(&self) -> Method;

    /// Locate assets, or `None` when this strategy finds nothing.
    fn attempt(&self, request: &LocateRequest<'_>) -> Option<Vec<ExtractedAsset>>;
}

fn non_empty(assets: Vec<ExtractedAsset>) -> Option<Vec<ExtractedAsset>> {
    (!assets.is_empty()).then_some(assets)
}

/// Manifest rows that name the requested container.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexStrategy;

impl LocateStrategy for IndexStrategy {
    fn method(&self) -> Method {
        Method::Index
    }

    fn attempt(&self, request: &LocateRequest<'_>) -> Option<Vec<ExtractedAsset>> {
        let manifest = request.manifest?;
        let assets = manifest
            .entries_for(request.container_name)
            .filter_map(|entry| match entry.slice(request.container) {
                Ok(bytes) => Some(ExtractedAsset {
                    name: entry.filename.clone(),
                    size: entry.size,
                    offset: entry.offset,
                    bytes: bytes.to_vec(),
                    container_name: request.container_name.to_owned(),
                    method: Method::Index,
                }),
                Err(e) => {
                    tracing::warn!("Skipping manifest entry: {e}");
                    None
                }
            })
            .collect();
        non_empty(assets)
    }
}

/// The container's embedded directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectContainerStrategy;

impl LocateStrategy for DirectContainerStrategy {
    fn method(&self) -> Method {
        Method::DirectContainer
    }

    fn attempt(&self, request: &LocateRequest<'_>) -> Option<Vec<ExtractedAsset>> {
        let directory = ContainerDirectory::parse(request.container)
            .inspect_err(|e| tracing::debug!("No container directory: {e}"))
            .ok()?;
        let assets = directory
            .payloads(request.container)
            .map(|(entry, bytes)| ExtractedAsset {
                name: entry.filename.clone(),
                size: entry.size,
                offset: entry.offset,
                bytes: bytes.to_vec(),
                container_name: request.container_name.to_owned(),
                method: Method::DirectContainer,
            })
            .collect();
        non_empty(assets)
    }
}

/// Filename scan with placeholder payloads.
///
/// Scans the manifest bytes when a manifest is present but unrecognized,
/// then the container bytes.
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategy {
    options: ScanOptions,
}

impl HeuristicStrategy {
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }
}

impl LocateStrategy for HeuristicStrategy {
    fn method(&self) -> Method {
        Method::Heuristic
    }

    fn attempt(&self, request: &LocateRequest<'_>) -> Option<Vec<ExtractedAsset>> {
        let unrecognized_manifest = request
            .manifest
            .filter(|m| !m.is_recognized())
            .map(IndexTable::raw);

        unrecognized_manifest
            .into_iter()
            .chain(std::iter::once(request.container))
            .find_map(|buffer| {
                let assets = scan_names(buffer, &self.options)
                    .into_iter()
                    .map(|hit| {
                        let bytes = self.options.placeholder();
                        ExtractedAsset {
                            name: hit.name,
                            size: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
                            offset: 0,
                            bytes,
                            container_name: request.container_name.to_owned(),
                            method: Method::Heuristic,
                        }
                    })
                    .collect();
                non_empty(assets)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkb_decode::{ContainerBuilder, IndexEntry, encode_manifest};

    #[test]
    fn index_strategy_declines_without_rows() {
        let manifest = IndexTable::parse(&encode_manifest(&[IndexEntry {
            filename: "a.prop".to_owned(),
            container_name: "other.pkb".to_owned(),
            offset: 0,
            size: 4,
        }]));
        let request = LocateRequest {
            container_name: "x.pkb",
            manifest: Some(&manifest),
            container: &[0; 16],
        };
        assert!(IndexStrategy.attempt(&request).is_none());
        assert!(
            IndexStrategy
                .attempt(&LocateRequest {
                    manifest: None,
                    ..request
                })
                .is_none()
        );
    }

    #[test]
    fn direct_strategy_reads_directory() {
        let container = ContainerBuilder::new().file("a.prop", vec![7u8; 3]).build();
        let request = LocateRequest {
            container_name: "x.pkb",
            manifest: None,
            container: &container,
        };
        let assets = DirectContainerStrategy.attempt(&request).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].bytes, [7, 7, 7]);
        assert_eq!(assets[0].method, Method::DirectContainer);
    }

    #[test]
    fn heuristic_prefers_unrecognized_manifest() {
        let manifest = IndexTable::parse(b"\x01\x02crate.prop\x00\xff");
        let container = b"\x00tree.txa\x00".to_vec();
        let request = LocateRequest {
            container_name: "x.pkb",
            manifest: Some(&manifest),
            container: &container,
        };
        let assets = HeuristicStrategy::default().attempt(&request).unwrap();
        let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["crate.prop"]);

        let assets = HeuristicStrategy::default()
            .attempt(&LocateRequest {
                manifest: None,
                ..request
            })
            .unwrap();
        assert_eq!(assets[0].name, "tree.txa");
        assert!(assets[0].is_placeholder());
    }

    #[test]
    fn heuristic_skips_recognized_manifest() {
        let manifest = IndexTable::parse(&encode_manifest(&[IndexEntry {
            filename: "listed.prop".to_owned(),
            container_name: "other.pkb".to_owned(),
            offset: 0,
            size: 4,
        }]));
        let request = LocateRequest {
            container_name: "x.pkb",
            manifest: Some(&manifest),
            container: &[0; 32],
        };
        assert!(HeuristicStrategy::default().attempt(&request).is_none());
    }
}
