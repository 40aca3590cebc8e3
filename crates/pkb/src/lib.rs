//! Extract assets from PKB archives and decode their meshes.
//!
//! Builds on [`pkb_decode`] with strategy-driven asset location, a session
//! context holding loaded buffers, and decoded model caching.
//!
//! # Example
//!
//! ```
//! use pkb::{ArchiveContext, ContainerBuilder, IndexEntry, Method, encode_manifest};
//!
//! let container = ContainerBuilder::new().file("crate.prop", vec![0u8; 16]).build();
//! let manifest = encode_manifest(&[IndexEntry {
//!     filename: "crate.prop".to_owned(),
//!     container_name: "worlds.pkb".to_owned(),
//!     offset: 48,
//!     size: 16,
//! }]);
//!
//! let mut ctx = ArchiveContext::new();
//! ctx.load_manifest(&manifest);
//! ctx.load_container("worlds.pkb", container);
//!
//! let assets = ctx.extract("worlds.pkb").unwrap();
//! assert_eq!(assets[0].method, Method::Index);
//! let model = ctx.decode(&assets[0]);
//! assert!(model.is_empty());
//! ```

mod asset;
mod cache;
mod context;
mod engine;
mod error;
mod strategy;

pub use asset::{ExtractedAsset, Method};
pub use cache::{ContentKey, MemoryCache, ModelCache, NoCache};
pub use context::ArchiveContext;
pub use engine::ExtractionEngine;
pub use error::{Error, Result};
pub use strategy::{
    DirectContainerStrategy, HeuristicStrategy, IndexStrategy, LocateRequest, LocateStrategy,
};

pub use pkb_decode::{
    AssetKind, ContainerBuilder, ContainerDirectory, ContainerDirectoryEntry, DecodeError,
    DecodeLimits, DecodedModel, IndexEntry, IndexTable, Material, MeshDecoder, ModelFormat,
    ModelMetadata, PropMesh, ScanOptions, decode_mesh, encode_manifest,
};
