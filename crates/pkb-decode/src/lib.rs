//! Decode PKB archive layouts and PROP static meshes.
//!
//! This crate provides pure synchronous decoding functions over in-memory
//! byte buffers. Nothing here performs I/O or holds shared state, so calls
//! on independent buffers can run in parallel freely.
//!
//! # Design principles
//!
//! - **Total**: malformed data yields empty or partial results, never a panic
//! - **Record-level filtering**: a bad record is dropped, the walk continues
//! - **Deterministic**: identical bytes always decode to identical output
//!
//! # Key functions
//!
//! - [`IndexTable::parse`]: Parse a packmap manifest
//! - [`ContainerDirectory::parse`]: Parse a container's embedded directory
//! - [`scan_names`]: Heuristic filename discovery
//! - [`decode_mesh`]: Decode a PROP mesh into renderable buffers

mod error;
mod reader;

pub mod container;
pub mod coords;
pub mod geometry;
pub mod manifest;
pub mod mesh;
pub mod probe;
pub mod prop;
pub mod scan;

pub use container::{
    CONTAINER_SIGNATURE, ContainerBuilder, ContainerDirectory, ContainerDirectoryEntry,
};
pub use coords::{
    CoordinateSystem, UNIT_SCALE, normalize_normal, normalize_vertex, reverse_winding,
};
pub use error::{DecodeError, DecodeResult, RecordKind};
pub use geometry::{is_valid_face, is_valid_vertex};
pub use manifest::{IndexEntry, IndexTable, MANIFEST_SIGNATURE, encode_manifest};
pub use mesh::{
    DecodeLimits, DecodeStrategy, DecodedGeometry, DecodedModel, GeometrySource, Material,
    MeshDecoder, ModelFormat, ModelMetadata, RejectCounts, decode_mesh,
};
pub use probe::ProbeStrategy;
pub use prop::{PROP_LAYOUT, PropLayout, PropMesh, SignatureStrategy};
pub use reader::{read_f32_le, read_u32_le};
pub use scan::{NameHit, ScanOptions, scan_names};

/// Asset type, judged by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.prop` static mesh.
    Prop,
    /// `.moa` animated model.
    Animated,
    /// `.txa` texture.
    Texture,
    Other,
}

impl AssetKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "prop" => Self::Prop,
            "moa" => Self::Animated,
            "txa" => Self::Texture,
            _ => Self::Other,
        }
    }

    /// Whether [`decode_mesh`] understands this kind.
    #[must_use]
    pub fn is_mesh(self) -> bool {
        self == Self::Prop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_kind_from_extension() {
        assert_eq!(AssetKind::from_name("building1.prop"), AssetKind::Prop);
        assert_eq!(AssetKind::from_name("NEO.MOA"), AssetKind::Animated);
        assert_eq!(AssetKind::from_name("sky.txa"), AssetKind::Texture);
        assert_eq!(AssetKind::from_name("readme"), AssetKind::Other);
        assert_eq!(AssetKind::from_name("a.prop.bak"), AssetKind::Other);
        assert!(AssetKind::from_name("x.PROP").is_mesh());
    }
}
