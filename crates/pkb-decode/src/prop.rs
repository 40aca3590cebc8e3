//! PROP static mesh layout.
//!
//! # Format
//!
//! ```text
//! 0x00: signature "PROP"
//! 0x04: unknown (zero in every observed file)
//! 0x80: vertex count u32
//! 0x84: face count u32
//! 0x88: vertex_count × (x, y, z f32), centimeters, Z up
//! var:  face_count × (a, b, c u32)
//! var:  vertex_count × (u, v f32), if present
//! var:  vertex_count × (nx, ny, nz f32), if present
//! ```

use crate::error::{DecodeError, DecodeResult};
use crate::mesh::{DecodeLimits, DecodeStrategy, DecodedGeometry, GeometrySource, read_body};
use crate::reader::{read_signature, read_u32_le};

/// Header layout bound to one signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropLayout {
    pub signature: [u8; 4],
    /// Offset of the vertex count; the face count follows it.
    pub counts_offset: usize,
    /// Offset of the first vertex record.
    pub data_offset: usize,
}

/// The only layout observed so far.
pub const PROP_LAYOUT: PropLayout = PropLayout {
    signature: *b"PROP",
    counts_offset: 0x80,
    data_offset: 0x88,
};

const KNOWN_LAYOUTS: &[PropLayout] = &[PROP_LAYOUT];

/// Layout for `signature`. Unknown signatures are never guessed at.
pub fn layout_for(signature: [u8; 4]) -> DecodeResult<&'static PropLayout> {
    KNOWN_LAYOUTS
        .iter()
        .find(|layout| layout.signature == signature)
        .ok_or(DecodeError::UnrecognizedFormat { signature })
}

/// Decodes buffers whose signature selects a known header layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureStrategy;

impl DecodeStrategy for SignatureStrategy {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn attempt(&self, bytes: &[u8], limits: &DecodeLimits) -> Option<DecodedGeometry> {
        let layout = read_signature(bytes)
            .ok_or(DecodeError::Truncated {
                needed: 4,
                available: bytes.len(),
            })
            .and_then(layout_for)
            .inspect_err(|e| tracing::debug!("No signature layout: {e}"))
            .ok()?;

        let (Some(vertex_count), Some(face_count)) = (
            read_u32_le(bytes, layout.counts_offset),
            read_u32_le(bytes, layout.counts_offset + 4),
        ) else {
            tracing::debug!(
                "{}",
                DecodeError::Truncated {
                    needed: layout.data_offset,
                    available: bytes.len(),
                }
            );
            return None;
        };

        let plausible = |n: u32| n > 0 && n < limits.max_declared_count;
        if !plausible(vertex_count) || !plausible(face_count) {
            tracing::debug!("Implausible header counts: {vertex_count} vertices, {face_count} faces");
            return None;
        }

        Some(read_body(
            bytes,
            layout.data_offset,
            usize::try_from(vertex_count).ok()?,
            usize::try_from(face_count).ok()?,
            limits,
            GeometrySource::Signature,
        ))
    }
}

/// Source-space PROP mesh, for writing files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropMesh {
    /// Positions in centimeters, Z up.
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
    /// Empty, or one pair per vertex.
    pub uvs: Vec<[f32; 2]>,
    /// Empty, or one normal per vertex.
    pub normals: Vec<[f32; 3]>,
}

impl PropMesh {
    /// Encode with the [`PROP_LAYOUT`] header.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = PROP_LAYOUT;
        let mut out = Vec::with_capacity(
            layout.data_offset
                + self.vertices.len() * 12
                + self.faces.len() * 12
                + self.uvs.len() * 8
                + self.normals.len() * 12,
        );
        out.extend_from_slice(&layout.signature);
        out.resize(layout.counts_offset, 0);
        out.extend_from_slice(&count(self.vertices.len()).to_le_bytes());
        out.extend_from_slice(&count(self.faces.len()).to_le_bytes());
        debug_assert_eq!(out.len(), layout.data_offset);

        for v in &self.vertices {
            v.iter().for_each(|c| out.extend_from_slice(&c.to_le_bytes()));
        }
        for f in &self.faces {
            f.iter().for_each(|i| out.extend_from_slice(&i.to_le_bytes()));
        }
        for uv in &self.uvs {
            uv.iter().for_each(|c| out.extend_from_slice(&c.to_le_bytes()));
        }
        for n in &self.normals {
            n.iter().for_each(|c| out.extend_from_slice(&c.to_le_bytes()));
        }
        out
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
