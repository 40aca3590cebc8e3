//! Static-prop mesh decoding.
//!
//! [`MeshDecoder`] runs an ordered list of [`DecodeStrategy`]s and keeps the
//! first one that yields vertices:
//!
//! 1. [`SignatureStrategy`]: a known signature fixes the header layout.
//! 2. [`ProbeStrategy`]: brute-force search for a plausible count pair.
//!
//! When neither yields vertices the result is an empty model whose metadata
//! records the unrecognized signature. No geometry is ever synthesized.
//!
//! Every record goes through validation on the way in. Rejected vertices are
//! removed and faces are re-indexed, so every output index addresses an
//! output vertex.

use std::ops::RangeInclusive;

use glam::Vec3;

use crate::coords::{
    CoordinateSystem, UNIT_SCALE, flip_uv, normalize_normal, normalize_vertex, reverse_winding,
};
use crate::error::{DecodeError, RecordKind};
use crate::geometry::{VERTEX_LIMIT, is_valid_face, is_valid_uv, is_valid_vertex};
use crate::probe::ProbeStrategy;
use crate::prop::SignatureStrategy;
use crate::reader::{read_f32_le, read_f32x3, read_signature, read_u32x3};

/// Size of a vertex record (3 × f32).
pub const VERTEX_RECORD_SIZE: usize = 12;
/// Size of a face record (3 × u32).
pub const FACE_RECORD_SIZE: usize = 12;
/// Size of a UV record (2 × f32).
pub const UV_RECORD_SIZE: usize = 8;
/// Size of a normal record (3 × f32).
pub const NORMAL_RECORD_SIZE: usize = 12;

/// Limits applied while decoding.
#[derive(Debug, Clone)]
pub struct DecodeLimits {
    /// Header counts must lie in `1..max_declared_count`.
    pub max_declared_count: u32,
    /// Source coordinate ceiling (exclusive), centimeters.
    pub vertex_limit: f32,
    /// Number of leading bytes searched for a count pair.
    pub probe_window: usize,
    /// Step between probed offsets.
    pub probe_stride: usize,
    /// Accepted probed vertex counts.
    pub probe_vertices: RangeInclusive<u32>,
    /// Accepted probed face counts.
    pub probe_faces: RangeInclusive<u32>,
    /// Vertices checked before a probed offset is accepted.
    pub probe_sample: usize,
    /// Coordinate ceiling (inclusive) for sampled vertices.
    pub probe_limit: f32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_declared_count: 100_000,
            vertex_limit: VERTEX_LIMIT,
            probe_window: 512,
            probe_stride: 4,
            probe_vertices: 3..=50_000,
            probe_faces: 1..=50_000,
            probe_sample: 10,
            probe_limit: 50_000.0,
        }
    }
}

/// Surface material handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// RGB, `0xRRGGBB`.
    pub color: u32,
    pub metalness: f32,
    pub roughness: f32,
    /// RGB, `0xRRGGBB`.
    pub emissive: u32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            color: 0x0080_8080,
            metalness: 0.3,
            roughness: 0.7,
            emissive: 0x0010_1010,
            double_sided: true,
        }
    }
}

/// Container format a model was decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Prop,
    Unrecognized,
}

impl ModelFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prop => "PROP",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Which strategy located the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Header layout chosen by signature.
    Signature,
    /// Count pair found by probing at this byte offset.
    Probe { offset: usize },
    /// Nothing found.
    None,
}

/// Records dropped by validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectCounts {
    pub vertices: usize,
    pub faces: usize,
    pub uvs: usize,
    pub normals: usize,
}

impl RejectCounts {
    fn record(&mut self, err: &DecodeError) {
        tracing::trace!("Dropped record: {err}");
        if let DecodeError::InvalidGeometry { record, .. } = err {
            match record {
                RecordKind::Vertex => self.vertices += 1,
                RecordKind::Face => self.faces += 1,
                RecordKind::Uv => self.uvs += 1,
                RecordKind::Normal => self.normals += 1,
            }
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.vertices + self.faces + self.uvs + self.normals
    }
}

/// Fixed description of a decode result.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub format: ModelFormat,
    pub source: GeometrySource,
    /// First four bytes of the input, zero padded.
    pub signature: [u8; 4],
    pub vertex_count: usize,
    /// Always `indices.len() / 3`.
    pub face_count: usize,
    pub has_uvs: bool,
    pub has_normals: bool,
    /// Length of the decoded input.
    pub file_size: usize,
    /// Offset of the first vertex record, if geometry was found.
    pub data_offset: Option<usize>,
    /// Scale applied to source positions.
    pub unit_scale: f32,
    pub coordinate_system: CoordinateSystem,
    pub winding_reversed: bool,
    /// Whether there is geometry worth exporting.
    pub exportable: bool,
    pub rejected: RejectCounts,
}

impl ModelMetadata {
    /// Signature as printable text.
    #[must_use]
    pub fn signature_text(&self) -> String {
        crate::error::signature_display(&self.signature)
    }
}

/// Renderable geometry produced by [`MeshDecoder::decode`].
///
/// Flat buffers: `vertices` and `normals` hold xyz triples, `uvs` uv pairs,
/// `indices` triangle corners.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedModel {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub uvs: Vec<f32>,
    pub normals: Vec<f32>,
    pub materials: Vec<Material>,
    pub metadata: ModelMetadata,
}

impl DecodedModel {
    /// Empty model for input no strategy could read.
    #[must_use]
    pub fn unrecognized(bytes: &[u8]) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            materials: Vec::new(),
            metadata: ModelMetadata {
                format: ModelFormat::Unrecognized,
                source: GeometrySource::None,
                signature: padded_signature(bytes),
                vertex_count: 0,
                face_count: 0,
                has_uvs: false,
                has_normals: false,
                file_size: bytes.len(),
                data_offset: None,
                unit_scale: 1.0,
                coordinate_system: CoordinateSystem::SourceZUp,
                winding_reversed: false,
                exportable: false,
                rejected: RejectCounts::default(),
            },
        }
    }

    fn from_geometry(geometry: DecodedGeometry, bytes: &[u8]) -> Self {
        let metadata = ModelMetadata {
            format: ModelFormat::Prop,
            source: geometry.source,
            signature: padded_signature(bytes),
            vertex_count: geometry.vertices.len() / 3,
            face_count: geometry.indices.len() / 3,
            has_uvs: !geometry.uvs.is_empty(),
            has_normals: !geometry.normals.is_empty(),
            file_size: bytes.len(),
            data_offset: Some(geometry.data_offset),
            unit_scale: UNIT_SCALE,
            coordinate_system: CoordinateSystem::YUpMeters,
            winding_reversed: true,
            exportable: !geometry.vertices.is_empty(),
            rejected: geometry.rejected,
        };
        Self {
            vertices: geometry.vertices,
            indices: geometry.indices,
            uvs: geometry.uvs,
            normals: geometry.normals,
            materials: vec![Material::default()],
            metadata,
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty model.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self.positions();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

fn padded_signature(bytes: &[u8]) -> [u8; 4] {
    read_signature(bytes).unwrap_or_else(|| {
        let mut signature = [0u8; 4];
        signature[..bytes.len()].copy_from_slice(bytes);
        signature
    })
}

/// Geometry recovered by one strategy, already normalized.
#[derive(Debug, Clone)]
pub struct DecodedGeometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub uvs: Vec<f32>,
    pub normals: Vec<f32>,
    pub rejected: RejectCounts,
    pub source: GeometrySource,
    pub data_offset: usize,
}

impl DecodedGeometry {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// One way of locating mesh records in a buffer.
pub trait DecodeStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Decode `bytes`, or `None` if this strategy does not apply.
    fn attempt(&self, bytes: &[u8], limits: &DecodeLimits) -> Option<DecodedGeometry>;
}

/// Runs decode strategies in priority order.
pub struct MeshDecoder {
    limits: DecodeLimits,
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl Default for MeshDecoder {
    fn default() -> Self {
        Self::with_limits(DecodeLimits::default())
    }
}

impl std::fmt::Debug for MeshDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshDecoder")
            .field("limits", &self.limits)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MeshDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder with the standard strategies and custom limits.
    #[must_use]
    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self {
            limits,
            strategies: vec![Box::new(SignatureStrategy), Box::new(ProbeStrategy)],
        }
    }

    /// Decoder with an explicit strategy list.
    #[must_use]
    pub fn with_strategies(limits: DecodeLimits, strategies: Vec<Box<dyn DecodeStrategy>>) -> Self {
        Self { limits, strategies }
    }

    #[must_use]
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decode a mesh asset. Never fails; unreadable input gives an empty model.
    #[must_use]
    pub fn decode(&self, bytes: &[u8]) -> DecodedModel {
        for strategy in &self.strategies {
            match strategy.attempt(bytes, &self.limits) {
                Some(geometry) if geometry.vertex_count() > 0 => {
                    tracing::debug!(
                        "{} strategy decoded {} vertices, {} faces",
                        strategy.name(),
                        geometry.vertex_count(),
                        geometry.indices.len() / 3
                    );
                    return DecodedModel::from_geometry(geometry, bytes);
                }
                Some(_) => tracing::debug!("{} strategy found no usable vertices", strategy.name()),
                None => tracing::trace!("{} strategy did not apply", strategy.name()),
            }
        }

        let model = DecodedModel::unrecognized(bytes);
        tracing::debug!(
            "No strategy matched {} bytes (signature {})",
            bytes.len(),
            model.metadata.signature_text()
        );
        model
    }
}

/// Decode with the default decoder.
#[must_use]
pub fn decode_mesh(bytes: &[u8]) -> DecodedModel {
    MeshDecoder::default().decode(bytes)
}

/// Accumulates validated, normalized records.
///
/// `remap[i]` is the output index of source vertex `i`, if it was kept.
#[derive(Debug, Default)]
pub(crate) struct MeshBuilder {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    uvs: Vec<f32>,
    normals: Vec<f32>,
    remap: Vec<Option<u32>>,
    rejected: RejectCounts,
}

impl MeshBuilder {
    fn kept(&self, source: usize) -> bool {
        matches!(self.remap.get(source), Some(Some(_)))
    }

    fn push_vertex(&mut self, source: usize, raw: Vec3, limit: f32) {
        if !is_valid_vertex(raw, limit) {
            self.remap.push(None);
            self.rejected.record(&DecodeError::InvalidGeometry {
                record: RecordKind::Vertex,
                index: source,
            });
            return;
        }
        let out = u32::try_from(self.vertices.len() / 3).ok();
        self.remap.push(out);
        if out.is_some() {
            self.vertices.extend_from_slice(&normalize_vertex(raw).to_array());
        }
    }

    fn push_face(&mut self, source: usize, raw: [u32; 3]) {
        let mapped = if is_valid_face(raw, self.remap.len()) {
            let [a, b, c] = raw.map(|i| {
                usize::try_from(i)
                    .ok()
                    .and_then(|i| self.remap.get(i).copied().flatten())
            });
            a.zip(b).zip(c).map(|((a, b), c)| [a, b, c])
        } else {
            None
        };

        match mapped {
            Some(face) => self.indices.extend_from_slice(&reverse_winding(face)),
            None => self.rejected.record(&DecodeError::InvalidGeometry {
                record: RecordKind::Face,
                index: source,
            }),
        }
    }

    fn push_uv(&mut self, source: usize, u: f32, v: f32) {
        if !self.kept(source) {
            return;
        }
        if is_valid_uv(u, v) {
            self.uvs.extend_from_slice(&flip_uv(u, v));
        } else {
            self.rejected.record(&DecodeError::InvalidGeometry {
                record: RecordKind::Uv,
                index: source,
            });
        }
    }

    fn push_normal(&mut self, source: usize, raw: Vec3) {
        if !self.kept(source) {
            return;
        }
        match normalize_normal(raw) {
            Some(n) => self.normals.extend_from_slice(&n.to_array()),
            None => self.rejected.record(&DecodeError::InvalidGeometry {
                record: RecordKind::Normal,
                index: source,
            }),
        }
    }

    fn finish(self, source: GeometrySource, data_offset: usize) -> DecodedGeometry {
        DecodedGeometry {
            vertices: self.vertices,
            indices: self.indices,
            uvs: self.uvs,
            normals: self.normals,
            rejected: self.rejected,
            source,
            data_offset,
        }
    }
}

fn section_fits(bytes: &[u8], offset: usize, len: usize) -> bool {
    offset
        .checked_add(len)
        .is_some_and(|end| end <= bytes.len())
}

/// Walk the record sections that follow a mesh header.
///
/// Vertices, then faces, then optional UVs and optional normals. Vertex and
/// face walks stop at the end of the buffer and keep what was read. UVs and
/// normals are read only when their whole section fits.
pub(crate) fn read_body(
    bytes: &[u8],
    data_offset: usize,
    vertex_count: usize,
    face_count: usize,
    limits: &DecodeLimits,
    source: GeometrySource,
) -> DecodedGeometry {
    let mut mesh = MeshBuilder::default();
    let mut offset = data_offset;

    for i in 0..vertex_count {
        let Some(raw) = read_f32x3(bytes, offset) else {
            tracing::debug!("Vertex data ends after {i} of {vertex_count} records");
            break;
        };
        mesh.push_vertex(i, Vec3::from_array(raw), limits.vertex_limit);
        offset += VERTEX_RECORD_SIZE;
    }

    for i in 0..face_count {
        let Some(raw) = read_u32x3(bytes, offset) else {
            tracing::debug!("Face data ends after {i} of {face_count} records");
            break;
        };
        mesh.push_face(i, raw);
        offset += FACE_RECORD_SIZE;
    }

    if section_fits(bytes, offset, vertex_count * UV_RECORD_SIZE) {
        for i in 0..vertex_count {
            let (Some(u), Some(v)) = (read_f32_le(bytes, offset), read_f32_le(bytes, offset + 4))
            else {
                break;
            };
            mesh.push_uv(i, u, v);
            offset += UV_RECORD_SIZE;
        }
    }

    if section_fits(bytes, offset, vertex_count * NORMAL_RECORD_SIZE) {
        for i in 0..vertex_count {
            let Some(raw) = read_f32x3(bytes, offset) else {
                break;
            };
            mesh.push_normal(i, Vec3::from_array(raw));
            offset += NORMAL_RECORD_SIZE;
        }
    }

    mesh.finish(source, data_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prop::PropMesh;
    use proptest::prelude::*;

    fn triangle_mesh() -> PropMesh {
        PropMesh {
            vertices: vec![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]],
            faces: vec![[0, 1, 2]],
            uvs: Vec::new(),
            normals: Vec::new(),
        }
    }

    fn assert_invariants(model: &DecodedModel) {
        assert_eq!(model.vertices.len() % 3, 0);
        assert_eq!(model.uvs.len() % 2, 0);
        assert_eq!(model.normals.len() % 3, 0);
        assert_eq!(model.indices.len() % 3, 0);
        assert_eq!(model.metadata.face_count, model.indices.len() / 3);
        assert_eq!(model.metadata.vertex_count, model.vertices.len() / 3);
        let count = model.vertex_count();
        assert!(model.indices.iter().all(|&i| (i as usize) < count));
        assert!(model.vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn count_scan_runs_only_when_signature_yields_no_vertices() {
        let trailing = |bytes: &mut Vec<u8>| {
            bytes.extend_from_slice(&3u32.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
            for v in [[0.0f32, 0.0, 0.0], [100.0, 0.0, 0.0], [0.0, 100.0, 0.0]] {
                v.iter().for_each(|c| bytes.extend_from_slice(&c.to_le_bytes()));
            }
            [0u32, 1, 2]
                .iter()
                .for_each(|i| bytes.extend_from_slice(&i.to_le_bytes()));
        };

        // Every PROP vertex is invalid, so the trailing count pair is used.
        let mut bytes = PropMesh {
            vertices: vec![[f32::NAN; 3]; 3],
            faces: vec![[0, 1, 2]],
            ..PropMesh::default()
        }
        .to_bytes();
        let pair_offset = bytes.len();
        trailing(&mut bytes);

        let model = decode_mesh(&bytes);
        assert_eq!(model.metadata.source, GeometrySource::Probe { offset: pair_offset });
        assert_eq!(model.metadata.data_offset, Some(pair_offset + 8));
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.indices, [0, 2, 1]);
        assert_invariants(&model);

        // A readable PROP body wins even with the same trailing pair present.
        let mut bytes = triangle_mesh().to_bytes();
        trailing(&mut bytes);

        let model = decode_mesh(&bytes);
        assert_eq!(model.metadata.source, GeometrySource::Signature);
        assert_eq!(model.metadata.data_offset, Some(0x88));
        assert_eq!(model.vertex_count(), 3);
        assert_invariants(&model);
    }

    #[test]
    fn nan_vertex_is_dropped_and_faces_reindexed() {
        let mesh = PropMesh {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [f32::NAN, 0.0, 0.0],
                [100.0, 0.0, 0.0],
                [0.0, 100.0, 0.0],
            ],
            faces: vec![[0, 2, 3], [0, 1, 2]],
            uvs: Vec::new(),
            normals: Vec::new(),
        };
        let model = decode_mesh(&mesh.to_bytes());

        assert_eq!(model.vertex_count(), 3);
        assert!(model.vertices.iter().all(|v| !v.is_nan()));
        // Source face (0, 2, 3) becomes (0, 1, 2), then reversed.
        assert_eq!(model.indices, [0, 2, 1]);
        assert_eq!(model.metadata.rejected.vertices, 1);
        assert_eq!(model.metadata.rejected.faces, 1);
        assert_invariants(&model);
    }

    #[test]
    fn out_of_range_vertex_is_dropped() {
        let mut mesh = triangle_mesh();
        mesh.vertices.push([0.0, 0.0, 250_000.0]);
        let model = decode_mesh(&mesh.to_bytes());
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.metadata.rejected.vertices, 1);
    }

    #[test]
    fn uvs_are_flipped_and_normals_remapped() {
        let mut mesh = triangle_mesh();
        mesh.uvs = vec![[0.0, 0.0], [1.0, 0.25], [0.5, 1.0]];
        mesh.normals = vec![[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [0.0, -2.0, 0.0]];
        let model = decode_mesh(&mesh.to_bytes());

        assert_eq!(model.uvs, [0.0, 1.0, 1.0, 0.75, 0.5, 0.0]);
        // (0, 0, 1) maps to +Y. The zero normal and the length-2 normal are
        // outside the accepted magnitude range.
        assert_eq!(model.normals.len(), 3);
        assert!(Vec3::from_slice(&model.normals).abs_diff_eq(Vec3::Y, 1e-6));
        assert_eq!(model.metadata.rejected.normals, 2);
        assert!(model.metadata.has_uvs);
        assert!(model.metadata.has_normals);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let model = decode_mesh(&triangle_mesh().to_bytes());
        let (min, max) = model.bounds().unwrap();
        assert!(min.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
        assert!(max.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert_eq!(DecodedModel::unrecognized(&[]).bounds(), None);
    }

    #[test]
    fn unrecognized_metadata() {
        let model = decode_mesh(b"XY");
        assert!(model.is_empty());
        assert_eq!(model.metadata.format, ModelFormat::Unrecognized);
        assert_eq!(model.metadata.source, GeometrySource::None);
        assert_eq!(model.metadata.signature, *b"XY\0\0");
        assert_eq!(model.metadata.face_count, 0);
        assert!(!model.metadata.exportable);
        assert!(model.materials.is_empty());
    }

    #[test]
    fn custom_strategy_list() {
        let decoder = MeshDecoder::with_strategies(DecodeLimits::default(), Vec::new());
        let model = decoder.decode(&triangle_mesh().to_bytes());
        assert!(model.is_empty());
        assert_eq!(model.metadata.signature, *b"PROP");
    }

    proptest! {
        #[test]
        fn decode_is_total_and_consistent(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let model = decode_mesh(&bytes);
            assert_invariants(&model);
        }

        #[test]
        fn decode_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = decode_mesh(&bytes);
            let second = decode_mesh(&bytes);
            let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
            prop_assert_eq!(bits(&first.vertices), bits(&second.vertices));
            prop_assert_eq!(&first.indices, &second.indices);
            prop_assert_eq!(bits(&first.uvs), bits(&second.uvs));
            prop_assert_eq!(bits(&first.normals), bits(&second.normals));
        }

        #[test]
        fn random_vertices_stay_valid(
            raw in proptest::collection::vec(proptest::array::uniform3(any::<f32>()), 3..40),
            faces in proptest::collection::vec(proptest::array::uniform3(0u32..48), 1..40),
        ) {
            let mesh = PropMesh { vertices: raw, faces, uvs: Vec::new(), normals: Vec::new() };
            let model = decode_mesh(&mesh.to_bytes());
            assert_invariants(&model);
        }
    }
}
