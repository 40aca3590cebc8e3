//! Brute-force count probing.
//!
//! Some assets carry mesh records behind a header we cannot identify. This
//! strategy walks the leading bytes looking for a `(vertex_count, face_count)`
//! pair that is plausible, whose records fit in the buffer, and whose first
//! vertices look like coordinates. The first offset that passes wins.

use glam::Vec3;

use crate::mesh::{
    DecodeLimits, DecodeStrategy, DecodedGeometry, FACE_RECORD_SIZE, GeometrySource,
    VERTEX_RECORD_SIZE, read_body,
};
use crate::reader::{read_f32x3, read_u32_le};

/// Size of the probed count pair.
const COUNTS_SIZE: usize = 8;

/// Locates mesh records by probing candidate count pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeStrategy;

impl ProbeStrategy {
    /// First offset holding a plausible count pair, with the counts.
    #[must_use]
    pub fn find_counts(bytes: &[u8], limits: &DecodeLimits) -> Option<(usize, u32, u32)> {
        let window = limits
            .probe_window
            .min(bytes.len().saturating_sub(COUNTS_SIZE));

        (0..window)
            .step_by(limits.probe_stride.max(1))
            .find_map(|offset| {
                let vertex_count = read_u32_le(bytes, offset)?;
                let face_count = read_u32_le(bytes, offset + 4)?;
                (limits.probe_vertices.contains(&vertex_count)
                    && limits.probe_faces.contains(&face_count)
                    && records_fit(bytes, offset, vertex_count, face_count)
                    && sample_is_plausible(bytes, offset + COUNTS_SIZE, vertex_count, limits))
                .then_some((offset, vertex_count, face_count))
            })
    }
}

fn records_fit(bytes: &[u8], offset: usize, vertex_count: u32, face_count: u32) -> bool {
    let span = u64::from(vertex_count) * VERTEX_RECORD_SIZE as u64
        + u64::from(face_count) * FACE_RECORD_SIZE as u64;
    (offset + COUNTS_SIZE) as u64 + span <= bytes.len() as u64
}

fn sample_is_plausible(bytes: &[u8], data: usize, vertex_count: u32, limits: &DecodeLimits) -> bool {
    let sample = limits
        .probe_sample
        .min(usize::try_from(vertex_count).unwrap_or(usize::MAX));
    (0..sample).all(|i| {
        read_f32x3(bytes, data + i * VERTEX_RECORD_SIZE).is_some_and(|raw| {
            let v = Vec3::from_array(raw);
            v.is_finite() && v.abs().max_element() <= limits.probe_limit
        })
    })
}

impl DecodeStrategy for ProbeStrategy {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn attempt(&self, bytes: &[u8], limits: &DecodeLimits) -> Option<DecodedGeometry> {
        let (offset, vertex_count, face_count) = Self::find_counts(bytes, limits)?;
        tracing::debug!(
            "Probe found {vertex_count} vertices, {face_count} faces at offset {offset:#x}"
        );
        Some(read_body(
            bytes,
            offset + COUNTS_SIZE,
            usize::try_from(vertex_count).ok()?,
            usize::try_from(face_count).ok()?,
            limits,
            GeometrySource::Probe { offset },
        ))
    }
}
