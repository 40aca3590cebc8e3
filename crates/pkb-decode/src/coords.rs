//! Unit scaling and axis remapping.
//!
//! Source meshes are authored in centimeters with Z up. Decoded output is
//! meters with Y up: `(x, y, z) -> (x, z, -y) * 0.01`.

use glam::Vec3;

use crate::geometry::is_valid_normal_magnitude;

/// Centimeters to meters.
pub const UNIT_SCALE: f32 = 0.01;

/// Coordinate convention of decoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// Source convention, left untouched.
    SourceZUp,
    /// Remapped to Y up, meters.
    YUpMeters,
}

/// Remap the source up axis onto Y without scaling.
#[must_use]
pub fn remap_axes(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/// Scale a source position to meters and remap it.
#[must_use]
pub fn normalize_vertex(v: Vec3) -> Vec3 {
    remap_axes(v * UNIT_SCALE)
}

/// Remap a source normal and bring it to unit length.
///
/// Returns `None` when the raw magnitude falls outside the accepted range.
#[must_use]
pub fn normalize_normal(n: Vec3) -> Option<Vec3> {
    let remapped = remap_axes(n);
    let length = remapped.length();
    is_valid_normal_magnitude(length).then(|| remapped / length)
}

/// Flip `v` so that `0` is the top edge of the texture.
#[must_use]
pub fn flip_uv(u: f32, v: f32) -> [f32; 2] {
    [u, 1.0 - v]
}

/// Swap the last two corners of a triangle.
///
/// Applying this twice returns the original triangle.
#[must_use]
pub fn reverse_winding([a, b, c]: [u32; 3]) -> [u32; 3] {
    [a, c, b]
}
