//! Geometry validation predicates.
//!
//! Records that fail these checks are dropped individually; they never abort
//! a decode.

use glam::Vec3;

/// Largest accepted source coordinate magnitude (exclusive), in centimeters.
pub const VERTEX_LIMIT: f32 = 100_000.0;

/// Accepted normal magnitude before re-normalization (exclusive bounds).
pub const NORMAL_MAGNITUDE_RANGE: (f32, f32) = (0.01, 2.0);

/// Check that every component is finite and strictly below `limit` in magnitude.
#[must_use]
pub fn is_valid_vertex(v: Vec3, limit: f32) -> bool {
    v.is_finite() && v.abs().max_element() < limit
}

/// Check that all three indices address an existing vertex.
#[must_use]
pub fn is_valid_face(face: [u32; 3], vertex_count: usize) -> bool {
    face.iter()
        .all(|&i| usize::try_from(i).is_ok_and(|i| i < vertex_count))
}

/// Check that a UV pair is usable.
#[must_use]
pub fn is_valid_uv(u: f32, v: f32) -> bool {
    u.is_finite() && v.is_finite()
}

/// Check that a raw normal can be re-normalized.
#[must_use]
pub fn is_valid_normal_magnitude(length: f32) -> bool {
    let (min, max) = NORMAL_MAGNITUDE_RANGE;
    length.is_finite() && length > min && length < max
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn vertex_limit_is_exclusive() {
        assert!(is_valid_vertex(Vec3::new(99_999.0, 0.0, -99_999.0), VERTEX_LIMIT));
        assert!(!is_valid_vertex(Vec3::new(100_000.0, 0.0, 0.0), VERTEX_LIMIT));
        assert!(!is_valid_vertex(Vec3::new(0.0, -100_000.0, 0.0), VERTEX_LIMIT));
    }

    #[test]
    fn non_finite_vertices_are_rejected() {
        assert!(!is_valid_vertex(Vec3::new(f32::NAN, 0.0, 0.0), VERTEX_LIMIT));
        assert!(!is_valid_vertex(Vec3::new(0.0, f32::INFINITY, 0.0), VERTEX_LIMIT));
        assert!(!is_valid_vertex(
            Vec3::new(0.0, 0.0, f32::NEG_INFINITY),
            VERTEX_LIMIT
        ));
    }

    #[test]
    fn face_indices_must_be_in_range() {
        assert!(is_valid_face([0, 1, 2], 3));
        assert!(!is_valid_face([0, 1, 3], 3));
        assert!(!is_valid_face([0, 0, 0], 0));
    }

    #[test]
    fn normal_magnitude_bounds() {
        assert!(is_valid_normal_magnitude(1.0));
        assert!(!is_valid_normal_magnitude(0.01));
        assert!(!is_valid_normal_magnitude(0.001));
        assert!(!is_valid_normal_magnitude(2.0));
        assert!(!is_valid_normal_magnitude(f32::NAN));
    }

    proptest! {
        #[test]
        fn nan_component_never_validates(
            a in any::<f32>(),
            b in any::<f32>(),
            slot in 0usize..3,
        ) {
            let mut c = [a, b, a];
            c[slot] = f32::NAN;
            prop_assert!(!is_valid_vertex(Vec3::from_array(c), VERTEX_LIMIT));
        }

        #[test]
        fn accepted_vertices_are_bounded(x in any::<f32>(), y in any::<f32>(), z in any::<f32>()) {
            let v = Vec3::new(x, y, z);
            if is_valid_vertex(v, VERTEX_LIMIT) {
                prop_assert!(x.abs() < VERTEX_LIMIT);
                prop_assert!(y.abs() < VERTEX_LIMIT);
                prop_assert!(z.abs() < VERTEX_LIMIT);
            }
        }
    }
}
