//! Geometry

mod point2;
mod vector3;

// Re-export
pub use point2::*;
pub use vector3::*;

use crate::pbrt::*;

/// Construct a local coordinate system given a normalized vector. Returns
/// the two vectors that together with `v1` form an orthonormal basis.
///
/// * `v1` - The first (normalized) basis vector.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if abs(v1.x) > abs(v1.y) {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(&v2);
    (v2, v3)
}

/// Mirror `wo` about the normal `n`.
///
/// * `wo` - Outgoing direction.
/// * `n`  - The (normalized) mirror axis.
#[inline]
pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    *n * (2.0 * wo.dot(n)) - *wo
}

/// Orthonormal shading frame around a normal.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    /// First tangent.
    pub s: Vector3f,

    /// Second tangent.
    pub t: Vector3f,

    /// The normal.
    pub n: Vector3f,
}

impl Frame {
    /// Create a new frame around the given normal.
    ///
    /// * `n` - The normal. It will be normalized.
    pub fn from_normal(n: &Vector3f) -> Self {
        let n = n.normalize();
        let (s, t) = coordinate_system(&n);
        Self { s, t, n }
    }

    /// Transform a vector in local coordinates to world space.
    ///
    /// * `v` - Local vector where `z` runs along the normal.
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}
