//! GGX Distribution

use super::MicrofacetDistribution;
use crate::geometry::*;
use crate::pbrt::*;
use crate::sampling::*;

/// Normals closer to the horizon than this have no microfacet area.
const MIN_COS_THETA_H: Float = 1e-6;

/// Implements the isotropic GGX (Trowbridge-Reitz) distribution with the
/// Schlick approximation of Smith shadowing.
#[derive(Copy, Clone, Debug)]
pub struct GGXDistribution {
    /// Roughness.
    alpha: Float,
}

impl GGXDistribution {
    /// Create a new `GGXDistribution`.
    ///
    /// * `alpha` - Roughness; values near 0 give near-perfect specular
    ///             reflection. Clamped to at least 1e-3.
    pub fn new(alpha: Float) -> Self {
        Self {
            alpha: max(0.001, alpha),
        }
    }

    /// Returns the roughness.
    pub fn alpha(&self) -> Float {
        self.alpha
    }
}

impl MicrofacetDistribution for GGXDistribution {
    fn d(&self, cos_theta_h: Float) -> Float {
        if cos_theta_h < MIN_COS_THETA_H {
            return 0.0;
        }
        let a2 = self.alpha * self.alpha;
        let t = cos_theta_h * cos_theta_h * (a2 - 1.0) + 1.0;
        a2 / (PI * t * t)
    }

    fn g1(&self, cos_theta: Float) -> Float {
        let k = 0.5 * self.alpha;
        cos_theta / (cos_theta * (1.0 - k) + k)
    }

    fn sample_wh(&self, u: &Point2f) -> Vector3f {
        let p = concentric_sample_disk(u);
        let z = max(0.0, 1.0 - p.length_squared()).sqrt();
        Vector3f::new(self.alpha * p.x, self.alpha * p.y, z).normalize()
    }
}
