//! Microfacet Distribution Models

use crate::geometry::*;
use crate::pbrt::*;

mod ggx;

// Re-exports
pub use ggx::*;

/// Interface for isotropic microfacet distribution models expressed in terms
/// of cosines measured from the macro-surface normal.
pub trait MicrofacetDistribution {
    /// Return the differential area of microfacets oriented with a normal at
    /// the given angle from the macro-surface normal.
    ///
    /// * `cos_theta_h` - Cosine of the angle between half vector and normal.
    fn d(&self, cos_theta_h: Float) -> Float;

    /// Evaluates the one-sided masking function, the fraction of microfacets
    /// visible from a direction.
    ///
    /// * `cos_theta` - Cosine of the angle between direction and normal.
    fn g1(&self, cos_theta: Float) -> Float;

    /// Returns the fraction of microfacets in a differential area that are
    /// visible from both directions.
    ///
    /// * `cos_theta_o` - Cosine of the outgoing direction.
    /// * `cos_theta_i` - Cosine of the incident direction.
    fn g(&self, cos_theta_o: Float, cos_theta_i: Float) -> Float {
        self.g1(abs(cos_theta_o)) * self.g1(abs(cos_theta_i))
    }

    /// Returns a sample from the distribution of normal vectors in the local
    /// frame where `z` is the macro-surface normal.
    ///
    /// * `u` - The 2D uniform random values.
    fn sample_wh(&self, u: &Point2f) -> Vector3f;
}
