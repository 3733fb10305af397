//! Roughness and variance conversions

use crate::pbrt::*;
use crate::spectrum::*;

/// Mean free path used to derive scattering coefficients of volumetric
/// layers.
pub const DEFAULT_MEAN_FREE_PATH: Float = 1.0;

/// Exponent of the power law that makes variances of sequential lobes
/// approximately additive.
const VARIANCE_EXPONENT: Float = 1.1;

/// Maps a microfacet roughness to its slope variance.
///
/// * `alpha` - Roughness, clamped to [0, 0.9999].
pub fn roughness_to_variance(alpha: Float) -> Float {
    let a = clamp(alpha, 0.0, 0.9999).powf(VARIANCE_EXPONENT);
    a / (1.0 - a)
}

/// Maps a slope variance back to a microfacet roughness.
///
/// * `variance` - Slope variance.
pub fn variance_to_roughness(variance: Float) -> Float {
    (variance / (1.0 + variance)).powf(1.0 / VARIANCE_EXPONENT)
}

/// Maps a Henyey-Greenstein asymmetry parameter to the variance of an
/// equivalent microfacet lobe.
///
/// * `g` - Asymmetry parameter, clamped to [1e-4, 1].
pub fn g_to_variance(g: Float) -> Float {
    let g = clamp(g, 1e-4, 1.0);
    ((1.0 - g) / g).powf(0.8) / (1.0 + g)
}

/// Returns the absorption and scattering coefficients `(sigma_a, sigma_s)` of
/// a medium.
///
/// * `albedo`         - Single scattering albedo.
/// * `mean_free_path` - Mean free path.
pub fn compute_sigma(albedo: Spectrum, mean_free_path: Float) -> (Spectrum, Spectrum) {
    let sigma_t = 1.0 / mean_free_path;
    let sigma_s = albedo * sigma_t;
    (Spectrum::new(sigma_t) - sigma_s, sigma_s)
}
