//! Fresnel Dielectrics and Conductors

use super::complex::Complex;
use crate::pbrt::*;
use crate::spectrum::*;

/// Returns the fresnel reflection for dielectric materials and unpolarized light.
///
/// * `cos_theta_i` - cos(θi) for angle between incident direction and surface
///                   normal. Negative values mean the ray arrives from the
///                   denser side and `eta` is inverted.
/// * `eta`         - Relative index of refraction (transmitted / incident).
pub fn fr_dielectric(cos_theta_i: Float, eta: Float) -> Float {
    let mut cos_theta_i = clamp(cos_theta_i, -1.0, 1.0);
    let mut eta = eta;
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    // Compute _cosThetaT_ using Snell's law.
    let sin_theta_i = max(0.0, 1.0 - cos_theta_i * cos_theta_i).sqrt();
    let sin_theta_t = sin_theta_i / eta;

    // Handle total internal reflection.
    if sin_theta_t >= 1.0 {
        return 1.0;
    }

    let cos_theta_t = max(0.0, 1.0 - sin_theta_t * sin_theta_t).sqrt();
    let r_parl = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    let r_perp = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    (r_parl * r_parl + r_perp * r_perp) * 0.5
}

/// Returns the Fresnel reflection at the boundary between a dielectric and a
/// conductor with complex index of refraction `eta + i·k` for unpolarized light.
///
/// * `cos_theta_i` - cos(θi) for angle between incident direction and surface
///                   normal. Clamped to [0, 1].
/// * `eta`         - Real part of the relative index of refraction.
/// * `k`           - Absorption coefficient.
pub fn fr_conductor(cos_theta_i: Float, eta: Float, k: Float) -> Float {
    let eta_k = Complex::new(eta, k);
    let cos_theta_i = Complex::real(clamp(cos_theta_i, 0.0, 1.0));

    let sin2_theta_i = Complex::real(1.0 - cos_theta_i.norm_squared());
    let sin2_theta_t = sin2_theta_i / (eta_k * eta_k);
    let cos_theta_t = (Complex::real(1.0) - sin2_theta_t).sqrt();

    let r_parl = (eta_k * cos_theta_i - cos_theta_t) / (eta_k * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta_k * cos_theta_t) / (cos_theta_i + eta_k * cos_theta_t);
    (r_parl.norm_squared() + r_perp.norm_squared()) * 0.5
}

/// Returns the reflectance and transmittance `(R, T)` of a single interface.
/// Dielectrics (`kappa == 0`) reflect the uncoloured Fresnel term and transmit
/// the rest tinted by `albedo`; conductors reflect `albedo` times their Fresnel
/// term and transmit nothing.
///
/// * `cos_theta_i` - Cosine of the incident angle.
/// * `albedo`      - Interface tint.
/// * `eta`         - Relative index of refraction.
/// * `kappa`       - Relative absorption coefficient.
pub fn eval_fresnel(
    cos_theta_i: Float,
    albedo: Spectrum,
    eta: Float,
    kappa: Float,
) -> (Spectrum, Spectrum) {
    if kappa == 0.0 {
        let r = Spectrum::new(fr_dielectric(cos_theta_i, eta));
        (r, (Spectrum::ONE - r) * albedo)
    } else {
        (albedo * fr_conductor(cos_theta_i, eta, kappa), Spectrum::ZERO)
    }
}
