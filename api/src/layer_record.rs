//! Layer Records

use layered_core::pbrt::*;
use layered_core::spectrum::*;
use std::fmt;

/// A preset layer that encodes to one `{...}` record of a layer stack
/// description.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LayerRecord {
    /// Clear rough dielectric coating.
    Dielectric {
        /// Index of refraction.
        ior: Float,

        /// Roughness.
        roughness: Float,
    },

    /// Rough conductor.
    Metal {
        /// Tint.
        albedo: Spectrum,

        /// Real part of the index of refraction.
        ior: Float,

        /// Imaginary part of the index of refraction.
        kappa: Float,

        /// Roughness.
        roughness: Float,
    },

    /// Participating slab.
    Volumetric {
        /// Single scattering albedo.
        albedo: Spectrum,

        /// Thickness.
        depth: Float,

        /// Henyey-Greenstein asymmetry parameter.
        g: Float,
    },
}

impl LayerRecord {
    /// Create a dielectric record.
    ///
    /// * `ior`       - Index of refraction (default 1.5).
    /// * `roughness` - Roughness (default 0.01).
    pub fn dielectric(ior: Float, roughness: Float) -> Self {
        Self::Dielectric { ior, roughness }
    }

    /// Create a metal record.
    ///
    /// * `albedo`    - Tint (default (1, 0.7, 0.7)).
    /// * `ior`       - Real part of the index of refraction (default 0.5).
    /// * `kappa`     - Imaginary part of the index of refraction (default 3).
    /// * `roughness` - Roughness (default 0.2).
    pub fn metal(albedo: Spectrum, ior: Float, kappa: Float, roughness: Float) -> Self {
        Self::Metal {
            albedo,
            ior,
            kappa,
            roughness,
        }
    }

    /// Create a volumetric record.
    ///
    /// * `albedo` - Single scattering albedo (default (0, 0.62, 1)).
    /// * `depth`  - Thickness (default 0.1).
    /// * `g`      - Henyey-Greenstein asymmetry parameter (default 0.7).
    pub fn volumetric(albedo: Spectrum, depth: Float, g: Float) -> Self {
        Self::Volumetric { albedo, depth, g }
    }

    /// Returns the default dielectric record.
    pub fn default_dielectric() -> Self {
        Self::dielectric(1.5, 0.01)
    }

    /// Returns the default metal record.
    pub fn default_metal() -> Self {
        Self::metal(Spectrum::from_rgb(1.0, 0.7, 0.7), 0.5, 3.0, 0.2)
    }

    /// Returns the default volumetric record.
    pub fn default_volumetric() -> Self {
        Self::volumetric(Spectrum::from_rgb(0.0, 0.62, 1.0), 0.1, 0.7)
    }
}

impl fmt::Display for LayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dielectric { ior, roughness } => {
                write!(f, "{{eta={:.3};alpha={:.3}}}", ior, roughness)
            }
            Self::Metal {
                albedo,
                ior,
                kappa,
                roughness,
            } => write!(
                f,
                "{{albedo={:.3},{:.3},{:.3};eta={:.3};kappa={:.3};alpha={:.3}}}",
                albedo[0], albedo[1], albedo[2], ior, kappa, roughness
            ),
            Self::Volumetric { albedo, depth, g } => write!(
                f,
                "{{albedo={:.3},{:.3},{:.3};depth={:.3};g={:.3}}}",
                albedo[0], albedo[1], albedo[2], depth, g
            ),
        }
    }
}

/// Stacks the description `bottom` below `top`.
///
/// * `top`    - Description of the upper layers.
/// * `bottom` - Description of the lower layers.
pub fn add(top: &str, bottom: &str) -> String {
    format!("{}{}", top, bottom)
}

/// Encodes records from top to bottom into a layer stack description.
///
/// * `records` - The records.
pub fn encode(records: &[LayerRecord]) -> String {
    records.iter().map(|r| r.to_string()).collect()
}
