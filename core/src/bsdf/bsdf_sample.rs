//! BSDF Sample

use super::*;

/// A direction sampled from the BSDF.
#[derive(Copy, Clone, Debug, Default)]
pub struct BSDFSample {
    /// The sampled incident direction.
    pub wi: Vector3f,

    /// BSDF value (including the cosine of the incident direction).
    pub f: Spectrum,

    /// Value of the combined PDF of all lobes.
    pub pdf: Float,

    /// Monte-Carlo weight `f / pdf`.
    pub weight: Spectrum,

    /// Index of the lobe that generated the direction.
    pub lobe: usize,
}

impl BSDFSample {
    /// Create a new `BSDFSample`.
    ///
    /// * `wi`   - The sampled incident direction.
    /// * `f`    - BSDF value.
    /// * `pdf`  - Combined PDF; must be positive.
    /// * `lobe` - Index of the sampled lobe.
    pub fn new(wi: Vector3f, f: Spectrum, pdf: Float, lobe: usize) -> Self {
        Self {
            wi,
            f,
            pdf,
            weight: f / pdf,
            lobe,
        }
    }
}

/// The BSDF evaluated for a pair of directions.
#[derive(Copy, Clone, Debug, Default)]
pub struct BSDFEval {
    /// BSDF value (including the cosine of the incident direction).
    pub f: Spectrum,

    /// Value of the PDF.
    pub pdf: Float,

    /// Monte-Carlo weight `f / pdf`.
    pub weight: Spectrum,
}

impl BSDFEval {
    /// Create a new `BSDFEval`.
    ///
    /// * `f`   - BSDF value.
    /// * `pdf` - PDF; must be positive.
    pub fn new(f: Spectrum, pdf: Float) -> Self {
        Self {
            f,
            pdf,
            weight: f / pdf,
        }
    }
}
