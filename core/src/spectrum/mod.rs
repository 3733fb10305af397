//! Spectrum

mod rgb_spectrum;

// Re-export
pub use rgb_spectrum::*;

/// Layered BSDFs are evaluated in RGB.
pub type Spectrum = RGBSpectrum;
