//! Layered BSDF

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;

mod bsdf_sample;
mod layered_bsdf;

// Re-export
pub use bsdf_sample::*;
pub use layered_bsdf::*;
