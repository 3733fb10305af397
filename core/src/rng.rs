//! Random Number Sources.
//!
//! The BSDF never owns a generator. Callers hand in a `UniformSource`, one per
//! thread.

use crate::geometry::*;
use crate::pbrt::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A stream of independent uniform values in [0, 1).
pub trait UniformSource {
    /// Returns a uniformly distributed value over the half open interval [0.0, 1.0).
    fn uniform_float(&mut self) -> Float;

    /// Returns a pair of uniformly distributed values in [0, 1)^2.
    fn uniform_point2(&mut self) -> Point2f {
        let x = self.uniform_float();
        let y = self.uniform_float();
        Point2f::new(x, y)
    }
}

impl<R: Rng> UniformSource for R {
    fn uniform_float(&mut self) -> Float {
        min(self.gen::<Float>(), ONE_MINUS_EPSILON)
    }
}

/// Returns a deterministic generator for the given stream index.
///
/// * `seed` - The seed.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
