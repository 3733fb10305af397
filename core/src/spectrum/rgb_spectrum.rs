//! RGB Spectrum

use crate::pbrt::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Neg, Sub};

/// Number of samples stored in an `RGBSpectrum`.
pub const RGB_SAMPLES: usize = 3;

/// Channel values below this are treated as no contribution.
pub const SMALL_SPECTRUM_EPSILON: Float = 1e-4;

/// Stores an RGB triplet.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RGBSpectrum {
    c: [Float; RGB_SAMPLES],
}

impl RGBSpectrum {
    /// All channels zero.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// All channels one.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Create a new `RGBSpectrum` with all channels set to a constant value.
    ///
    /// * `v` - The constant value.
    pub fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Create a new `RGBSpectrum` from individual channel values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn from_rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0)
    }

    /// Returns true if every channel magnitude is below
    /// `SMALL_SPECTRUM_EPSILON`.
    pub fn is_small(&self) -> bool {
        self.c.iter().all(|v| abs(*v) < SMALL_SPECTRUM_EPSILON)
    }

    /// Returns the mean of the channels. This is the scalar stand-in used
    /// wherever a spectral quantity drives a scalar decision.
    pub fn average(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) / 3.0
    }

    /// Returns `e^c` per channel.
    pub fn exp(&self) -> Self {
        self.map(|v| v.exp())
    }

    /// Apply a function to each channel.
    ///
    /// * `f` - The function.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(Float) -> Float,
    {
        Self {
            c: [f(self.c[0]), f(self.c[1]), f(self.c[2])],
        }
    }
}

impl Clamp<Float> for RGBSpectrum {
    /// Clamps every channel to [low, high].
    ///
    /// * `low`  - Low value.
    /// * `high` - High value.
    fn clamp(&self, low: Float, high: Float) -> Self {
        self.map(|v| clamp(v, low, high))
    }
}

impl From<[Float; RGB_SAMPLES]> for RGBSpectrum {
    fn from(c: [Float; RGB_SAMPLES]) -> Self {
        Self { c }
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::from([self.c[0] + other.c[0], self.c[1] + other.c[1], self.c[2] + other.c[2]])
    }
}

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::from([self.c[0] - other.c[0], self.c[1] - other.c[1], self.c[2] - other.c[2]])
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self::from([self.c[0] * other.c[0], self.c[1] * other.c[1], self.c[2] * other.c[2]])
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    fn mul(self, f: Float) -> Self::Output {
        self.map(|v| v * f)
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    fn mul(self, s: RGBSpectrum) -> Self::Output {
        s * self
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Div for RGBSpectrum {
    type Output = Self;

    fn div(self, other: Self) -> Self::Output {
        Self::from([self.c[0] / other.c[0], self.c[1] / other.c[1], self.c[2] / other.c[2]])
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        let inv = 1.0 / f;
        self * inv
    }
}

impl Neg for RGBSpectrum {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.map(|v| -v)
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.6}, {:.6}, {:.6}]", self.c[0], self.c[1], self.c[2])
    }
}
