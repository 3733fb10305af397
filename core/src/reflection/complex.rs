//! Complex numbers for conductor Fresnel terms

use crate::pbrt::*;
use std::ops::{Add, Div, Mul, Sub};

/// A complex value `re + i·im`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Complex {
    /// Real part.
    pub re: Float,

    /// Imaginary part.
    pub im: Float,
}

impl Complex {
    /// Create a new complex value.
    ///
    /// * `re` - Real part.
    /// * `im` - Imaginary part.
    pub fn new(re: Float, im: Float) -> Self {
        Self { re, im }
    }

    /// Create a complex value with zero imaginary part.
    ///
    /// * `re` - Real part.
    pub fn real(re: Float) -> Self {
        Self { re, im: 0.0 }
    }

    /// Returns `|z|²`.
    pub fn norm_squared(&self) -> Float {
        self.re * self.re + self.im * self.im
    }

    /// Returns the principal square root.
    ///
    /// Uses `t = sqrt((|z| + |re|) / 2)` and derives the other component from
    /// `im / 2t`, which never subtracts nearly equal magnitudes.
    pub fn sqrt(&self) -> Self {
        let n = self.re.hypot(self.im);
        if n == 0.0 {
            return Self::default();
        }

        let t1 = (0.5 * (n + abs(self.re))).sqrt();
        let t2 = 0.5 * self.im / t1;
        if self.re >= 0.0 {
            Self::new(t1, t2)
        } else {
            Self::new(abs(t2), t1.copysign(self.im))
        }
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.re + other.re, self.im + other.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.re - other.re, self.im - other.im)
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }
}

impl Div for Complex {
    type Output = Self;

    /// Smith's algorithm: scale by the ratio of the divisor's components so
    /// no intermediate squares the divisor magnitude.
    fn div(self, other: Self) -> Self::Output {
        let (a, b, c, d) = (self.re, self.im, other.re, other.im);
        if abs(c) >= abs(d) {
            let r = d / c;
            let den = c + d * r;
            Self::new((a + b * r) / den, (b - a * r) / den)
        } else {
            let r = c / d;
            let den = c * r + d;
            Self::new((a * r + b) / den, (b * r - a) / den)
        }
    }
}
