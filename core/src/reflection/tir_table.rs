//! Total Internal Reflection Lookup Table

use super::table_reader::*;
use crate::pbrt::*;
use std::io::{self, Read};
use thiserror::Error;

/// Default location of the precomputed table.
pub const DEFAULT_TIR_PATH: &str = "TIR.bin";

/// Axis names used in diagnostics.
const AXIS_NAMES: [&str; 3] = ["cos_theta", "alpha", "eta"];

/// Errors raised while loading a `TIRTable`.
#[derive(Debug, Error)]
pub enum TIRTableError {
    /// The table file could not be opened.
    #[error("could not open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The stream ended or failed before the table was complete.
    #[error("error reading {what}: {source}")]
    Read {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// One of the grid extents is not positive or the sample count
    /// overflows.
    #[error("invalid grid extents {0:?}")]
    InvalidExtent([i32; 3]),

    /// An axis range is empty or not finite.
    #[error("invalid range [{min}, {max}] for {axis} axis")]
    InvalidRange {
        axis: &'static str,
        min: Float,
        max: Float,
    },

    /// Sample count does not match the grid extents.
    #[error("expected {expected} samples, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Returns the number of samples of a grid, or `None` when an extent is zero
/// or the product overflows.
///
/// * `sizes` - Grid extents.
fn sample_count(sizes: [usize; 3]) -> Option<usize> {
    sizes
        .iter()
        .try_fold(1_usize, |acc, n| acc.checked_mul(*n))
        .filter(|count| *count > 0)
}

/// Regular 3-D grid of total internal reflection probabilities indexed by
/// (cosine of incidence, roughness, relative index of refraction).
///
/// The table is immutable once loaded, so a single instance can be shared by
/// any number of threads.
#[derive(Clone, Debug)]
pub struct TIRTable {
    /// Grid extents `[Nt, Na, Nn]`.
    sizes: [usize; 3],

    /// `(min, max)` range of each axis.
    ranges: [(Float, Float); 3],

    /// Samples with the last axis varying fastest.
    data: Vec<Float>,
}

impl TIRTable {
    /// Create a table from its grid extents, axis ranges and samples.
    ///
    /// * `sizes`  - Grid extents `[Nt, Na, Nn]`.
    /// * `ranges` - `(min, max)` of each axis.
    /// * `data`   - `Nt * Na * Nn` samples, index `n + Nn * (a + Na * t)`.
    pub fn new(
        sizes: [usize; 3],
        ranges: [(Float, Float); 3],
        data: Vec<Float>,
    ) -> Result<Self, TIRTableError> {
        let expected = sample_count(sizes).ok_or_else(|| {
            TIRTableError::InvalidExtent(sizes.map(|n| i32::try_from(n).unwrap_or(i32::MAX)))
        })?;

        for (axis, (min, max)) in ranges.iter().enumerate() {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(TIRTableError::InvalidRange {
                    axis: AXIS_NAMES[axis],
                    min: *min,
                    max: *max,
                });
            }
        }

        if data.len() != expected {
            return Err(TIRTableError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            sizes,
            ranges,
            data,
        })
    }

    /// Loads a table from a binary file.
    ///
    /// * `path` - The path to the table.
    pub fn from_file(path: &str) -> Result<Self, TIRTableError> {
        let file = open_file(path).map_err(|source| TIRTableError::Open {
            path: String::from(path),
            source,
        })?;
        Self::from_reader(&mut io::BufReader::new(file))
    }

    /// Loads a table from a little-endian stream: three `i32` extents, six
    /// `f32` axis bounds as (min, max) pairs, then the samples.
    ///
    /// * `reader` - The stream.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, TIRTableError> {
        let read_err =
            |what: &'static str| move |source: io::Error| TIRTableError::Read { what, source };

        let extents = reader.read_i32_vec(3).map_err(read_err("grid extents"))?;
        if extents.iter().any(|n| *n <= 0) {
            return Err(TIRTableError::InvalidExtent([
                extents[0], extents[1], extents[2],
            ]));
        }
        let sizes = [
            extents[0] as usize,
            extents[1] as usize,
            extents[2] as usize,
        ];

        let mm = reader.read_f32_vec(6).map_err(read_err("axis ranges"))?;
        let ranges = [(mm[0], mm[1]), (mm[2], mm[3]), (mm[4], mm[5])];

        let count = sample_count(sizes).ok_or(TIRTableError::InvalidExtent([
            extents[0], extents[1], extents[2],
        ]))?;
        let data = reader.read_f32_vec(count).map_err(read_err("samples"))?;

        Self::new(sizes, ranges, data)
    }

    /// Returns the grid extents `[Nt, Na, Nn]`.
    pub fn sizes(&self) -> [usize; 3] {
        self.sizes
    }

    /// Returns the `(min, max)` range of each axis.
    pub fn ranges(&self) -> [(Float, Float); 3] {
        self.ranges
    }

    /// Returns the stored sample at a grid node.
    ///
    /// * `t` - Index along the cosine axis.
    /// * `a` - Index along the roughness axis.
    /// * `n` - Index along the relative index of refraction axis.
    pub fn sample(&self, t: usize, a: usize, n: usize) -> Float {
        self.data[self.offset(t, a, n)]
    }

    #[inline]
    fn offset(&self, t: usize, a: usize, n: usize) -> usize {
        n + self.sizes[2] * (a + self.sizes[1] * t)
    }

    /// Trilinearly interpolates the table.
    ///
    /// Coordinates outside the grid are clamped to its edge. NaN samples are
    /// skipped but the weights of the remaining corners are left as is, so a
    /// partially invalid cell attenuates the result.
    ///
    /// * `cos_theta` - Cosine of the propagation angle.
    /// * `alpha`     - Roughness.
    /// * `eta`       - Relative index of refraction.
    pub fn query(&self, cos_theta: Float, alpha: Float, eta: Float) -> Float {
        let coords = [cos_theta, alpha, eta];
        let mut index = [0_usize; 3];
        let mut weight = [0.0 as Float; 3];
        for axis in 0..3 {
            let n = self.sizes[axis];
            let (lo, hi) = self.ranges[axis];
            let x = n as Float * (coords[axis] - lo) / (hi - lo);
            let i = clamp(x.floor(), 0.0, (n - 1) as Float) as usize;
            index[axis] = i;
            weight[axis] = clamp(x - i as Float, 0.0, 1.0);
        }

        let base = self.offset(index[0], index[1], index[2]);
        let mut v = 0.0;
        for corner in 0..8_usize {
            let mut w = 1.0;
            let mut shift = 0;
            for axis in 0..3 {
                let mut upper = corner & (1 << axis) != 0;
                w *= if upper { weight[axis] } else { 1.0 - weight[axis] };

                // Collapse onto the lower corner at the far edge of the grid.
                if index[axis] + 1 >= self.sizes[axis] {
                    upper = false;
                }
                shift = shift * self.sizes[axis] + usize::from(upper);
            }

            let sample = self.data[base + shift];
            if !sample.is_nan() {
                v += w * sample;
            }
        }
        v
    }
}

/// The total internal reflection table as handed to the solver. A missing
/// table disables the correction instead of failing the render.
#[derive(Clone, Debug)]
pub enum TIRLookup {
    /// A loaded table.
    Available(TIRTable),

    /// No table; the solver skips the correction.
    Unavailable,
}

impl TIRLookup {
    /// Loads the table at `path`, falling back to `Unavailable` with a warning.
    ///
    /// * `path` - The path to the table.
    pub fn load(path: &str) -> Self {
        match TIRTable::from_file(path) {
            Ok(table) => {
                let [nt, na, nn] = table.sizes();
                debug!("Loaded TIR table '{}' ({}x{}x{})", path, nt, na, nn);
                Self::Available(table)
            }
            Err(err) => {
                warn!(
                    "TIR table unavailable, total internal reflection correction disabled. {}",
                    err
                );
                Self::Unavailable
            }
        }
    }

    /// Returns true if a table is loaded.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Queries the table if one is loaded.
    ///
    /// * `cos_theta` - Cosine of the propagation angle.
    /// * `alpha`     - Roughness.
    /// * `eta`       - Relative index of refraction.
    pub fn query(&self, cos_theta: Float, alpha: Float, eta: Float) -> Option<Float> {
        match self {
            Self::Available(table) => Some(table.query(cos_theta, alpha, eta)),
            Self::Unavailable => None,
        }
    }
}

impl From<TIRTable> for TIRLookup {
    fn from(table: TIRTable) -> Self {
        Self::Available(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};
    use float_cmp::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    const SIZES: [usize; 3] = [4, 2, 8];
    const RANGES: [(Float, Float); 3] = [(0.0, 1.0), (0.0, 1.0), (1.0, 3.0)];

    fn sample_value(t: usize, a: usize, n: usize) -> Float {
        0.1 * t as Float + 0.37 * a as Float - 0.05 * n as Float + 0.01 * (t * n) as Float
    }

    fn table_bytes(sizes: [usize; 3], ranges: [(Float, Float); 3], data: &[Float]) -> Vec<u8> {
        let mut bytes = vec![];
        for n in sizes {
            bytes.write_i32::<LittleEndian>(n as i32).unwrap();
        }
        for (lo, hi) in ranges {
            bytes.write_f32::<LittleEndian>(lo).unwrap();
            bytes.write_f32::<LittleEndian>(hi).unwrap();
        }
        for v in data {
            bytes.write_f32::<LittleEndian>(*v).unwrap();
        }
        bytes
    }

    fn grid_data() -> Vec<Float> {
        let mut data = vec![];
        for t in 0..SIZES[0] {
            for a in 0..SIZES[1] {
                for n in 0..SIZES[2] {
                    data.push(sample_value(t, a, n));
                }
            }
        }
        data
    }

    fn test_table() -> TIRTable {
        let bytes = table_bytes(SIZES, RANGES, &grid_data());
        TIRTable::from_reader(&mut Cursor::new(bytes)).unwrap()
    }

    /// Continuous coordinate of a grid node.
    fn node(axis: usize, i: usize) -> Float {
        let (lo, hi) = RANGES[axis];
        lo + i as Float * (hi - lo) / SIZES[axis] as Float
    }

    #[test]
    fn reads_layout_with_last_axis_fastest() {
        let table = test_table();
        assert_eq!(table.sizes(), SIZES);
        assert_eq!(table.ranges(), RANGES);
        assert_eq!(table.sample(2, 1, 5), sample_value(2, 1, 5));
        assert_eq!(table.sample(3, 0, 7), sample_value(3, 0, 7));
    }

    #[test]
    fn query_at_nodes_returns_stored_samples() {
        let table = test_table();
        for t in 0..SIZES[0] {
            for a in 0..SIZES[1] {
                for n in 0..SIZES[2] {
                    let v = table.query(node(0, t), node(1, a), node(2, n));
                    assert!(
                        approx_eq!(Float, v, sample_value(t, a, n), epsilon = 1e-5),
                        "node ({}, {}, {}) returned {}",
                        t,
                        a,
                        n,
                        v
                    );
                }
            }
        }
    }

    #[test]
    fn query_is_continuous_across_cell_boundaries() {
        let table = test_table();
        let eps = 1e-4;
        for t in 1..SIZES[0] {
            let x = node(0, t);
            let below = table.query(x - eps, 0.3, 1.6);
            let above = table.query(x + eps, 0.3, 1.6);
            assert!(approx_eq!(Float, below, above, epsilon = 1e-3));
        }
        for n in 1..SIZES[2] {
            let x = node(2, n);
            let below = table.query(0.4, 0.6, x - eps);
            let above = table.query(0.4, 0.6, x + eps);
            assert!(approx_eq!(Float, below, above, epsilon = 1e-3));
        }
    }

    #[test]
    fn query_outside_grid_clamps_to_edge() {
        let table = test_table();
        let last = [SIZES[0] - 1, SIZES[1] - 1, SIZES[2] - 1];
        let v = table.query(5.0, 5.0, 50.0);
        assert!(approx_eq!(Float, v, sample_value(last[0], last[1], last[2]), epsilon = 1e-5));
        let v = table.query(-5.0, -5.0, -50.0);
        assert!(approx_eq!(Float, v, sample_value(0, 0, 0), epsilon = 1e-5));
    }

    #[test]
    fn nan_samples_attenuate_without_renormalizing() {
        let sizes = [2, 1, 1];
        let ranges = [(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)];
        let table = TIRTable::new(sizes, ranges, vec![1.0, Float::NAN]).unwrap();

        // Halfway between the valid and the NaN sample only the valid weight
        // survives.
        assert!(approx_eq!(Float, table.query(0.25, 0.0, 0.0), 0.5, epsilon = 1e-6));
        assert!(approx_eq!(Float, table.query(0.0, 0.0, 0.0), 1.0, epsilon = 1e-6));
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut bytes = table_bytes(SIZES, RANGES, &grid_data());
        bytes.truncate(bytes.len() - 2);
        let err = TIRTable::from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, TIRTableError::Read { what: "samples", .. }));
    }

    #[test]
    fn non_positive_extent_is_an_error() {
        let bytes = table_bytes([0, 2, 2], RANGES, &[]);
        let err = TIRTable::from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, TIRTableError::InvalidExtent(_)));
    }

    #[test]
    fn overflowing_extents_are_an_error() {
        let max = i32::MAX as usize;
        let bytes = table_bytes([max, max, max], RANGES, &[]);
        let err = TIRTable::from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(
            err,
            TIRTableError::InvalidExtent([i32::MAX, i32::MAX, i32::MAX])
        ));

        let err = TIRTable::new([usize::MAX, 2, 2], RANGES, vec![]).unwrap_err();
        assert!(matches!(err, TIRTableError::InvalidExtent(_)));
    }

    #[test]
    fn huge_extents_without_samples_are_a_read_error() {
        let bytes = table_bytes([100_000; 3], RANGES, &[0.5; 16]);
        let err = TIRTable::from_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, TIRTableError::Read { what: "samples", .. }));
    }

    #[test]
    fn corrupt_header_is_unavailable() {
        let path = std::env::temp_dir().join(format!("tir-corrupt-test-{}.bin", std::process::id()));
        std::fs::write(&path, table_bytes([100_000; 3], RANGES, &[])).unwrap();
        let lookup = TIRLookup::load(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(!lookup.is_available());
    }

    #[test]
    fn empty_range_is_an_error() {
        let err = TIRTable::new([1, 1, 1], [(0.0, 1.0), (0.5, 0.5), (1.0, 2.0)], vec![0.0])
            .unwrap_err();
        assert!(matches!(err, TIRTableError::InvalidRange { axis: "alpha", .. }));
    }

    #[test]
    fn mismatched_sample_count_is_an_error() {
        let err = TIRTable::new([2, 2, 2], RANGES, vec![0.0; 7]).unwrap_err();
        assert!(matches!(
            err,
            TIRTableError::InvalidLength {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let lookup = TIRLookup::load("/nonexistent/dir/TIR.bin");
        assert!(!lookup.is_available());
        assert_eq!(lookup.query(0.5, 0.5, 1.5), None);
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("tir-table-test-{}.bin", std::process::id()));
        std::fs::write(&path, table_bytes(SIZES, RANGES, &grid_data())).unwrap();
        let lookup = TIRLookup::load(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();

        assert!(lookup.is_available());
        let v = lookup.query(node(0, 1), node(1, 1), node(2, 2)).unwrap();
        assert!(approx_eq!(Float, v, sample_value(1, 1, 2), epsilon = 1e-5));
    }

    #[test]
    fn lookup_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TIRLookup>();
    }

    proptest! {
        #[test]
        fn query_of_constant_table_is_constant(
            t in -1.0..2.0f32, a in -1.0..2.0f32, n in 0.0..4.0f32, c in 0.0..1.0f32,
        ) {
            let table = TIRTable::new(SIZES, RANGES, vec![c; 64]).unwrap();
            prop_assert!(approx_eq!(Float, table.query(t, a, n), c, epsilon = 1e-5));
        }

        #[test]
        fn query_is_bounded_by_samples(t in 0.0..1.0f32, a in 0.0..1.0f32, n in 1.0..3.0f32) {
            let table = test_table();
            let data = grid_data();
            let lo = data.iter().cloned().fold(Float::INFINITY, Float::min);
            let hi = data.iter().cloned().fold(Float::NEG_INFINITY, Float::max);
            let v = table.query(t, a, n);
            prop_assert!(v >= lo - 1e-5 && v <= hi + 1e-5);
        }
    }
}
