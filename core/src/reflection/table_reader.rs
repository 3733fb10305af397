//! Binary table reader

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, Read};

/// Number of values decoded per read.
const READ_CHUNK: usize = 4096;

/// Opens a file for reading.
///
/// * `path` - The file path.
pub fn open_file(path: &str) -> io::Result<File> {
    File::open(path)
}

/// Helpers for reading little-endian lookup tables.
///
/// `NOTE`: This is just a convenience way to add helpers to any `Read`.
pub trait TableReader {
    /// Reads one 32-bit signed value.
    fn read_i32_le(&mut self) -> io::Result<i32>;

    /// Reads given number of 32-bit signed values.
    ///
    /// * `count` - Number of values to read.
    fn read_i32_vec(&mut self, count: usize) -> io::Result<Vec<i32>>;

    /// Reads given number of 32-bit floating point values.
    ///
    /// * `count` - Number of values to read.
    fn read_f32_vec(&mut self, count: usize) -> io::Result<Vec<f32>>;
}

impl<R: Read> TableReader for R {
    fn read_i32_le(&mut self) -> io::Result<i32> {
        ReadBytesExt::read_i32::<LittleEndian>(self)
    }

    fn read_i32_vec(&mut self, count: usize) -> io::Result<Vec<i32>> {
        let mut buffer = vec![0_i32; count];
        ReadBytesExt::read_i32_into::<LittleEndian>(self, &mut buffer)?;
        Ok(buffer)
    }

    fn read_f32_vec(&mut self, count: usize) -> io::Result<Vec<f32>> {
        // Grow in bounded chunks so a bogus count fails on the short read
        // instead of on the allocation.
        let mut buffer: Vec<f32> = Vec::with_capacity(count.min(READ_CHUNK));
        let mut chunk = [0.0_f32; READ_CHUNK];
        while buffer.len() < count {
            let n = (count - buffer.len()).min(READ_CHUNK);
            ReadBytesExt::read_f32_into::<LittleEndian>(self, &mut chunk[..n])?;
            buffer.extend_from_slice(&chunk[..n]);
        }
        Ok(buffer)
    }
}
