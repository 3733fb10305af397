//! Reflection and Fresnel models

mod complex;
mod fresnel;
mod table_reader;
mod tir_table;

// Re-export
pub use complex::*;
pub use fresnel::*;
pub use table_reader::*;
pub use tir_table::*;
