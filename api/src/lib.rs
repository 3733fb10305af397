//! The API

#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;

mod layer_record;
mod material;
pub mod parser;

// Re-export.
pub use layer_record::*;
pub use material::*;
