//! Layer Stack

mod adding_doubling;
mod layer;
mod variance;

// Re-export
pub use adding_doubling::*;
pub use layer::*;
pub use variance::*;
