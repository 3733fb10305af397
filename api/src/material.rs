//! Layered Material

use crate::parser::*;
use layered_core::bsdf::*;
use layered_core::reflection::*;
use std::fmt;
use std::sync::Arc;

/// A material built from a layer stack description. All materials share one
/// total internal reflection table.
#[derive(Clone)]
pub struct LayeredMaterial {
    /// The textual description.
    description: String,

    /// The BSDF.
    bsdf: LayeredBSDF,
}

impl LayeredMaterial {
    /// Create a material with the strict parser.
    ///
    /// * `description` - Layer stack description.
    /// * `tir`         - Shared total internal reflection table.
    pub fn new(description: &str, tir: Arc<TIRLookup>) -> Result<Self, LayerParseError> {
        Self::with_parser(description, tir, &LayerStackParser::new())
    }

    /// Create a material with a custom parser.
    ///
    /// * `description` - Layer stack description.
    /// * `tir`         - Shared total internal reflection table.
    /// * `parser`      - The parser.
    pub fn with_parser(
        description: &str,
        tir: Arc<TIRLookup>,
        parser: &LayerStackParser,
    ) -> Result<Self, LayerParseError> {
        let stack = parser.parse(description)?;
        Ok(Self {
            description: String::from(description),
            bsdf: LayeredBSDF::new(stack, tir),
        })
    }

    /// Returns the textual description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the BSDF.
    pub fn bsdf(&self) -> &LayeredBSDF {
        &self.bsdf
    }
}

impl fmt::Display for LayeredMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayeredMaterial {{ {} }}", self.bsdf)
    }
}
