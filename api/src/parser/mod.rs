//! Layer Stack Parser

use layered_core::layers::*;
use layered_core::pbrt::*;
use layered_core::spectrum::*;
use pest::iterators::*;
use pest::Parser;
use std::fs;
use std::io;
use thiserror::Error;

/// The `pest` parser generated from a grammar.
#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
struct LayerGrammar;

/// Errors raised while reading a layer stack description.
#[derive(Debug, Error)]
pub enum LayerParseError {
    /// The description file could not be read.
    #[error("could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The text does not follow the `{key=value;...}` grammar.
    #[error("invalid layer stack syntax: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    /// A key was given without a value.
    #[error("layer {layer}: missing value for '{key}'")]
    MissingValue { layer: usize, key: String },

    /// A value could not be converted.
    #[error("layer {layer}: invalid value '{value}' for '{key}'")]
    InvalidValue {
        layer: usize,
        key: String,
        value: String,
    },

    /// The description contains no layer.
    #[error("layer stack is empty")]
    EmptyStack,

    /// The layers do not fit in the stack.
    #[error(transparent)]
    Stack(#[from] LayerStackError),
}

/// Parameters of one `{...}` record with their defaults.
#[derive(Copy, Clone, Debug, PartialEq)]
struct LayerParams {
    albedo: Spectrum,
    eta: Option<Float>,
    kappa: Option<Float>,
    alpha: Option<Float>,
    depth: Option<Float>,
    g: Float,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            albedo: Spectrum::ONE,
            eta: None,
            kappa: None,
            alpha: None,
            depth: None,
            g: 0.0,
        }
    }
}

/// Reads layer stacks from their textual description.
#[derive(Copy, Clone, Debug)]
pub struct LayerStackParser {
    /// Maximum number of layers in the stack.
    max_layers: usize,

    /// Skip malformed values with a warning instead of failing.
    lenient: bool,
}

impl Default for LayerStackParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStackParser {
    /// Returns a strict parser bounded by `DEFAULT_MAX_LAYERS`.
    pub fn new() -> Self {
        Self {
            max_layers: DEFAULT_MAX_LAYERS,
            lenient: false,
        }
    }

    /// Set the maximum number of layers.
    ///
    /// * `max_layers` - Maximum number of layers.
    pub fn with_max_layers(mut self, max_layers: usize) -> Self {
        self.max_layers = max_layers;
        self
    }

    /// Set whether malformed values are skipped instead of rejected.
    ///
    /// * `lenient` - Skip malformed values.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Reads a layer stack description from a file.
    ///
    /// * `path` - File path.
    pub fn parse_file(&self, path: &str) -> Result<LayerStack, LayerParseError> {
        let text = fs::read_to_string(path).map_err(|source| LayerParseError::Read {
            path: String::from(path),
            source,
        })?;
        self.parse(&text)
    }

    /// Reads a layer stack description.
    ///
    /// * `text` - The description.
    pub fn parse(&self, text: &str) -> Result<LayerStack, LayerParseError> {
        let layer_stack = LayerGrammar::parse(Rule::layer_stack, text)
            .map_err(Box::new)?
            .next()
            .ok_or(LayerParseError::EmptyStack)?;

        let mut stack = LayerStack::with_max_layers(self.max_layers);
        for pair in layer_stack.into_inner() {
            match pair.as_rule() {
                Rule::layer => {
                    let params = self.parse_layer_rule(stack.len(), pair.into_inner())?;
                    push_layer(&mut stack, &params)?;
                }
                Rule::EOI => (), // Done
                _ => unreachable!(),
            }
        }

        if stack.is_empty() {
            return Err(LayerParseError::EmptyStack);
        }

        debug!("Parsed {} layers", stack.len());
        Ok(stack)
    }

    /// Parse the `param` rules of a `layer` rule.
    ///
    /// * `layer` - Index of the layer for diagnostics.
    /// * `pairs` - The inner token pairs for matched `layer` rule.
    fn parse_layer_rule(
        &self,
        layer: usize,
        pairs: Pairs<Rule>,
    ) -> Result<LayerParams, LayerParseError> {
        let mut params = LayerParams::default();
        for pair in pairs {
            let mut inner_rules = pair.into_inner();
            let key = match inner_rules.next() {
                Some(key) => key.as_str(),
                None => continue,
            };
            let value = inner_rules.next().map(|v| v.as_str().trim());

            if let Err(err) = set_param(&mut params, layer, key, value) {
                if self.lenient {
                    warn!("Skipping parameter. {}", err);
                } else {
                    return Err(err);
                }
            }
        }
        Ok(params)
    }
}

/// Reads a layer stack description with the default strict parser.
///
/// * `text` - The description.
pub fn parse_layer_stack(text: &str) -> Result<LayerStack, LayerParseError> {
    LayerStackParser::new().parse(text)
}

/// Reads a layer stack description skipping malformed values.
///
/// * `text` - The description.
pub fn parse_layer_stack_lenient(text: &str) -> Result<LayerStack, LayerParseError> {
    LayerStackParser::new().lenient(true).parse(text)
}

/// Store one `key=value` pair.
///
/// * `params` - The layer parameters.
/// * `layer`  - Index of the layer for diagnostics.
/// * `key`    - The key.
/// * `value`  - The value, if any.
fn set_param(
    params: &mut LayerParams,
    layer: usize,
    key: &str,
    value: Option<&str>,
) -> Result<(), LayerParseError> {
    let value = value.ok_or_else(|| LayerParseError::MissingValue {
        layer,
        key: String::from(key),
    })?;
    let invalid = || LayerParseError::InvalidValue {
        layer,
        key: String::from(key),
        value: String::from(value),
    };

    match key {
        "albedo" => {
            let c = value
                .split(',')
                .map(parse_float)
                .collect::<Option<Vec<Float>>>()
                .filter(|c| c.len() == 3)
                .ok_or_else(invalid)?;
            params.albedo = Spectrum::from_rgb(c[0], c[1], c[2]);
        }
        "eta" => params.eta = Some(parse_float(value).ok_or_else(invalid)?),
        "kappa" => params.kappa = Some(parse_float(value).ok_or_else(invalid)?),
        "alpha" => params.alpha = Some(parse_float(value).ok_or_else(invalid)?),
        "depth" => params.depth = Some(parse_float(value).ok_or_else(invalid)?),
        "g" => params.g = parse_float(value).ok_or_else(invalid)?,
        _ => warn!("Layer {}: ignoring unknown parameter '{}'", layer, key),
    }
    Ok(())
}

/// Parse a finite floating point value.
///
/// * `s` - The string.
fn parse_float(s: &str) -> Option<Float> {
    s.trim().parse::<Float>().ok().filter(|v| v.is_finite())
}

/// Append the layer described by a record. Records with a positive `depth`
/// are participating slabs that keep the index of refraction above them. A
/// zero depth leaves a clear index matched interface unless the record also
/// sets `eta`, `kappa` or `alpha`, in which case it is a regular interface.
///
/// * `stack`  - The stack.
/// * `params` - The record.
fn push_layer(stack: &mut LayerStack, params: &LayerParams) -> Result<(), LayerStackError> {
    let interface_keys = params.eta.is_some() || params.kappa.is_some() || params.alpha.is_some();
    match params.depth {
        Some(depth) if depth > 0.0 || !interface_keys => {
            if interface_keys {
                warn!(
                    "Layer {}: volumetric layer ignores 'eta', 'kappa' and 'alpha'",
                    stack.len()
                );
            }
            stack.push_volumetric(params.albedo, depth, params.g)
        }
        _ => stack.push(Layer::interface(
            params.albedo,
            params.eta.unwrap_or(1.0),
            params.kappa.unwrap_or(0.0),
            params.alpha.unwrap_or(0.0),
        )),
    }
}
