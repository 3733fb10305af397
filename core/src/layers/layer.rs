//! Layers

use super::variance::*;
use crate::pbrt::*;
use crate::spectrum::*;
use std::fmt;
use thiserror::Error;

/// Default bound on the number of layers in a stack.
pub const DEFAULT_MAX_LAYERS: usize = 16;

/// Errors raised while building a `LayerStack`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayerStackError {
    /// The stack already holds the configured maximum number of layers.
    #[error("layer stack is limited to {max} layers")]
    TooManyLayers { max: usize },
}

/// One interface or participating slab of the stack.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Layer {
    /// Interface tint or single scattering albedo.
    pub albedo: Spectrum,

    /// Real part of the index of refraction.
    pub eta: Float,

    /// Imaginary part of the index of refraction. Zero for dielectrics.
    pub kappa: Float,

    /// Microfacet roughness; for volumetric layers the variance of the phase
    /// function lobe.
    pub alpha: Float,

    /// Slab thickness. Positive values mark a volumetric layer.
    pub depth: Float,

    /// Absorption coefficient of volumetric layers.
    pub sigma_a: Spectrum,

    /// Scattering coefficient of volumetric layers.
    pub sigma_s: Spectrum,
}

impl Layer {
    /// Create a rough interface.
    ///
    /// * `albedo` - Interface tint.
    /// * `eta`    - Real part of the index of refraction.
    /// * `kappa`  - Imaginary part of the index of refraction.
    /// * `alpha`  - Roughness.
    pub fn interface(albedo: Spectrum, eta: Float, kappa: Float, alpha: Float) -> Self {
        Self {
            albedo,
            eta,
            kappa,
            alpha,
            depth: 0.0,
            sigma_a: Spectrum::ZERO,
            sigma_s: Spectrum::ZERO,
        }
    }

    /// Create a clear rough dielectric interface.
    ///
    /// * `eta`   - Index of refraction.
    /// * `alpha` - Roughness.
    pub fn dielectric(eta: Float, alpha: Float) -> Self {
        Self::interface(Spectrum::ONE, eta, 0.0, alpha)
    }

    /// Create a rough conducting interface.
    ///
    /// * `albedo` - Tint applied to the Fresnel reflectance.
    /// * `eta`    - Real part of the index of refraction.
    /// * `kappa`  - Imaginary part of the index of refraction.
    /// * `alpha`  - Roughness.
    pub fn conductor(albedo: Spectrum, eta: Float, kappa: Float, alpha: Float) -> Self {
        Self::interface(albedo, eta, kappa, alpha)
    }

    /// Create an index matched interface that transmits everything.
    ///
    /// * `eta` - Index of refraction of the medium above.
    pub fn clear(eta: Float) -> Self {
        Self::dielectric(eta, 0.0)
    }

    /// Create a participating slab. Slabs do not change the index of
    /// refraction. A non-positive depth yields a clear interface.
    ///
    /// * `albedo`    - Single scattering albedo.
    /// * `depth`     - Slab thickness.
    /// * `g`         - Henyey-Greenstein asymmetry parameter.
    /// * `eta_above` - Index of refraction of the medium above.
    pub fn volumetric(albedo: Spectrum, depth: Float, g: Float, eta_above: Float) -> Self {
        if depth <= 0.0 {
            return Self::clear(eta_above);
        }

        let (sigma_a, sigma_s) = compute_sigma(albedo, DEFAULT_MEAN_FREE_PATH);
        Self {
            albedo,
            eta: eta_above,
            kappa: 0.0,
            alpha: g_to_variance(g),
            depth,
            sigma_a,
            sigma_s,
        }
    }

    /// Returns true for participating slabs.
    pub fn is_volumetric(&self) -> bool {
        self.depth > 0.0
    }

    /// Returns true for opaque conducting interfaces.
    pub fn is_conductor(&self) -> bool {
        self.kappa > 0.0
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_volumetric() {
            write!(
                f,
                "Volume {{ albedo: {}, depth: {}, variance: {} }}",
                self.albedo, self.depth, self.alpha
            )
        } else {
            write!(
                f,
                "Interface {{ albedo: {}, eta: {}, kappa: {}, alpha: {} }}",
                self.albedo, self.eta, self.kappa, self.alpha
            )
        }
    }
}

/// Ordered layers from top to bottom. The ambient medium above the first
/// layer is implicit with an index of refraction of 1.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    max_layers: usize,
}

impl LayerStack {
    /// Create an empty stack bounded by `DEFAULT_MAX_LAYERS`.
    pub fn new() -> Self {
        Self::with_max_layers(DEFAULT_MAX_LAYERS)
    }

    /// Create an empty stack with a custom bound.
    ///
    /// * `max_layers` - Maximum number of layers.
    pub fn with_max_layers(max_layers: usize) -> Self {
        Self {
            layers: Vec::with_capacity(max_layers.min(DEFAULT_MAX_LAYERS)),
            max_layers,
        }
    }

    /// Build a stack from layers.
    ///
    /// * `layers` - Layers from top to bottom.
    pub fn from_layers<I>(layers: I) -> Result<Self, LayerStackError>
    where
        I: IntoIterator<Item = Layer>,
    {
        let mut stack = Self::new();
        for layer in layers {
            stack.push(layer)?;
        }
        Ok(stack)
    }

    /// Append a layer at the bottom of the stack.
    ///
    /// * `layer` - The layer.
    pub fn push(&mut self, layer: Layer) -> Result<(), LayerStackError> {
        if self.layers.len() >= self.max_layers {
            return Err(LayerStackError::TooManyLayers {
                max: self.max_layers,
            });
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Append a participating slab that keeps the index of refraction of the
    /// current bottom layer.
    ///
    /// * `albedo` - Single scattering albedo.
    /// * `depth`  - Slab thickness.
    /// * `g`      - Henyey-Greenstein asymmetry parameter.
    pub fn push_volumetric(
        &mut self,
        albedo: Spectrum,
        depth: Float,
        g: Float,
    ) -> Result<(), LayerStackError> {
        let eta = self.bottom_eta();
        self.push(Layer::volumetric(albedo, depth, g, eta))
    }

    /// Returns the index of refraction of the medium below the last layer.
    pub fn bottom_eta(&self) -> Float {
        self.layers.last().map_or(1.0, |layer| layer.eta)
    }

    /// Returns the index of refraction of the medium above layer `i`.
    ///
    /// * `i` - Layer index.
    pub fn eta_above(&self, i: usize) -> Float {
        if i == 0 {
            1.0
        } else {
            self.layers[i - 1].eta
        }
    }

    /// Returns the configured maximum number of layers.
    pub fn max_layers(&self) -> usize {
        self.max_layers
    }

    /// Returns the number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if the stack has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns the layers from top to bottom.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumetric_layer_inherits_eta() {
        let mut stack = LayerStack::new();
        stack.push(Layer::dielectric(1.5, 0.1)).unwrap();
        stack
            .push_volumetric(Spectrum::from_rgb(0.0, 0.62, 1.0), 0.1, 0.7)
            .unwrap();

        let volume = stack.layers()[1];
        assert!(volume.is_volumetric());
        assert!(!volume.is_conductor());
        assert_eq!(volume.eta, 1.5);
        assert_eq!(volume.alpha, g_to_variance(0.7));
        assert_eq!(stack.eta_above(1), 1.5);
        assert_eq!(stack.eta_above(0), 1.0);
    }

    #[test]
    fn zero_depth_volume_is_clear() {
        let layer = Layer::volumetric(Spectrum::new(0.3), 0.0, 0.5, 1.33);
        assert_eq!(layer, Layer::clear(1.33));
        assert!(!layer.is_volumetric());
        assert_eq!(layer.albedo, Spectrum::ONE);
    }

    #[test]
    fn conductor_is_opaque() {
        let layer = Layer::conductor(Spectrum::ONE, 0.2, 3.0, 0.3);
        assert!(layer.is_conductor());
        assert!(!Layer::dielectric(1.5, 0.3).is_conductor());
    }

    #[test]
    fn stack_is_bounded() {
        let mut stack = LayerStack::with_max_layers(2);
        stack.push(Layer::dielectric(1.5, 0.1)).unwrap();
        stack.push(Layer::dielectric(1.3, 0.1)).unwrap();
        assert_eq!(
            stack.push(Layer::dielectric(1.1, 0.1)),
            Err(LayerStackError::TooManyLayers { max: 2 })
        );
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn empty_stack_sits_in_ambient_medium() {
        let stack = LayerStack::default();
        assert!(stack.is_empty());
        assert_eq!(stack.bottom_eta(), 1.0);
        assert_eq!(stack.max_layers(), DEFAULT_MAX_LAYERS);
    }

    #[test]
    fn from_layers_enforces_default_bound() {
        let layers = vec![Layer::dielectric(1.5, 0.1); DEFAULT_MAX_LAYERS + 1];
        assert!(LayerStack::from_layers(layers).is_err());
    }
}
