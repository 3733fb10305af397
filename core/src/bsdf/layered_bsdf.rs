//! Layered Microfacet BSDF

use super::*;
use crate::layers::*;
use crate::microfacet::*;
use crate::reflection::*;
use crate::rng::*;
use std::fmt;
use std::sync::Arc;

/// Reflection from a stack of rough interfaces and participating slabs. Each
/// layer contributes one GGX lobe whose energy and roughness come from the
/// adding-doubling solver.
///
/// Directions are given in world space and are expected to be normalized.
#[derive(Clone)]
pub struct LayeredBSDF {
    /// The layers.
    stack: LayerStack,

    /// Shared total internal reflection table.
    tir: Arc<TIRLookup>,
}

impl LayeredBSDF {
    /// Create a new `LayeredBSDF`.
    ///
    /// * `stack` - The layers from top to bottom.
    /// * `tir`   - Total internal reflection table.
    pub fn new(stack: LayerStack, tir: Arc<TIRLookup>) -> Self {
        Self { stack, tir }
    }

    /// Returns the layers.
    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    /// Returns the lobes reflected for a given outgoing cosine.
    ///
    /// * `cos_theta_o` - Cosine of the outgoing direction.
    pub fn lobes(&self, cos_theta_o: Float) -> Lobes {
        AddingDoubling::new(&self.tir).solve(cos_theta_o, &self.stack)
    }

    /// Samples an incident direction. Returns `None` when the directions fall
    /// below the hemisphere or no lobe carries energy.
    ///
    /// * `wo`     - Outgoing direction.
    /// * `n`      - Shading normal.
    /// * `u_lobe` - Uniform random value used to select a lobe.
    /// * `u`      - The 2D uniform random values used to sample the lobe.
    pub fn sample(
        &self,
        wo: &Vector3f,
        n: &Vector3f,
        u_lobe: Float,
        u: &Point2f,
    ) -> Option<BSDFSample> {
        let cos_theta_o = wo.dot(n);
        if cos_theta_o <= 0.0 {
            return None;
        }

        let lobes = self.lobes(cos_theta_o);
        let total_weight = lobes.total_weight();
        let lobe = lobes.select(u_lobe)?;

        let frame = Frame::from_normal(n);
        let wh = frame.to_world(&GGXDistribution::new(lobes[lobe].alpha).sample_wh(u));
        let wi = reflect(wo, &wh);
        let cos_theta_i = wi.dot(n);
        if cos_theta_i <= 0.0 {
            return None;
        }
        let cos_theta_h = wh.dot(n);

        // Balance heuristic over every lobe.
        let mut f = Spectrum::ZERO;
        let mut pdf = 0.0;
        for l in lobes.iter() {
            let distrib = GGXDistribution::new(l.alpha);
            let d = distrib.d(cos_theta_h) / (4.0 * cos_theta_o);
            if !l.coefficient.is_small() {
                f += l.coefficient * (d * distrib.g(cos_theta_o, cos_theta_i));
            }
            pdf += l.weight() / total_weight * d * distrib.g1(cos_theta_i);
        }

        if pdf > 0.0 {
            Some(BSDFSample::new(wi, f, pdf, lobe))
        } else {
            None
        }
    }

    /// Samples an incident direction drawing the random values from `rng`.
    ///
    /// * `wo`  - Outgoing direction.
    /// * `n`   - Shading normal.
    /// * `rng` - Source of uniform random values.
    pub fn sample_with<R: UniformSource>(
        &self,
        wo: &Vector3f,
        n: &Vector3f,
        rng: &mut R,
    ) -> Option<BSDFSample> {
        let u_lobe = rng.uniform_float();
        let u = rng.uniform_point2();
        self.sample(wo, n, u_lobe, &u)
    }

    /// Evaluates the BSDF for a pair of directions. Returns `None` when the
    /// directions fall below the hemisphere or no lobe contributes.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    /// * `n`  - Shading normal.
    pub fn eval(&self, wo: &Vector3f, wi: &Vector3f, n: &Vector3f) -> Option<BSDFEval> {
        let cos_theta_o = wo.dot(n);
        let cos_theta_i = wi.dot(n);
        if cos_theta_o <= 0.0 || cos_theta_i <= 0.0 {
            return None;
        }

        let wh = (*wo + *wi).normalize();
        let cos_theta_h = wh.dot(n);

        let mut f = Spectrum::ZERO;
        let mut pdf = 0.0;
        let mut total_weight = 0.0;
        for l in self.lobes(cos_theta_o).iter() {
            if l.coefficient.is_small() {
                continue;
            }
            let distrib = GGXDistribution::new(l.alpha);
            let d = distrib.d(cos_theta_h) / (4.0 * cos_theta_o);
            f += l.coefficient * (d * distrib.g(cos_theta_o, cos_theta_i));

            let w = l.weight();
            total_weight += w;
            pdf += w * d * distrib.g1(cos_theta_i);
        }

        if total_weight <= 0.0 {
            return None;
        }
        let pdf = pdf / total_weight;
        if pdf > 0.0 {
            Some(BSDFEval::new(f, pdf))
        } else {
            None
        }
    }

    /// Estimates the energy reflected towards `wo` by averaging the sample
    /// weights. Sampled values already include the incident cosine.
    ///
    /// * `wo`           - Outgoing direction.
    /// * `n`            - Shading normal.
    /// * `sample_count` - Number of samples.
    /// * `rng`          - Source of uniform random values.
    pub fn directional_albedo<R: UniformSource>(
        &self,
        wo: &Vector3f,
        n: &Vector3f,
        sample_count: usize,
        rng: &mut R,
    ) -> Spectrum {
        if sample_count == 0 {
            return Spectrum::ZERO;
        }

        let mut r = Spectrum::ZERO;
        for _ in 0..sample_count {
            if let Some(sample) = self.sample_with(wo, n, rng) {
                r += sample.weight;
            }
        }
        r / sample_count as Float
    }
}

impl fmt::Display for LayeredBSDF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayeredBSDF {{ layers: [")?;
        for (i, layer) in self.stack.layers().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", layer)?;
        }
        write!(f, "], tir: {} }}", self.tir.is_available())
    }
}
