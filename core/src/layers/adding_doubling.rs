//! Adding-Doubling Solver

use super::layer::*;
use super::variance::*;
use crate::pbrt::*;
use crate::reflection::*;
use crate::spectrum::*;

/// Energy and roughness of the light reflected by one layer of the stack.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Lobe {
    /// Reflected energy.
    pub coefficient: Spectrum,

    /// Roughness of the reflected lobe.
    pub alpha: Float,
}

impl Lobe {
    /// Returns the scalar weight used for lobe selection.
    pub fn weight(&self) -> Float {
        self.coefficient.average()
    }
}

/// Lobes emitted by the solver, one per processed layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lobes {
    lobes: Vec<Lobe>,
}

impl Lobes {
    /// Returns the number of processed layers.
    pub fn len(&self) -> usize {
        self.lobes.len()
    }

    /// Returns true if no layer was processed.
    pub fn is_empty(&self) -> bool {
        self.lobes.is_empty()
    }

    /// Returns an iterator over the lobes from top to bottom.
    pub fn iter(&self) -> std::slice::Iter<'_, Lobe> {
        self.lobes.iter()
    }

    /// Returns the lobes from top to bottom.
    pub fn as_slice(&self) -> &[Lobe] {
        &self.lobes
    }

    /// Returns the selection weight of every lobe.
    pub fn weights(&self) -> Vec<Float> {
        self.lobes.iter().map(Lobe::weight).collect()
    }

    /// Returns the sum of the selection weights.
    pub fn total_weight(&self) -> Float {
        self.lobes.iter().map(Lobe::weight).sum()
    }

    /// Select a lobe with probability proportional to its weight by inverting
    /// the cumulative weights. Returns `None` when no lobe carries weight.
    ///
    /// * `u` - Uniform random value in [0, 1).
    pub fn select(&self, u: Float) -> Option<usize> {
        let total = self.total_weight();
        if total.is_nan() || total <= 0.0 {
            return None;
        }

        let target = u * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (i, lobe) in self.lobes.iter().enumerate() {
            let w = lobe.weight();
            if w <= 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = Some(i);
            if target < cumulative {
                return Some(i);
            }
        }

        // Rounding may leave `target` at the total.
        last_positive
    }
}

impl std::ops::Index<usize> for Lobes {
    type Output = Lobe;

    fn index(&self, i: usize) -> &Self::Output {
        &self.lobes[i]
    }
}

impl<'a> IntoIterator for &'a Lobes {
    type Item = &'a Lobe;
    type IntoIter = std::slice::Iter<'a, Lobe>;

    fn into_iter(self) -> Self::IntoIter {
        self.lobes.iter()
    }
}

/// Energy, variance and jacobians accumulated over the layers processed so
/// far.
#[derive(Copy, Clone, Debug)]
struct TransportState {
    /// Reflectance seen from above.
    r_0i: Spectrum,

    /// Transmittance from the top down to the current depth.
    t_0i: Spectrum,

    /// Reflectance seen from below.
    r_i0: Spectrum,

    /// Transmittance from the current depth up to the top.
    t_i0: Spectrum,

    s_r0i: Float,
    s_t0i: Float,
    s_ri0: Float,
    s_ti0: Float,

    /// Solid angle compression downwards.
    j_0i: Float,

    /// Solid angle compression upwards.
    j_i0: Float,

    /// Cosine of the propagation direction.
    cos_theta: Float,
}

impl TransportState {
    fn new(cos_theta: Float) -> Self {
        Self {
            r_0i: Spectrum::ZERO,
            t_0i: Spectrum::ONE,
            r_i0: Spectrum::ZERO,
            t_i0: Spectrum::ONE,
            s_r0i: 0.0,
            s_t0i: 0.0,
            s_ri0: 0.0,
            s_ti0: 0.0,
            j_0i: 1.0,
            j_i0: 1.0,
            cos_theta,
        }
    }
}

/// Reflectance, transmittance and variances of a single layer in both
/// directions.
#[derive(Copy, Clone, Debug)]
struct InterfaceTerms {
    r12: Spectrum,
    t12: Spectrum,
    r21: Spectrum,
    t21: Spectrum,
    s_r12: Float,
    s_r21: Float,
    s_t12: Float,
    s_t21: Float,
    j12: Float,
    j21: Float,

    /// Cosine of the propagation direction below the layer. Negative when
    /// nothing is transmitted.
    cos_theta_t: Float,
}

impl InterfaceTerms {
    /// Attenuation through a participating slab.
    ///
    /// * `layer`     - The slab.
    /// * `cos_theta` - Cosine of the propagation direction.
    fn volume(layer: &Layer, cos_theta: Float) -> Self {
        let tau = layer.depth / cos_theta;
        let sigma_t = layer.sigma_a + layer.sigma_s;
        let t = (Spectrum::ONE + layer.sigma_s * tau) * (-(sigma_t * tau)).exp();
        Self {
            r12: Spectrum::ZERO,
            t12: t,
            r21: Spectrum::ZERO,
            t21: t,
            s_r12: 0.0,
            s_r21: 0.0,
            s_t12: layer.alpha,
            s_t21: layer.alpha,
            j12: 1.0,
            j21: 1.0,
            cos_theta_t: cos_theta,
        }
    }
}

/// Evaluates the energy and roughness reflected by each layer of a stack with
/// the adding-doubling method.
///
/// The solver holds no mutable state and can be shared between threads.
#[derive(Copy, Clone, Debug)]
pub struct AddingDoubling<'a> {
    tir: &'a TIRLookup,
}

impl<'a> AddingDoubling<'a> {
    /// Create a new solver.
    ///
    /// * `tir` - Total internal reflection table. When unavailable the
    ///           correction is skipped.
    pub fn new(tir: &'a TIRLookup) -> Self {
        Self { tir }
    }

    /// Returns one lobe per processed layer. Processing stops after the first
    /// conductor.
    ///
    /// * `cos_theta_i` - Cosine of the incident direction.
    /// * `stack`       - The layers.
    pub fn solve(&self, cos_theta_i: Float, stack: &LayerStack) -> Lobes {
        let mut state = TransportState::new(cos_theta_i);
        let mut lobes = Vec::with_capacity(stack.len());

        for (i, layer) in stack.layers().iter().enumerate() {
            let eta_1 = stack.eta_above(i);
            let eta = layer.eta / eta_1;
            let kappa = layer.kappa / eta_1;

            let terms = if layer.is_volumetric() {
                InterfaceTerms::volume(layer, state.cos_theta)
            } else {
                self.interface(&mut state, stack, i, layer, eta, kappa)
            };

            lobes.push(add_layer(&mut state, &terms));

            if kappa > 0.0 {
                break;
            }
        }

        Lobes { lobes }
    }

    /// Evaluates a sharp interface and applies the total internal reflection
    /// correction to the light travelling back up through the layers above.
    fn interface(
        &self,
        state: &mut TransportState,
        stack: &LayerStack,
        i: usize,
        layer: &Layer,
        eta: Float,
        kappa: Float,
    ) -> InterfaceTerms {
        let cos_theta_i = state.cos_theta;

        // Snell's law; a negative cosine flags total internal reflection.
        let sin_theta_i = max(0.0, 1.0 - cos_theta_i * cos_theta_i).sqrt();
        let sin_theta_t = sin_theta_i / eta;
        let cos_theta_t = if sin_theta_t <= 1.0 {
            (1.0 - sin_theta_t * sin_theta_t).sqrt()
        } else {
            -1.0
        };

        let transmissive = cos_theta_t > 0.0 && kappa == 0.0;

        let s_r12 = roughness_to_variance(layer.alpha);
        let (s_t12, s_t21, j12, j21) = if transmissive {
            (
                roughness_to_variance(layer.alpha * 0.5 * abs(eta - 1.0) / eta),
                roughness_to_variance(layer.alpha * 0.5 * abs(1.0 - eta)),
                (cos_theta_t / cos_theta_i) * eta,
                (cos_theta_i / cos_theta_t) / eta,
            )
        } else {
            (0.0, 0.0, 1.0, 1.0)
        };

        // Roughness blurred by the transmission through the layers above.
        let alpha = variance_to_roughness(state.s_t0i + s_r12);

        let (r12, t12) = eval_fresnel(cos_theta_i, layer.albedo, eta, kappa);
        let (t12, r21, t21) = if transmissive {
            (t12, r12, t12)
        } else {
            (Spectrum::ZERO, Spectrum::ZERO, Spectrum::ZERO)
        };

        if i > 0 {
            let n10 = stack.eta_above(i - 1) / stack.eta_above(i);
            if let Some(tir) = self.tir.query(cos_theta_i, alpha, n10) {
                state.r_i0 = (state.r_i0 + state.t_i0 * (1.0 - tir)).clamp(0.0, 1.0);
                state.t_i0 *= tir;
            }
        }

        InterfaceTerms {
            r12,
            t12,
            r21,
            t21,
            s_r12,
            s_r21: s_r12,
            s_t12,
            s_t21,
            j12,
            j21,
            cos_theta_t,
        }
    }
}

/// Merges a layer into the accumulated state with the adding equations and
/// returns the lobe reflected by that layer.
///
/// * `state` - Accumulated state of the layers above; updated in place.
/// * `terms` - The layer.
fn add_layer(state: &mut TransportState, terms: &InterfaceTerms) -> Lobe {
    let InterfaceTerms {
        r12,
        t12,
        r21,
        t21,
        s_r12,
        s_r21,
        s_t12,
        s_t21,
        j12,
        j21,
        cos_theta_t,
    } = *terms;

    // Closed form of the interreflections between the stack above and the
    // layer.
    let denom = Spectrum::ONE - state.r_i0 * r12;
    let (m_r0i, m_ri0, m_rr, t_0i, t_i0) = if denom.average() <= 0.0 {
        (
            Spectrum::ZERO,
            Spectrum::ZERO,
            Spectrum::ZERO,
            Spectrum::ZERO,
            Spectrum::ZERO,
        )
    } else {
        (
            state.t_0i * r12 * state.t_i0 / denom,
            t21 * state.r_i0 * t12 / denom,
            state.r_i0 * r12 / denom,
            state.t_0i * t12 / denom,
            t21 * state.t_i0 / denom,
        )
    };
    let r_0i = state.r_0i + m_r0i;
    let r_i0 = r21 + m_ri0;

    // Variances follow the averaged energies.
    let e_r0i = r_0i.average();
    let e_ri0 = r_i0.average();
    let m_r0i_avg = m_r0i.average();
    let m_ri0_avg = m_ri0.average();
    let m_rr = m_rr.average();

    let TransportState {
        s_r0i,
        s_t0i,
        s_ri0,
        s_ti0,
        j_0i,
        j_i0,
        ..
    } = *state;

    let s_bounce = s_r12 + m_rr * (s_r12 + s_ri0);
    let s_reflected = s_ti0 + j_0i * (s_t0i + s_bounce);

    let new_s_r0i = state.r_0i.average() * s_r0i + m_r0i_avg * s_reflected;
    let new_s_t0i = j12 * s_t0i + s_t12 + j12 * (s_r12 + s_ri0) * m_rr;
    let new_s_ri0 = r21.average() * s_r21
        + m_ri0_avg * (s_t12 + j12 * (s_t21 + s_ri0 + m_rr * (s_r12 + s_ri0)));
    let new_s_ti0 = j_i0 * s_t21 + s_ti0 + j_i0 * (s_r12 + s_ri0) * m_rr;

    let lobe = if m_r0i_avg > 0.0 {
        Lobe {
            coefficient: m_r0i,
            alpha: variance_to_roughness(s_reflected),
        }
    } else {
        Lobe::default()
    };

    *state = TransportState {
        r_0i,
        t_0i,
        r_i0,
        t_i0,
        s_r0i: if e_r0i > 0.0 { new_s_r0i / e_r0i } else { 0.0 },
        s_t0i: new_s_t0i,
        s_ri0: if e_ri0 > 0.0 { new_s_ri0 / e_ri0 } else { 0.0 },
        s_ti0: new_s_ti0,
        j_0i: j_0i * j12,
        j_i0: j_i0 * j21,
        cos_theta: cos_theta_t,
    };

    lobe
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    fn stack(layers: &[Layer]) -> LayerStack {
        LayerStack::from_layers(layers.iter().cloned()).unwrap()
    }

    fn constant_tir(value: Float) -> TIRLookup {
        let ranges = [(0.0, 1.0), (0.0, 1.0), (0.0, 4.0)];
        TIRLookup::from(TIRTable::new([2, 2, 2], ranges, vec![value; 8]).unwrap())
    }

    fn assert_lobes_close(a: &Lobes, b: &Lobes, epsilon: Float) {
        assert_eq!(a.len(), b.len());
        for (la, lb) in a.iter().zip(b) {
            for c in 0..RGB_SAMPLES {
                assert!(
                    approx_eq!(Float, la.coefficient[c], lb.coefficient[c], epsilon = epsilon),
                    "{:?} != {:?}",
                    la,
                    lb
                );
            }
            assert!(approx_eq!(Float, la.alpha, lb.alpha, epsilon = epsilon));
        }
    }

    #[test]
    fn empty_stack_has_no_lobes() {
        let tir = TIRLookup::Unavailable;
        let lobes = AddingDoubling::new(&tir).solve(0.7, &LayerStack::new());
        assert!(lobes.is_empty());
        assert_eq!(lobes.total_weight(), 0.0);
        assert_eq!(lobes.select(0.5), None);
    }

    #[test]
    fn single_dielectric_reflects_fresnel() {
        let tir = TIRLookup::Unavailable;
        let solver = AddingDoubling::new(&tir);
        let layers = stack(&[Layer::dielectric(1.5, 0.1)]);
        for i in 1..=20 {
            let cos_theta = i as Float / 20.0;
            let lobes = solver.solve(cos_theta, &layers);
            assert_eq!(lobes.len(), 1);

            let f = fr_dielectric(cos_theta, 1.5);
            for c in 0..RGB_SAMPLES {
                assert!(approx_eq!(Float, lobes[0].coefficient[c], f, epsilon = 1e-6));
            }
            assert!(approx_eq!(Float, lobes[0].alpha, 0.1, epsilon = 1e-4));
        }
    }

    #[test]
    fn single_conductor_reflects_tinted_fresnel() {
        let tir = TIRLookup::Unavailable;
        let albedo = Spectrum::from_rgb(0.9, 0.8, 0.7);
        let layers = stack(&[Layer::conductor(albedo, 0.5, 3.0, 0.2)]);
        let lobes = AddingDoubling::new(&tir).solve(0.6, &layers);
        assert_eq!(lobes.len(), 1);

        let f = fr_conductor(0.6, 0.5, 3.0);
        for c in 0..RGB_SAMPLES {
            assert!(approx_eq!(
                Float,
                lobes[0].coefficient[c],
                albedo[c] * f,
                epsilon = 1e-6
            ));
        }
    }

    #[test]
    fn conductor_stops_the_stack() {
        let tir = constant_tir(0.8);
        let solver = AddingDoubling::new(&tir);
        let top = Layer::dielectric(1.5, 0.2);
        let metal = Layer::conductor(Spectrum::from_rgb(1.0, 0.7, 0.7), 0.5, 3.0, 0.3);

        let a = solver.solve(0.8, &stack(&[top, metal, Layer::dielectric(1.2, 0.05)]));
        let b = solver.solve(0.8, &stack(&[top, metal, Layer::dielectric(2.4, 0.9)]));
        let c = solver.solve(
            0.8,
            &stack(&[top, metal, Layer::volumetric(Spectrum::ONE, 3.0, 0.2, 0.5)]),
        );
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn zero_depth_volume_is_transparent() {
        let tir = TIRLookup::Unavailable;
        let solver = AddingDoubling::new(&tir);
        let top = Layer::dielectric(1.5, 0.2);
        let metal = Layer::conductor(Spectrum::ONE, 0.2, 3.0, 0.4);
        let clear = Layer::volumetric(Spectrum::new(0.5), 0.0, 0.7, 1.5);

        for cos_theta in [0.2, 0.5, 0.9, 1.0] {
            let with = solver.solve(cos_theta, &stack(&[top, clear, metal]));
            let without = solver.solve(cos_theta, &stack(&[top, metal]));
            assert_eq!(with.len(), 3);
            assert!(with[1].coefficient.average() < 1e-6);

            let merged = Lobes {
                lobes: vec![with[0], with[2]],
            };
            assert_lobes_close(&merged, &without, 1e-4);
        }
    }

    #[test]
    fn volume_attenuates_layers_below() {
        let tir = TIRLookup::Unavailable;
        let solver = AddingDoubling::new(&tir);
        let top = Layer::dielectric(1.5, 0.2);
        let metal = Layer::conductor(Spectrum::ONE, 0.2, 3.0, 0.4);
        let volume = Layer::volumetric(Spectrum::from_rgb(0.2, 0.5, 0.9), 0.5, 0.7, 1.5);

        let with = solver.solve(0.7, &stack(&[top, volume, metal]));
        let without = solver.solve(0.7, &stack(&[top, metal]));
        assert_eq!(with.len(), 3);
        assert_eq!(with[1], Lobe::default());
        for c in 0..RGB_SAMPLES {
            assert!(with[2].coefficient[c] < without[1].coefficient[c]);
        }
        // Scattering in the slab widens the lobe below it.
        assert!(with[2].alpha > without[1].alpha);
    }

    #[test]
    fn full_tir_transmission_matches_missing_table() {
        let layers = stack(&[Layer::dielectric(1.5, 0.3), Layer::dielectric(1.2, 0.1)]);
        let none = TIRLookup::Unavailable;
        let ones = constant_tir(1.0);
        let zeros = constant_tir(0.0);

        let reference = AddingDoubling::new(&none).solve(0.6, &layers);
        let transmitted = AddingDoubling::new(&ones).solve(0.6, &layers);
        let reflected = AddingDoubling::new(&zeros).solve(0.6, &layers);

        assert_lobes_close(&reference, &transmitted, 1e-6);
        assert!(reflected[1].coefficient.average() < reference[1].coefficient.average());
    }

    #[test]
    fn degenerate_denominator_zeroes_merged_terms() {
        let mut state = TransportState::new(0.5);
        state.r_i0 = Spectrum::ONE;
        state.t_0i = Spectrum::new(0.6);
        state.t_i0 = Spectrum::new(0.6);
        let terms = InterfaceTerms {
            r12: Spectrum::ONE,
            t12: Spectrum::new(0.3),
            r21: Spectrum::new(0.2),
            t21: Spectrum::new(0.3),
            s_r12: 0.1,
            s_r21: 0.1,
            s_t12: 0.05,
            s_t21: 0.05,
            j12: 1.0,
            j21: 1.0,
            cos_theta_t: 0.4,
        };

        let lobe = add_layer(&mut state, &terms);
        assert_eq!(lobe, Lobe::default());
        assert_eq!(state.t_0i, Spectrum::ZERO);
        assert_eq!(state.t_i0, Spectrum::ZERO);
        assert_eq!(state.r_i0, Spectrum::new(0.2));
        assert!(!state.s_r0i.is_nan() && !state.s_ri0.is_nan());
    }

    #[test]
    fn trapped_light_between_total_reflectors_contributes_nothing() {
        // The empty table turns all light travelling up into reflection, and
        // the layer below totally reflects from the glass side.
        let tir = constant_tir(0.0);
        let layers = stack(&[
            Layer::dielectric(1.5, 0.2),
            Layer::dielectric(0.5, 0.1),
            Layer::conductor(Spectrum::ONE, 0.2, 3.0, 0.3),
        ]);
        let lobes = AddingDoubling::new(&tir).solve(0.5, &layers);

        assert_eq!(lobes.len(), 3);
        assert!(lobes[0].coefficient.average() > 0.0);
        assert_eq!(lobes[1], Lobe::default());
        assert_eq!(lobes[2], Lobe::default());
        for lobe in &lobes {
            assert!(!lobe.alpha.is_nan());
        }
    }

    #[test]
    fn select_inverts_cumulative_weights() {
        let lobes = Lobes {
            lobes: vec![
                Lobe {
                    coefficient: Spectrum::new(0.25),
                    alpha: 0.1,
                },
                Lobe::default(),
                Lobe {
                    coefficient: Spectrum::new(0.75),
                    alpha: 0.3,
                },
            ],
        };
        assert_eq!(lobes.weights(), vec![0.25, 0.0, 0.75]);
        assert_eq!(lobes.select(0.0), Some(0));
        assert_eq!(lobes.select(0.2), Some(0));
        assert_eq!(lobes.select(0.25), Some(2));
        assert_eq!(lobes.select(0.9), Some(2));
        assert_eq!(lobes.select(1.0), Some(2));
    }

    proptest! {
        #[test]
        fn single_dielectric_conserves_energy(
            cos_theta in 0.01..=1.0f32,
            eta in 1.0..3.0f32,
            alpha in 0.0..1.0f32,
            r in 0.0..=1.0f32, g in 0.0..=1.0f32, b in 0.0..=1.0f32,
        ) {
            let tir = TIRLookup::Unavailable;
            let layer = Layer::interface(Spectrum::from_rgb(r, g, b), eta, 0.0, alpha);
            let lobes = AddingDoubling::new(&tir).solve(cos_theta, &stack(&[layer]));
            for c in 0..RGB_SAMPLES {
                prop_assert!(lobes[0].coefficient[c] <= 1.0);
                prop_assert!(lobes[0].coefficient[c] >= 0.0);
            }
        }

        #[test]
        fn coated_conductor_conserves_energy(
            cos_theta in 0.01..=1.0f32,
            eta in 1.0..2.5f32,
            alpha_top in 0.0..1.0f32,
            alpha_bottom in 0.0..1.0f32,
            kappa in 0.1..5.0f32,
        ) {
            let tir = TIRLookup::Unavailable;
            let layers = stack(&[
                Layer::dielectric(eta, alpha_top),
                Layer::conductor(Spectrum::ONE, 0.5, kappa, alpha_bottom),
            ]);
            let lobes = AddingDoubling::new(&tir).solve(cos_theta, &layers);
            prop_assert_eq!(lobes.len(), 2);
            let total = lobes.iter().fold(Spectrum::ZERO, |acc, l| acc + l.coefficient);
            for c in 0..RGB_SAMPLES {
                prop_assert!(total[c] <= 1.0 + 1e-4);
            }
        }

        #[test]
        fn lobe_roughness_is_bounded(
            cos_theta in 0.05..=1.0f32,
            alpha_top in 0.0..1.0f32,
            alpha_bottom in 0.0..1.0f32,
        ) {
            let tir = TIRLookup::Unavailable;
            let layers = stack(&[
                Layer::dielectric(1.5, alpha_top),
                Layer::conductor(Spectrum::ONE, 0.2, 3.0, alpha_bottom),
            ]);
            for lobe in &AddingDoubling::new(&tir).solve(cos_theta, &layers) {
                prop_assert!(lobe.alpha >= 0.0 && lobe.alpha <= 1.0);
            }
        }
    }
}
