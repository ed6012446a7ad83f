//! Energy roofline model
//!
//! Total energy per operation is the sum of a fixed compute cost `e_p`, a
//! data-movement cost `e_m / x` that shrinks with operational intensity `x`,
//! and a background term `p_0 / t_s` paid regardless of intensity. Energy
//! efficiency is the reciprocal of that sum.
//!
//! The roofline envelope is the idealized bound `min(1 / e_p, x / e_m)`:
//! memory bound below the knee at `x = e_m / e_p`, compute bound above it.

use super::intensity::IntensityDomain;

/// The four scalars of the energy cost model
///
/// No validation happens here. Non-positive values produce infinite, NaN or
/// negative results; keeping them positive is the controller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyModel {
    /// Energy per operation (pJ / flop)
    pub energy_per_op: f64,
    /// Energy per byte moved (pJ / byte)
    pub energy_per_byte: f64,
    /// Idle/background power (pW)
    pub background_power: f64,
    /// Peak throughput (GFLOP/s)
    pub peak_throughput: f64,
}

impl EnergyModel {
    pub fn new(
        energy_per_op: f64,
        energy_per_byte: f64,
        background_power: f64,
        peak_throughput: f64,
    ) -> Self {
        Self {
            energy_per_op,
            energy_per_byte,
            background_power,
            peak_throughput,
        }
    }

    /// Intensity-independent energy share, `p_0 / t_s`
    pub fn background_energy(&self) -> f64 {
        self.background_power / self.peak_throughput
    }

    /// Compute-bound ceiling of the roofline, `1 / e_p`
    pub fn compute_ceiling(&self) -> f64 {
        1.0 / self.energy_per_op
    }

    /// Intensity where the memory and compute ceilings meet, `e_m / e_p`
    pub fn knee(&self) -> f64 {
        self.energy_per_byte / self.energy_per_op
    }

    /// Energy efficiency at intensity `x`
    pub fn efficiency_at(&self, x: f64) -> f64 {
        1.0 / (self.energy_per_op + self.energy_per_byte / x + self.background_energy())
    }

    /// Roofline envelope at intensity `x`
    pub fn roofline_at(&self, x: f64) -> f64 {
        self.compute_ceiling().min(x / self.energy_per_byte)
    }
}

/// Both derived curves, index-aligned with the domain they were evaluated on
#[derive(Debug, Clone, PartialEq)]
pub struct Curves {
    pub efficiency: Vec<f64>,
    pub roofline: Vec<f64>,
}

/// Evaluates both curves over every sample of `domain`
pub fn evaluate(model: &EnergyModel, domain: &IntensityDomain) -> Curves {
    let samples = domain.samples();
    Curves {
        efficiency: samples.iter().map(|&x| model.efficiency_at(x)).collect(),
        roofline: samples.iter().map(|&x| model.roofline_at(x)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn reference_model() -> EnergyModel {
        EnergyModel::new(1.0, 10.0, 200.0, 10.0)
    }

    #[test]
    fn reference_point_low_intensity() {
        let model = reference_model();
        assert_abs_diff_eq!(model.efficiency_at(1.0), 1.0 / 31.0, epsilon = 1e-12);
        assert_abs_diff_eq!(model.roofline_at(1.0), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn reference_point_high_intensity() {
        let model = reference_model();
        assert_abs_diff_eq!(model.efficiency_at(50.0), 1.0 / 21.2, epsilon = 1e-12);
        assert_abs_diff_eq!(model.efficiency_at(50.0), 0.0472, epsilon = 1e-4);
        assert_eq!(model.roofline_at(50.0), 1.0);
    }

    #[test]
    fn derived_quantities() {
        let model = reference_model();
        assert_eq!(model.background_energy(), 20.0);
        assert_eq!(model.compute_ceiling(), 1.0);
        assert_eq!(model.knee(), 10.0);
    }

    #[test]
    fn knee_joins_both_regimes() {
        let model = EnergyModel::new(4.0, 30.0, 100.0, 50.0);
        let knee = model.knee();
        assert_abs_diff_eq!(knee / model.energy_per_byte, model.compute_ceiling(), epsilon = 1e-12);
        assert_abs_diff_eq!(model.roofline_at(knee), model.compute_ceiling(), epsilon = 1e-12);
        assert_eq!(model.roofline_at(knee * 0.5), knee * 0.5 / model.energy_per_byte);
        assert_eq!(model.roofline_at(knee * 2.0), model.compute_ceiling());
    }

    #[test]
    fn evaluate_follows_domain_order() {
        let model = reference_model();
        let domain = IntensityDomain::linspace(1.0, 50.0, 50).unwrap();
        let curves = evaluate(&model, &domain);

        assert_eq!(curves.efficiency.len(), domain.samples().len());
        assert_eq!(curves.roofline.len(), domain.samples().len());
        for (i, &x) in domain.samples().iter().enumerate() {
            assert_eq!(curves.efficiency[i], model.efficiency_at(x));
            assert_eq!(curves.roofline[i], model.roofline_at(x));
        }
    }

    #[test]
    fn evaluation_is_bit_identical() {
        let model = reference_model();
        let domain = IntensityDomain::default();
        let first = evaluate(&model, &domain);
        let second = evaluate(&model, &domain);

        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.efficiency), bits(&second.efficiency));
        assert_eq!(bits(&first.roofline), bits(&second.roofline));
    }

    #[test]
    fn zero_throughput_is_not_finite() {
        let model = EnergyModel::new(1.0, 10.0, 200.0, 0.0);
        let value = model.efficiency_at(1.0);
        assert!(!value.is_finite() || value == 0.0);
    }

    fn positive_model() -> impl Strategy<Value = EnergyModel> {
        (0.01f64..100.0, 0.01f64..500.0, 0.01f64..2000.0, 0.01f64..2000.0)
            .prop_map(|(e_p, e_m, p_0, t_s)| EnergyModel::new(e_p, e_m, p_0, t_s))
    }

    proptest! {
        #[test]
        fn prop_efficiency_positive_and_finite(model in positive_model(), x in 1e-6f64..100.0) {
            let value = model.efficiency_at(x);
            prop_assert!(value > 0.0);
            prop_assert!(value.is_finite());
        }

        #[test]
        fn prop_roofline_bounded_by_ceiling(model in positive_model(), x in 1e-6f64..100.0) {
            prop_assert!(model.roofline_at(x) <= model.compute_ceiling());
        }

        #[test]
        fn prop_roofline_non_decreasing(model in positive_model()) {
            let curves = evaluate(&model, &IntensityDomain::default());
            prop_assert!(curves.roofline.windows(2).all(|pair| pair[0] <= pair[1]));
        }

        #[test]
        fn prop_roofline_regimes(model in positive_model(), fraction in 0.01f64..0.99) {
            let knee = model.knee();
            let below = knee * fraction;
            let above = knee / fraction;
            prop_assert_eq!(model.roofline_at(below), below / model.energy_per_byte);
            prop_assert_eq!(model.roofline_at(above), model.compute_ceiling());
        }

        #[test]
        fn prop_higher_op_energy_lowers_efficiency(
            model in positive_model(),
            bump in 0.1f64..10.0,
        ) {
            let heavier = EnergyModel { energy_per_op: model.energy_per_op + bump, ..model };
            let domain = IntensityDomain::default();
            let base = evaluate(&model, &domain);
            let worse = evaluate(&heavier, &domain);
            for (a, b) in base.efficiency.iter().zip(&worse.efficiency) {
                prop_assert!(b < a);
            }
        }

        #[test]
        fn prop_higher_throughput_raises_efficiency(
            model in positive_model(),
            factor in 1.5f64..10.0,
        ) {
            let faster = EnergyModel { peak_throughput: model.peak_throughput * factor, ..model };
            let domain = IntensityDomain::linspace(0.5, 50.0, 100).unwrap();
            let base = evaluate(&model, &domain);
            let better = evaluate(&faster, &domain);
            for (a, b) in base.efficiency.iter().zip(&better.efficiency) {
                prop_assert!(b > a);
            }
        }
    }
}
