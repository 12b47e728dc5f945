//! Time discounting for cost-effectiveness outputs
//!
//! The model runs on weekly timesteps while discount rates are annual, so
//! every formula divides the rate across 52 periods per year. Two modes are
//! supported: continuous compounding and discrete (per-week) compounding.
//! Both apply a scalar factor of `2 - c` where `c` is the classic
//! present-value constant; the factor is exactly 1 at rate zero and the two
//! modes agree in the small-rate limit.

use crate::tensor::Tensor;

/// Weekly timesteps per model year, as used by all discount formulas
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Scalar discount factor for a given annual rate and elapsed periods
pub fn discount_factor(rate: f64, periods: usize, discrete: bool) -> f64 {
    let base = if discrete {
        (1.0 + rate / WEEKS_PER_YEAR).powi(-(periods as i32))
    } else {
        (-rate * periods as f64 / WEEKS_PER_YEAR).exp()
    };
    2.0 - base
}

/// Apply the discount factor elementwise; pure, input is untouched
pub fn calculate_discount(data: &Tensor, rate: f64, periods: usize, discrete: bool) -> Tensor {
    data * discount_factor(rate, periods, discrete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{self, Shape};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_rate_is_identity_in_both_modes() {
        for periods in [0, 1, 52, 520] {
            assert_abs_diff_eq!(discount_factor(0.0, periods, false), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(discount_factor(0.0, periods, true), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_continuous_reference_value() {
        assert_abs_diff_eq!(discount_factor(0.8, 1, false), 1.015266876, epsilon = 1e-6);
    }

    #[test]
    fn test_discrete_reference_value() {
        assert_abs_diff_eq!(discount_factor(1.0, 1, true), 1.018867924, epsilon = 1e-6);
    }

    #[test]
    fn test_modes_diverge_with_periods() {
        let rate = 0.05;
        let gap_short = (discount_factor(rate, 1, true) - discount_factor(rate, 1, false)).abs();
        let gap_long = (discount_factor(rate, 520, true) - discount_factor(rate, 520, false)).abs();
        assert!(gap_long > gap_short);
    }

    #[test]
    fn test_tensor_discount_is_pure() {
        let data = tensor::constant(Shape::new(1, 2, 1), 2.0);
        let discounted = calculate_discount(&data, 0.8, 1, false);
        assert_abs_diff_eq!(discounted[(0, 0, 0)], 2.0 * 1.015266876, epsilon = 1e-6);
        assert_abs_diff_eq!(data[(0, 1, 0)], 2.0, epsilon = 1e-12);
    }
}
