//! Training cost.
//!
//! The trainer keeps predictions and targets in neuron-major layout: a `(width, m)` block where
//! row `k` holds output neuron `k` for every example of the batch.
//!
//! The cost is the batch mean of the per-example half squared error:
//!
//! `C = (1/m) * Σ_examples Σ_outputs 0.5 * (ŷ - y)^2`
//!
//! so `dC/dŷ = (ŷ - y) / m`, which is the scaling the output delta uses.

use crate::activation::sigmoid_grad_from_output;

/// Half squared error of a single example.
#[inline]
pub fn half_squared_error(pred: &[f64], target: &[f64]) -> f64 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    let mut sum_sq = 0.0_f64;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    0.5 * sum_sq
}

/// Writes the output-layer delta `(ŷ - y) / m ⊙ σ'(ŷ)` into `delta` and returns the cost.
#[inline]
pub fn output_delta(pred: &[f64], target: &[f64], m: usize, delta: &mut [f64]) -> f64 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );
    assert_eq!(
        pred.len(),
        delta.len(),
        "pred len {} does not match delta len {}",
        pred.len(),
        delta.len()
    );
    if m == 0 {
        return 0.0;
    }

    let inv_m = 1.0 / m as f64;
    let mut sum_sq = 0.0_f64;
    for ((d, &p), &t) in delta.iter_mut().zip(pred).zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
        *d = diff * inv_m * sigmoid_grad_from_output(p);
    }
    0.5 * sum_sq * inv_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_is_zero_when_equal() {
        let pred = [0.1_f64, 0.7, 0.5, 0.9];
        let mut delta = [1.0_f64; 4];
        assert_eq!(half_squared_error(&pred, &pred), 0.0);
        assert_eq!(output_delta(&pred, &pred, 2, &mut delta), 0.0);
        assert_eq!(delta, [0.0; 4]);
    }

    #[test]
    fn cost_averages_over_examples_not_outputs() {
        // Two outputs, two examples (neuron-major).
        let pred = [1.0_f64, 3.0, 0.0, 0.0];
        let target = [2.0_f64, 1.0, 0.0, 0.0];
        let mut delta = [0.0_f64; 4];
        // Σ 0.5 * diff^2 = 0.5 * (1 + 4) = 2.5, averaged over m = 2.
        assert!((half_squared_error(&pred, &target) - 2.5).abs() < 1e-12);
        assert!((output_delta(&pred, &target, 2, &mut delta) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn empty_batch_costs_nothing() {
        let mut delta: [f64; 0] = [];
        assert_eq!(output_delta(&[], &[], 0, &mut delta), 0.0);
    }

    #[test]
    fn output_delta_matches_expected_gradient() {
        let pred = [0.5_f64, 0.8];
        let target = [1.0_f64, 0.0];
        let mut delta = [0.0_f64; 2];
        let cost = output_delta(&pred, &target, 2, &mut delta);

        assert!((cost - half_squared_error(&pred, &target) / 2.0).abs() < 1e-12);
        assert!((delta[0] - (-0.5 / 2.0 * 0.25)).abs() < 1e-12);
        assert!((delta[1] - (0.8 / 2.0 * 0.8 * 0.2)).abs() < 1e-12);
    }
}
