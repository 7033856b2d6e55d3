// Tension bookkeeping before and after a correction is applied

use super::statistics::tension_sigma;
use crate::constants::TENSION_CONVERGED_SIGMA;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How much a correction moved a measurement toward its reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionReduction {
    pub initial_value: f64,
    pub final_value: f64,
    pub sigma: f64,
    pub reference_value: f64,
    pub reference_sigma: f64,
    pub initial_sigma: f64,
    pub final_sigma: f64,
    pub reduction_sigma: f64,
    pub reduction_percent: f64,
    /// final tension below 2σ
    pub converged: bool,
}

impl TensionReduction {
    /// Tension against `reference` before and after moving `initial` to `corrected`
    ///
    /// The measurement keeps its original uncertainty after correction.
    pub fn compute(
        initial: f64,
        corrected: f64,
        sigma: f64,
        reference: f64,
        reference_sigma: f64,
    ) -> Result<Self> {
        let before = tension_sigma(initial, sigma, reference, reference_sigma)?;
        let after = tension_sigma(corrected, sigma, reference, reference_sigma)?;
        let (reduction_sigma, reduction_percent, converged) = evaluate_reduction(before, after);

        Ok(Self {
            initial_value: initial,
            final_value: corrected,
            sigma,
            reference_value: reference,
            reference_sigma,
            initial_sigma: before,
            final_sigma: after,
            reduction_sigma,
            reduction_percent,
            converged,
        })
    }
}

/// Returns (absolute reduction, percent reduction, converged)
///
/// Percent reduction is 0 when there was no initial tension.
pub fn evaluate_reduction(initial_sigma: f64, final_sigma: f64) -> (f64, f64, bool) {
    let reduction = initial_sigma - final_sigma;
    let percent = if initial_sigma > 0.0 {
        reduction / initial_sigma * 100.0
    } else {
        0.0
    };
    (reduction, percent, final_sigma < TENSION_CONVERGED_SIGMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_reduction_half() {
        let (abs, pct, converged) = evaluate_reduction(3.0, 1.5);
        assert_eq!(abs, 1.5);
        assert_eq!(pct, 50.0);
        assert!(converged);
    }

    #[test]
    fn test_evaluate_reduction_zero_initial() {
        let (_, pct, converged) = evaluate_reduction(0.0, 0.0);
        assert_eq!(pct, 0.0);
        assert!(converged);
    }

    #[test]
    fn test_evaluate_reduction_increase_is_negative() {
        let (abs, pct, converged) = evaluate_reduction(1.0, 2.5);
        assert!(abs < 0.0 && pct < 0.0);
        assert!(!converged);
    }

    #[test]
    fn test_compute_kids_toward_planck() {
        let r = TensionReduction::compute(0.759, 0.759 + 0.030, 0.024, 0.834, 0.016).unwrap();
        assert!(r.final_sigma < r.initial_sigma);
        assert!(r.reduction_percent > 0.0);
        assert!(r.converged);
    }
}
