// Pairwise tension, weighted combination and chi-squared statistics
//
// p-values come from statrs' chi-squared CDF rather than a hand-rolled
// incomplete gamma function.

use crate::error::{ensure_sigma, AnalysisError, Result, ValidationError};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// A single measurement with its 1σ uncertainty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub label: String,
    pub value: f64,
    pub sigma: f64,
}

impl Measurement {
    pub fn new(label: impl Into<String>, value: f64, sigma: f64) -> Result<Self> {
        let label = label.into();
        ensure_sigma(&label, sigma)?;
        if !value.is_finite() {
            return Err(ValidationError::ParameterOutOfRange {
                name: "measurement value",
                value,
                range: "finite",
            }
            .into());
        }
        Ok(Self {
            label,
            value,
            sigma,
        })
    }

    /// Tension against another measurement, in sigma
    pub fn tension_with(&self, other: &Measurement) -> Result<f64> {
        tension_sigma(self.value, self.sigma, other.value, other.sigma)
    }
}

/// Inverse-variance weighted mean of N measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCombination {
    pub mean: f64,
    pub sigma: f64,
    pub total_weight: f64,
    pub n: usize,
}

/// Combined mean plus goodness of fit of the inputs around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyTest {
    pub combination: WeightedCombination,
    pub chi2: f64,
    /// N - 1; `None` for a single measurement
    pub dof: Option<usize>,
    pub chi2_per_dof: Option<f64>,
    /// P(χ² ≥ observed); `None` when dof is undefined
    pub p_value: Option<f64>,
    pub labels: Vec<String>,
}

/// |v1 - v2| / sqrt(s1² + s2²)
///
/// # Example
/// ```
/// use concordia::tension::tension_sigma;
///
/// // DES-Y3 against Planck
/// let t = tension_sigma(0.776, 0.017, 0.834, 0.016).unwrap();
/// assert!((t - 2.48).abs() < 0.01);
/// ```
pub fn tension_sigma(v1: f64, s1: f64, v2: f64, s2: f64) -> Result<f64> {
    ensure_sigma("first measurement", s1)?;
    ensure_sigma("second measurement", s2)?;
    Ok((v1 - v2).abs() / (s1 * s1 + s2 * s2).sqrt())
}

fn validate_all(measurements: &[Measurement]) -> Result<()> {
    if measurements.is_empty() {
        return Err(ValidationError::InsufficientData {
            what: "weighted combination",
            required: 1,
            actual: 0,
        }
        .into());
    }
    for m in measurements {
        ensure_sigma(&m.label, m.sigma)?;
    }
    Ok(())
}

/// mean = Σ(vᵢ/σᵢ²)/Σ(1/σᵢ²), sigma = 1/sqrt(Σ(1/σᵢ²))
pub fn weighted_combination(measurements: &[Measurement]) -> Result<WeightedCombination> {
    validate_all(measurements)?;

    let total_weight: f64 = measurements.iter().map(|m| m.sigma.powi(-2)).sum();
    let weighted_sum: f64 = measurements.iter().map(|m| m.value * m.sigma.powi(-2)).sum();

    Ok(WeightedCombination {
        mean: weighted_sum / total_weight,
        sigma: total_weight.sqrt().recip(),
        total_weight,
        n: measurements.len(),
    })
}

/// Σ((vᵢ - mean)/σᵢ)²
pub fn chi_squared(measurements: &[Measurement], mean: f64) -> Result<f64> {
    validate_all(measurements)?;
    Ok(measurements
        .iter()
        .map(|m| ((m.value - mean) / m.sigma).powi(2))
        .sum())
}

/// Upper-tail probability of the chi-squared distribution
pub fn p_value(chi2: f64, dof: usize) -> Result<f64> {
    if dof == 0 {
        return Err(ValidationError::InsufficientData {
            what: "p-value degrees of freedom",
            required: 1,
            actual: 0,
        }
        .into());
    }
    let dist =
        ChiSquared::new(dof as f64).map_err(|e| AnalysisError::Statistics(e.to_string()))?;
    Ok((1.0 - dist.cdf(chi2.max(0.0))).clamp(0.0, 1.0))
}

/// Combine, then test how well the inputs scatter around the combination
///
/// A single measurement is its own combination: χ² = 0 and dof is undefined.
pub fn consistency_test(measurements: &[Measurement]) -> Result<ConsistencyTest> {
    let combination = weighted_combination(measurements)?;
    let chi2 = chi_squared(measurements, combination.mean)?;
    let labels = measurements.iter().map(|m| m.label.clone()).collect();

    let (dof, chi2_per_dof, p) = match measurements.len() {
        1 => (None, None, None),
        n => {
            let dof = n - 1;
            (
                Some(dof),
                Some(chi2 / dof as f64),
                Some(p_value(chi2, dof)?),
            )
        }
    };

    tracing::debug!(
        n = measurements.len(),
        mean = combination.mean,
        chi2,
        "consistency test"
    );

    Ok(ConsistencyTest {
        combination,
        chi2,
        dof,
        chi2_per_dof,
        p_value: p,
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(label: &str, value: f64, sigma: f64) -> Measurement {
        Measurement::new(label, value, sigma).unwrap()
    }

    #[test]
    fn test_tension_des_vs_planck() {
        let t = tension_sigma(0.776, 0.017, 0.834, 0.016).unwrap();
        assert!((t - 2.49).abs() < 0.01, "tension = {}", t);
    }

    #[test]
    fn test_tension_identical_is_zero() {
        assert_eq!(tension_sigma(0.8, 0.02, 0.8, 0.02).unwrap(), 0.0);
    }

    #[test]
    fn test_tension_is_symmetric() {
        let a = tension_sigma(73.04, 1.04, 67.36, 0.54).unwrap();
        let b = tension_sigma(67.36, 0.54, 73.04, 1.04).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tension_rejects_zero_sigma() {
        assert!(tension_sigma(0.8, 0.0, 0.8, 0.02).is_err());
        assert!(tension_sigma(0.8, 0.02, 0.8, -1.0).is_err());
    }

    #[test]
    fn test_measurement_rejects_bad_sigma() {
        assert!(Measurement::new("x", 1.0, 0.0).is_err());
        assert!(Measurement::new("x", f64::NAN, 0.1).is_err());
    }

    #[test]
    fn test_weighted_mean_identical_inputs() {
        let inputs = vec![m("a", 0.79, 0.02), m("b", 0.79, 0.02), m("c", 0.79, 0.02)];
        let combo = weighted_combination(&inputs).unwrap();
        assert!((combo.mean - 0.79).abs() < 1e-12);
        assert!((combo.sigma - 0.02 / 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_mean_favours_precise_measurement() {
        let inputs = vec![m("precise", 67.36, 0.54), m("loose", 73.04, 1.04)];
        let combo = weighted_combination(&inputs).unwrap();
        assert!(combo.mean < (67.36 + 73.04) / 2.0);
        assert!(combo.sigma < 0.54);
    }

    #[test]
    fn test_weighted_combination_empty_is_error() {
        assert!(weighted_combination(&[]).is_err());
    }

    #[test]
    fn test_chi_squared_known_value() {
        let inputs = vec![m("a", 1.0, 1.0), m("b", 3.0, 1.0)];
        assert_eq!(chi_squared(&inputs, 2.0).unwrap(), 2.0);
    }

    #[test]
    fn test_p_value_reference_points() {
        // χ² = dof has p ≈ 0.32 for dof = 1 and ≈ 0.37 for dof = 2
        assert!((p_value(1.0, 1).unwrap() - 0.3173).abs() < 1e-3);
        assert!((p_value(2.0, 2).unwrap() - (-1.0f64).exp()).abs() < 1e-6);
        assert!((p_value(0.0, 3).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_p_value_zero_dof_is_error() {
        assert!(p_value(1.0, 0).is_err());
    }

    #[test]
    fn test_consistency_single_measurement() {
        let result = consistency_test(&[m("only", 0.8, 0.02)]).unwrap();
        assert_eq!(result.chi2, 0.0);
        assert_eq!(result.dof, None);
        assert_eq!(result.p_value, None);
        assert_eq!(result.combination.mean, 0.8);
    }

    #[test]
    fn test_consistency_hubble_tension_has_small_p_value() {
        let result =
            consistency_test(&[m("Planck", 67.36, 0.54), m("SH0ES", 73.04, 1.04)]).unwrap();
        assert_eq!(result.dof, Some(1));
        // Two measurements: χ² equals the squared pairwise tension
        let t = tension_sigma(67.36, 0.54, 73.04, 1.04).unwrap();
        assert!((result.chi2 - t * t).abs() < 1e-9);
        assert!(result.p_value.unwrap() < 1e-5);
    }
}
