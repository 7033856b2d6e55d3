//! Redshift-dependent correction model ΔX(z) = A·(1+z)^β
//!
//! The model is a pure function of redshift: nothing is cached, every call
//! recomputes from the two parameters.

use crate::constants::{REDSHIFT_SCALING_EXPONENT, UNIVERSAL_BASELINE};
use crate::error::{ensure_redshift, ValidationError};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

type Result<T> = std::result::Result<T, ValidationError>;

/// Parameters of ΔX(z) = baseline × (1+z)^exponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionModel {
    /// Amplitude A at z = 0
    pub baseline: f64,
    /// Scaling exponent β
    pub exponent: f64,
}

/// Corrections applied bin by bin to one initial value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinCorrections {
    pub z_effective: Vec<f64>,
    pub corrections: Vec<f64>,
    pub corrected_per_bin: Vec<f64>,
    pub corrected_mean: f64,
    pub mean_correction: f64,
    pub baseline: f64,
}

/// Baseline recovered from observed (z, correction) pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineFit {
    /// Mean of the implied per-bin baselines
    pub baseline: f64,
    /// Population standard deviation of the implied baselines
    pub baseline_std: f64,
    /// RMS of corrections minus baseline·(1+z)^β
    pub rms_residual: f64,
    pub n_bins: usize,
    pub per_bin_baselines: Vec<f64>,
}

impl Default for CorrectionModel {
    fn default() -> Self {
        Self {
            baseline: UNIVERSAL_BASELINE,
            exponent: REDSHIFT_SCALING_EXPONENT,
        }
    }
}

impl CorrectionModel {
    pub fn new(baseline: f64, exponent: f64) -> Result<Self> {
        if !baseline.is_finite() {
            return Err(ValidationError::ParameterOutOfRange {
                name: "baseline",
                value: baseline,
                range: "finite",
            });
        }
        if !exponent.is_finite() {
            return Err(ValidationError::ParameterOutOfRange {
                name: "exponent",
                value: exponent,
                range: "finite",
            });
        }
        Ok(Self { baseline, exponent })
    }

    /// Default exponent with a custom amplitude
    pub fn with_baseline(baseline: f64) -> Result<Self> {
        Self::new(baseline, REDSHIFT_SCALING_EXPONENT)
    }

    /// (1+z)^β
    pub fn scaling_factor(&self, z: f64) -> Result<f64> {
        if z.is_finite() && z <= -1.0 {
            return Err(ValidationError::DegenerateRedshift(z));
        }
        ensure_redshift(z)?;
        Ok((1.0 + z).powf(self.exponent))
    }

    pub fn correction_at(&self, z: f64) -> Result<f64> {
        Ok(self.baseline * self.scaling_factor(z)?)
    }

    /// Add the correction at each effective redshift to `initial`
    pub fn apply_to_bins(&self, z_effective: &[f64], initial: f64) -> Result<BinCorrections> {
        if z_effective.is_empty() {
            return Err(ValidationError::InsufficientData {
                what: "bin corrections",
                required: 1,
                actual: 0,
            });
        }

        let corrections = z_effective
            .iter()
            .map(|&z| self.correction_at(z))
            .collect::<Result<Vec<_>>>()?;
        let corrected_per_bin: Vec<f64> = corrections.iter().map(|c| initial + c).collect();

        Ok(BinCorrections {
            z_effective: z_effective.to_vec(),
            corrected_mean: corrected_per_bin.iter().mean(),
            mean_correction: corrections.iter().mean(),
            corrections,
            corrected_per_bin,
            baseline: self.baseline,
        })
    }

    /// Invert observed corrections into implied baselines and summarize them
    ///
    /// The exponent is held fixed; only the amplitude is recovered.
    pub fn fit_baseline(&self, z_effective: &[f64], corrections: &[f64]) -> Result<BaselineFit> {
        if z_effective.len() != corrections.len() {
            return Err(ValidationError::LengthMismatch {
                left: z_effective.len(),
                right: corrections.len(),
            });
        }
        if z_effective.is_empty() {
            return Err(ValidationError::InsufficientData {
                what: "baseline fit",
                required: 1,
                actual: 0,
            });
        }

        if let Some(&c) = corrections.iter().find(|c| !c.is_finite()) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "correction",
                value: c,
                range: "finite",
            });
        }

        let factors = z_effective
            .iter()
            .map(|&z| self.scaling_factor(z))
            .collect::<Result<Vec<_>>>()?;
        let per_bin_baselines: Vec<f64> = corrections
            .iter()
            .zip(&factors)
            .map(|(c, f)| c / f)
            .collect();

        let baseline = per_bin_baselines.iter().mean();
        let baseline_std = per_bin_baselines.iter().population_std_dev();
        let rms_residual = (corrections
            .iter()
            .zip(&factors)
            .map(|(c, f)| (c - baseline * f).powi(2))
            .sum::<f64>()
            / corrections.len() as f64)
            .sqrt();

        Ok(BaselineFit {
            baseline,
            baseline_std,
            rms_residual,
            n_bins: z_effective.len(),
            per_bin_baselines,
        })
    }

    /// Human-readable form, e.g. `ΔS8(z) = 0.0200 × (1+z)^(-0.5)`
    pub fn formula(&self) -> String {
        format!(
            "ΔS8(z) = {:.4} × (1+z)^({})",
            self.baseline, self.exponent
        )
    }
}
