// Analysis configuration
//
// Every tunable number of a run lives here: correction parameters, the
// reference measurement, the resolution schedule with its per-level S8 and
// H0 correction tables, and the decision thresholds. Loaded from TOML; every
// section is optional and falls back to the published defaults.

use crate::constants::{
    DELTA_T_CONVERGENCE_THRESHOLD, DELTA_T_NEW_PHYSICS_THRESHOLD, H0_CORRECTION_BY_RESOLUTION,
    PLANCK_H0, PLANCK_H0_SIGMA,
    PLANCK_S8, PLANCK_S8_SIGMA, REDSHIFT_SCALING_EXPONENT, TENSION_CONVERGED_SIGMA,
    UNIVERSAL_BASELINE,
};
use crate::correction::CorrectionModel;
use crate::error::{ensure_sigma, Result, ValidationError};
use crate::resolution::{validate_bits, SchedulePreset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for survey and concordance runs
///
/// # Example
/// ```
/// use concordia::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.correction.baseline, 0.02);
/// assert_eq!(config.reference.s8, 0.834);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub correction: CorrectionSection,
    pub reference: ReferenceSection,
    pub resolution: ResolutionSection,
    pub hubble: HubbleSection,
    pub thresholds: ThresholdSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSection {
    pub baseline: f64,
    pub exponent: f64,
}

/// Measurement the survey results are compared against (Planck 2018 by default)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSection {
    pub label: String,
    pub s8: f64,
    pub s8_sigma: f64,
    pub h0: f64,
    pub h0_sigma: f64,
}

/// Schedule plus the corrections contributed at each level
///
/// ```toml
/// [resolution]
/// schedule = "short"
///
/// [[resolution.level]]
/// bits = 12
/// correction = 0.004
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionSection {
    pub schedule: SchedulePreset,
    #[serde(rename = "level", skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<LevelCorrection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelCorrection {
    pub bits: u32,
    pub correction: f64,
}

/// H0 corrections (km/s/Mpc) walked along `resolution.schedule`
///
/// ```toml
/// [[hubble.level]]
/// bits = 16
/// correction = -1.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubbleSection {
    #[serde(rename = "level")]
    pub levels: Vec<LevelCorrection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSection {
    /// Final tension below this counts as converged
    pub tension_converged_sigma: f64,
    /// ΔT below this reads as a systematic origin
    pub delta_t_systematic: f64,
    /// ΔT above this reads as new physics
    pub delta_t_new_physics: f64,
}

impl Default for CorrectionSection {
    fn default() -> Self {
        Self {
            baseline: UNIVERSAL_BASELINE,
            exponent: REDSHIFT_SCALING_EXPONENT,
        }
    }
}

impl Default for ReferenceSection {
    fn default() -> Self {
        Self {
            label: "Planck 2018".to_string(),
            s8: PLANCK_S8,
            s8_sigma: PLANCK_S8_SIGMA,
            h0: PLANCK_H0,
            h0_sigma: PLANCK_H0_SIGMA,
        }
    }
}

impl Default for ResolutionSection {
    fn default() -> Self {
        Self {
            schedule: SchedulePreset::Full,
            levels: Vec::new(),
        }
    }
}

impl Default for HubbleSection {
    fn default() -> Self {
        Self {
            levels: H0_CORRECTION_BY_RESOLUTION
                .iter()
                .map(|&(bits, correction)| LevelCorrection { bits, correction })
                .collect(),
        }
    }
}

impl Default for ThresholdSection {
    fn default() -> Self {
        Self {
            tension_converged_sigma: TENSION_CONVERGED_SIGMA,
            delta_t_systematic: DELTA_T_CONVERGENCE_THRESHOLD,
            delta_t_new_physics: DELTA_T_NEW_PHYSICS_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a config file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading analysis config");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.correction_model()?;
        ensure_sigma("reference S8", self.reference.s8_sigma)?;
        ensure_sigma("reference H0", self.reference.h0_sigma)?;

        validate_levels(&self.resolution.levels)?;
        validate_levels(&self.hubble.levels)?;

        let t = &self.thresholds;
        if !(t.tension_converged_sigma.is_finite() && t.tension_converged_sigma > 0.0) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "tension_converged_sigma",
                value: t.tension_converged_sigma,
                range: "(0, inf)",
            });
        }
        if !(t.delta_t_systematic.is_finite()
            && t.delta_t_new_physics.is_finite()
            && 0.0 <= t.delta_t_systematic
            && t.delta_t_systematic <= t.delta_t_new_physics)
        {
            return Err(ValidationError::ParameterOutOfRange {
                name: "delta_t_systematic",
                value: t.delta_t_systematic,
                range: "[0, delta_t_new_physics]",
            });
        }
        Ok(())
    }

    pub fn correction_model(&self) -> std::result::Result<CorrectionModel, ValidationError> {
        CorrectionModel::new(self.correction.baseline, self.correction.exponent)
    }

    /// Per-level S8 corrections keyed by resolution bits
    pub fn level_corrections(&self) -> BTreeMap<u32, f64> {
        level_table(&self.resolution.levels)
    }

    /// Per-level H0 corrections keyed by resolution bits
    pub fn h0_level_corrections(&self) -> BTreeMap<u32, f64> {
        level_table(&self.hubble.levels)
    }
}

fn level_table(levels: &[LevelCorrection]) -> BTreeMap<u32, f64> {
    levels.iter().map(|l| (l.bits, l.correction)).collect()
}

fn validate_levels(levels: &[LevelCorrection]) -> std::result::Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();
    for level in levels {
        validate_bits(level.bits)?;
        if !level.correction.is_finite() {
            return Err(ValidationError::InvalidSchedule(format!(
                "correction at {} bits is not finite",
                level.bits
            )));
        }
        if !seen.insert(level.bits) {
            return Err(ValidationError::InvalidSchedule(format!(
                "level {} listed twice",
                level.bits
            )));
        }
    }
    Ok(())
}
