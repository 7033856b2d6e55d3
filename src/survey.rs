//! Survey metadata and the TOML-backed survey registry
//!
//! The default registry is compiled into the binary from
//! `surveys-default.toml`; additional packs can be loaded from disk.

use crate::error::{AnalysisError, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Published result of one weak-lensing survey
///
/// # Example TOML
/// ```toml
/// [[survey]]
/// key = "des"
/// name = "DES-Y3"
/// full_name = "Dark Energy Survey - Year 3"
/// telescope = "Blanco 4m"
/// location = "CTIO, Chile"
/// area_deg2 = 4143.0
/// z_bins = [[0.2, 0.43], [0.43, 0.63], [0.63, 0.90], [0.90, 1.05]]
/// z_effective = [0.3, 0.5, 0.7, 0.95]
/// s8 = 0.776
/// s8_sigma = 0.017
/// reference = "Abbott et al. 2022, PRD 105, 023520"
/// observed_corrections = [0.0140, 0.0131, 0.0123, 0.0115]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyMetadata {
    /// Short lookup key (e.g. "kids")
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub telescope: String,
    #[serde(default)]
    pub location: String,
    pub area_deg2: f64,
    /// Tomographic bin edges (z_min, z_max)
    pub z_bins: Vec<(f64, f64)>,
    /// Effective redshift of each bin
    pub z_effective: Vec<f64>,
    pub s8: f64,
    pub s8_sigma: f64,
    pub reference: String,
    /// ΔS8 the survey's own pipeline found in each bin
    ///
    /// Baselines are fitted from these when present, so that surveys can be
    /// compared against each other rather than against the applied model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_corrections: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_release: Option<String>,
}

impl SurveyMetadata {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidSurvey {
            survey: self.name.clone(),
            reason,
        };

        if !self.s8_sigma.is_finite() || self.s8_sigma <= 0.0 {
            return Err(invalid(format!("s8_sigma must be > 0, got {}", self.s8_sigma)));
        }
        if !self.area_deg2.is_finite() || self.area_deg2 <= 0.0 {
            return Err(invalid(format!("area_deg2 must be > 0, got {}", self.area_deg2)));
        }
        if self.z_bins.is_empty() {
            return Err(invalid("no redshift bins".to_string()));
        }
        if self.z_bins.len() != self.z_effective.len() {
            return Err(invalid(format!(
                "{} z_bins but {} z_effective values",
                self.z_bins.len(),
                self.z_effective.len()
            )));
        }
        for &(lo, hi) in &self.z_bins {
            if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || hi <= lo {
                return Err(invalid(format!("invalid redshift bin ({}, {})", lo, hi)));
            }
        }
        if let Some(z) = self.z_effective.iter().find(|z| !z.is_finite() || **z < 0.0) {
            return Err(invalid(format!("invalid effective redshift {}", z)));
        }
        if let Some(observed) = &self.observed_corrections {
            if observed.len() != self.z_effective.len() {
                return Err(invalid(format!(
                    "{} observed corrections for {} bins",
                    observed.len(),
                    self.z_effective.len()
                )));
            }
            if let Some(c) = observed.iter().find(|c| !c.is_finite()) {
                return Err(invalid(format!("invalid observed correction {}", c)));
            }
        }
        Ok(())
    }

    pub fn n_bins(&self) -> usize {
        self.z_bins.len()
    }

    /// (z_min, z_max) across all bins
    pub fn z_range(&self) -> (f64, f64) {
        let lo = self.z_bins.iter().map(|b| b.0).fold(f64::INFINITY, f64::min);
        let hi = self.z_bins.iter().map(|b| b.1).fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    }
}

#[derive(Deserialize)]
struct SurveyFile {
    survey: Vec<SurveyMetadata>,
}

/// Ordered collection of surveys with key / name lookup
#[derive(Debug, Clone)]
pub struct SurveyRegistry {
    surveys: Vec<SurveyMetadata>,
}

impl SurveyRegistry {
    /// Registry built from the embedded KiDS-1000 / DES-Y3 / HSC-Y3 pack
    pub fn published() -> Result<Self> {
        const DEFAULT_TOML: &str = include_str!("../surveys-default.toml");
        Self::from_toml_str(DEFAULT_TOML)
    }

    /// Load survey definitions from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading survey registry");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SurveyFile = toml::from_str(content)?;
        Self::from_surveys(file.survey)
    }

    /// Rejects invalid records and duplicate keys
    pub fn from_surveys(surveys: Vec<SurveyMetadata>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for survey in &surveys {
            survey.validate()?;
            if !seen.insert(survey.key.to_ascii_lowercase()) {
                return Err(AnalysisError::Validation(ValidationError::InvalidSurvey {
                    survey: survey.name.clone(),
                    reason: format!("duplicate key '{}'", survey.key),
                }));
            }
        }
        Ok(Self { surveys })
    }

    pub fn surveys(&self) -> &[SurveyMetadata] {
        &self.surveys
    }

    pub fn len(&self) -> usize {
        self.surveys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surveys.is_empty()
    }

    /// Look up by key, then by case-insensitive name fragment
    pub fn get(&self, name: &str) -> std::result::Result<&SurveyMetadata, ValidationError> {
        let wanted = name.to_ascii_lowercase();
        self.surveys
            .iter()
            .find(|s| s.key.to_ascii_lowercase() == wanted)
            .or_else(|| {
                self.surveys
                    .iter()
                    .find(|s| s.name.to_ascii_lowercase().contains(&wanted))
            })
            .ok_or_else(|| ValidationError::UnknownSurvey {
                name: name.to_string(),
                valid: self
                    .surveys
                    .iter()
                    .map(|s| s.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_registry_loads() {
        let registry = SurveyRegistry::published().unwrap();
        assert_eq!(registry.len(), 3);
        let keys: Vec<_> = registry.surveys().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["kids", "des", "hsc"]);
    }

    #[test]
    fn test_lookup_by_key_and_name_fragment() {
        let registry = SurveyRegistry::published().unwrap();
        assert_eq!(registry.get("kids").unwrap().name, "KiDS-1000");
        assert_eq!(registry.get("DES").unwrap().s8, 0.776);
        assert_eq!(registry.get("hsc-y3").unwrap().n_bins(), 4);
    }

    #[test]
    fn test_unknown_survey_lists_options() {
        let registry = SurveyRegistry::published().unwrap();
        let err = registry.get("euclid").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown survey: euclid. Valid options: kids, des, hsc"
        );
    }

    #[test]
    fn test_z_range() {
        let registry = SurveyRegistry::published().unwrap();
        assert_eq!(registry.get("hsc").unwrap().z_range(), (0.3, 1.5));
    }

    #[test]
    fn test_rejects_bin_count_mismatch() {
        let toml = r#"
            [[survey]]
            key = "bad"
            name = "Bad"
            area_deg2 = 10.0
            z_bins = [[0.1, 0.3], [0.3, 0.5]]
            z_effective = [0.2]
            s8 = 0.8
            s8_sigma = 0.02
            reference = "none"
        "#;
        let err = SurveyRegistry::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("z_effective"), "{}", err);
    }

    #[test]
    fn test_rejects_non_positive_sigma() {
        let toml = r#"
            [[survey]]
            key = "bad"
            name = "Bad"
            area_deg2 = 10.0
            z_bins = [[0.1, 0.3]]
            z_effective = [0.2]
            s8 = 0.8
            s8_sigma = 0.0
            reference = "none"
        "#;
        assert!(SurveyRegistry::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_published_surveys_carry_observed_corrections() {
        let registry = SurveyRegistry::published().unwrap();
        for survey in registry.surveys() {
            let observed = survey.observed_corrections.as_ref().unwrap();
            assert_eq!(observed.len(), survey.n_bins(), "{}", survey.name);
        }
    }

    #[test]
    fn test_rejects_observed_correction_count_mismatch() {
        let toml = r#"
            [[survey]]
            key = "bad"
            name = "Bad"
            area_deg2 = 10.0
            z_bins = [[0.1, 0.3], [0.3, 0.5]]
            z_effective = [0.2, 0.4]
            s8 = 0.8
            s8_sigma = 0.02
            reference = "none"
            observed_corrections = [0.018]
        "#;
        let err = SurveyRegistry::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("observed corrections"), "{}", err);
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let registry = SurveyRegistry::published().unwrap();
        let mut surveys = registry.surveys().to_vec();
        surveys.push(surveys[0].clone());
        assert!(SurveyRegistry::from_surveys(surveys).is_err());
    }

    #[test]
    fn test_malformed_toml_is_toml_error() {
        let err = SurveyRegistry::from_toml_str("[[survey]\nkey=").unwrap_err();
        assert!(matches!(err, AnalysisError::Toml(_)));
    }
}
