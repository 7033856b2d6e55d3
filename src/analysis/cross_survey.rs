// Cross-survey validation
//
// Independent surveys that need the same correction for the same physical
// reason should recover the same baseline. The baselines are classified by
// their scatter, and the corrected S8 values are combined with inverse
// variance weights and compared with the reference.

use super::per_survey::SurveyAnalysis;
use crate::config::AnalysisConfig;
use crate::error::{Result, ValidationError};
use crate::tension::{
    classify_consistency, consistency_test, tension_sigma, ConsistencyReport, ConsistencyTest,
    Measurement,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inverse-variance combination of all surveys, before and after correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedS8 {
    pub initial: ConsistencyTest,
    pub corrected: ConsistencyTest,
    pub tension_initial_sigma: f64,
    pub tension_final_sigma: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSurveyValidation {
    pub surveys: Vec<String>,
    pub consistency: ConsistencyReport,
    pub combined: CombinedS8,
}

impl CombinedS8 {
    /// Combined corrected S8 as a single measurement
    pub fn corrected_measurement(&self) -> Result<Measurement> {
        Measurement::new(
            "Weak lensing (corrected)",
            self.corrected.combination.mean,
            self.corrected.combination.sigma,
        )
    }
}

/// Classify baseline consistency and combine S8 across `analyses`
pub fn validate_cross_survey(
    analyses: &[SurveyAnalysis],
    config: &AnalysisConfig,
) -> Result<CrossSurveyValidation> {
    if analyses.len() < 2 {
        return Err(ValidationError::InsufficientData {
            what: "cross-survey validation",
            required: 2,
            actual: analyses.len(),
        }
        .into());
    }

    let baselines: BTreeMap<String, f64> = analyses
        .iter()
        .map(|a| (a.survey.clone(), a.baseline_fit.baseline))
        .collect();
    if baselines.len() != analyses.len() {
        return Err(ValidationError::InvalidSurvey {
            survey: "cross-survey".to_string(),
            reason: "the same survey appears more than once".to_string(),
        }
        .into());
    }
    let consistency = classify_consistency(&baselines)?;

    let initial: Vec<Measurement> = analyses
        .iter()
        .map(|a| Measurement::new(a.survey.clone(), a.s8_initial, a.s8_sigma))
        .collect::<Result<_>>()?;
    let corrected: Vec<Measurement> = analyses
        .iter()
        .map(|a| Measurement::new(a.survey.clone(), a.s8_final, a.s8_sigma))
        .collect::<Result<_>>()?;
    let initial = consistency_test(&initial)?;
    let corrected = consistency_test(&corrected)?;

    let reference = &config.reference;
    let tension_initial_sigma = tension_sigma(
        initial.combination.mean,
        initial.combination.sigma,
        reference.s8,
        reference.s8_sigma,
    )?;
    let tension_final_sigma = tension_sigma(
        corrected.combination.mean,
        corrected.combination.sigma,
        reference.s8,
        reference.s8_sigma,
    )?;

    tracing::info!(
        status = %consistency.status,
        std = consistency.std_baseline,
        combined_s8 = corrected.combination.mean,
        "cross-survey validation complete"
    );

    Ok(CrossSurveyValidation {
        surveys: analyses.iter().map(|a| a.survey.clone()).collect(),
        consistency,
        combined: CombinedS8 {
            initial,
            corrected,
            tension_initial_sigma,
            tension_final_sigma,
            converged: tension_final_sigma < config.thresholds.tension_converged_sigma,
        },
    })
}

impl CrossSurveyValidation {
    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        out.push_str("Survey baselines:\n");
        for (name, baseline) in &self.consistency.baselines {
            out.push_str(&format!("  {:<12} {:.5}\n", name, baseline));
        }
        let c = &self.consistency;
        out.push_str(&format!(
            "\nMean baseline: {:.5} ± {:.5} (max deviation {:.5})\n",
            c.mean_baseline, c.std_baseline, c.max_difference
        ));
        out.push_str(&format!(
            "Consistency: {} - {}\n",
            c.status,
            c.status.interpretation()
        ));

        let m = &self.combined;
        out.push_str(&format!(
            "\nCombined S8: {:.3} ± {:.3} → {:.3} ± {:.3}\n",
            m.initial.combination.mean,
            m.initial.combination.sigma,
            m.corrected.combination.mean,
            m.corrected.combination.sigma
        ));
        out.push_str(&format!(
            "Tension vs reference: {:.2}σ → {:.2}σ (converged: {})\n",
            m.tension_initial_sigma,
            m.tension_final_sigma,
            if m.converged { "YES" } else { "NO" }
        ));
        out
    }
}
