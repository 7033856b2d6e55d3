// Generic weak-lensing survey analysis
//
// One code path for every survey: the record supplies the tomographic bins
// and the published S8, the correction model supplies ΔS8(z), and the config
// supplies the reference measurement and decision thresholds.

use crate::config::AnalysisConfig;
use crate::correction::{BaselineFit, CorrectionModel};
use crate::error::Result;
use crate::resolution::{
    apply_schedule, check_convergence, epistemic_distance, ConvergenceCheck, DeltaTVerdict,
    ScheduleApplication,
};
use crate::survey::SurveyMetadata;
use crate::tension::TensionReduction;
use serde::{Deserialize, Serialize};

/// Correction applied to a single tomographic bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinResult {
    /// 1-based bin index
    pub bin: usize,
    pub z_min: f64,
    pub z_max: f64,
    pub z_effective: f64,
    pub correction: f64,
    pub s8_corrected: f64,
}

/// Walk through the configured resolution schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWalk {
    pub application: ScheduleApplication,
    /// Convergence of the walked values toward the reference S8
    pub convergence: ConvergenceCheck,
}

/// Complete result of analysing one survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyAnalysis {
    pub survey: String,
    pub key: String,
    pub citation: String,
    pub correction_formula: String,
    pub model: CorrectionModel,
    pub s8_initial: f64,
    pub s8_sigma: f64,
    pub s8_final: f64,
    pub mean_correction: f64,
    pub bins: Vec<BinResult>,
    pub baseline_fit: BaselineFit,
    /// Baseline fitted from the survey's observed corrections rather than
    /// the applied model
    #[serde(default)]
    pub baseline_from_observed: bool,
    pub tension: TensionReduction,
    pub delta_t: f64,
    pub delta_t_verdict: DeltaTVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleWalk>,
}

/// Apply `model` to every bin of `survey` and measure the tension change
///
/// The corrected S8 is the mean of the per-bin corrected values and keeps the
/// published uncertainty. The baseline is fitted from the survey's observed
/// per-bin corrections when the record has them, otherwise from the applied
/// ones, so that surveys can be compared with each other afterwards.
pub fn analyze_survey(
    survey: &SurveyMetadata,
    model: &CorrectionModel,
    config: &AnalysisConfig,
) -> Result<SurveyAnalysis> {
    survey.validate()?;
    tracing::info!(survey = %survey.name, bins = survey.n_bins(), "analysing survey");

    let applied = model.apply_to_bins(&survey.z_effective, survey.s8)?;
    let bins: Vec<BinResult> = survey
        .z_bins
        .iter()
        .zip(&survey.z_effective)
        .zip(applied.corrections.iter().zip(&applied.corrected_per_bin))
        .enumerate()
        .map(|(i, ((&(z_min, z_max), &z_eff), (&c, &s8)))| BinResult {
            bin: i + 1,
            z_min,
            z_max,
            z_effective: z_eff,
            correction: c,
            s8_corrected: s8,
        })
        .collect();

    for b in &bins {
        tracing::debug!(
            bin = b.bin,
            z_eff = b.z_effective,
            correction = b.correction,
            "bin corrected"
        );
    }

    let (fitted, baseline_from_observed) = match &survey.observed_corrections {
        Some(observed) => (observed, true),
        None => (&applied.corrections, false),
    };
    let baseline_fit = model.fit_baseline(&survey.z_effective, fitted)?;

    let reference = &config.reference;
    let mut tension = TensionReduction::compute(
        survey.s8,
        applied.corrected_mean,
        survey.s8_sigma,
        reference.s8,
        reference.s8_sigma,
    )?;
    tension.converged = tension.final_sigma < config.thresholds.tension_converged_sigma;

    let delta_t = epistemic_distance(
        tension.initial_sigma,
        tension.final_sigma,
        applied.mean_correction,
    );
    let delta_t_verdict = DeltaTVerdict::classify_with(
        delta_t,
        config.thresholds.delta_t_systematic,
        config.thresholds.delta_t_new_physics,
    );

    let table = config.level_corrections();
    let schedule = if table.is_empty() {
        None
    } else {
        let application =
            apply_schedule(survey.s8, &config.resolution.schedule.levels(), &table)?;
        let convergence = check_convergence(
            &application.values,
            reference.s8,
            reference.s8_sigma,
        );
        Some(ScheduleWalk {
            application,
            convergence,
        })
    };

    tracing::info!(
        survey = %survey.name,
        initial_sigma = tension.initial_sigma,
        final_sigma = tension.final_sigma,
        baseline = baseline_fit.baseline,
        "survey analysis complete"
    );

    Ok(SurveyAnalysis {
        survey: survey.name.clone(),
        key: survey.key.clone(),
        citation: survey.reference.clone(),
        correction_formula: model.formula(),
        model: *model,
        s8_initial: survey.s8,
        s8_sigma: survey.s8_sigma,
        s8_final: applied.corrected_mean,
        mean_correction: applied.mean_correction,
        bins,
        baseline_fit,
        baseline_from_observed,
        tension,
        delta_t,
        delta_t_verdict,
        schedule,
    })
}

impl SurveyAnalysis {
    /// Console summary
    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} ({})\n", self.survey, self.citation));
        out.push_str(&format!("Correction model: {}\n\n", self.correction_formula));

        out.push_str("Bin  z range        z_eff   ΔS8      S8 corrected\n");
        for b in &self.bins {
            out.push_str(&format!(
                "{:<4} [{:.2}, {:.2}]   {:<6.2}  {:+.4}  {:.4}\n",
                b.bin, b.z_min, b.z_max, b.z_effective, b.correction, b.s8_corrected
            ));
        }

        let t = &self.tension;
        out.push_str(&format!(
            "\nS8: {:.3} ± {:.3} → {:.3} ± {:.3} (mean ΔS8 = {:+.4})\n",
            self.s8_initial, self.s8_sigma, self.s8_final, self.s8_sigma, self.mean_correction
        ));
        out.push_str(&format!(
            "Tension vs reference ({:.3} ± {:.3}): {:.2}σ → {:.2}σ ({:.1}% reduction)\n",
            t.reference_value, t.reference_sigma, t.initial_sigma, t.final_sigma, t.reduction_percent
        ));
        out.push_str(&format!(
            "Converged: {}\n",
            if t.converged { "YES" } else { "NO" }
        ));
        out.push_str(&format!(
            "Fitted baseline ({}): {:.5} ± {:.5} (rms residual {:.2e})\n",
            if self.baseline_from_observed { "observed" } else { "applied" },
            self.baseline_fit.baseline,
            self.baseline_fit.baseline_std,
            self.baseline_fit.rms_residual
        ));
        out.push_str(&format!(
            "Epistemic distance: ΔT = {:.3} ({})\n",
            self.delta_t, self.delta_t_verdict
        ));

        if let Some(walk) = &self.schedule {
            out.push_str("\nResolution schedule:\n");
            for (level, value) in walk.application.levels.iter().zip(&walk.application.values) {
                match level {
                    Some(bits) => out.push_str(&format!("  N={:<2}  S8 = {:.4}\n", bits, value)),
                    None => out.push_str(&format!("  start S8 = {:.4}\n", value)),
                }
            }
            out.push_str(&format!(
                "  converges: {}, monotonic: {}, reached reference: {}\n",
                walk.convergence.converges, walk.convergence.monotonic, walk.convergence.reached_target
            ));
        }
        out
    }
}
