// Hubble-constant analysis
//
// The local distance-ladder H0 is walked through the configured resolution
// schedule with the per-level H0 corrections, then compared with the
// reference H0 before and after. The corrected value stands in for the
// distance ladder in the concordance fit.

use crate::config::AnalysisConfig;
use crate::constants::{SHOES_H0, SHOES_H0_SIGMA, TRGB_H0, TRGB_H0_SIGMA};
use crate::error::Result;
use crate::resolution::{
    apply_schedule, check_convergence, epistemic_distance, ConvergenceCheck, DeltaTVerdict,
    ScheduleApplication,
};
use crate::tension::{Measurement, TensionReduction};
use serde::{Deserialize, Serialize};

/// Published local H0 measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DistanceLadder {
    /// Cepheid-anchored SH0ES (Riess et al. 2022)
    Shoes,
    /// Tip of the red giant branch (Freedman et al. 2020)
    Trgb,
}

impl DistanceLadder {
    pub fn measurement(self) -> Result<Measurement> {
        match self {
            Self::Shoes => Measurement::new("SH0ES", SHOES_H0, SHOES_H0_SIGMA),
            Self::Trgb => Measurement::new("TRGB", TRGB_H0, TRGB_H0_SIGMA),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubbleAnalysis {
    pub ladder: String,
    pub reference: String,
    pub h0_initial: f64,
    pub h0_sigma: f64,
    pub h0_final: f64,
    pub total_correction: f64,
    pub schedule: ScheduleApplication,
    /// Convergence of the walked values toward the reference H0
    pub convergence: ConvergenceCheck,
    pub tension: TensionReduction,
    pub delta_t: f64,
    pub delta_t_verdict: DeltaTVerdict,
}

/// Walk `local` through the H0 level table and measure the tension change
///
/// The corrected H0 keeps the published uncertainty.
pub fn analyze_hubble(local: &Measurement, config: &AnalysisConfig) -> Result<HubbleAnalysis> {
    tracing::info!(ladder = %local.label, h0 = local.value, "analysing H0");

    let schedule = apply_schedule(
        local.value,
        &config.resolution.schedule.levels(),
        &config.h0_level_corrections(),
    )?;
    for (level, step) in schedule.levels.iter().zip(&schedule.corrections) {
        if let Some(bits) = level {
            tracing::debug!(bits = *bits, correction = *step, "H0 level applied");
        }
    }

    let reference = &config.reference;
    let mut tension = TensionReduction::compute(
        local.value,
        schedule.final_value,
        local.sigma,
        reference.h0,
        reference.h0_sigma,
    )?;
    tension.converged = tension.final_sigma < config.thresholds.tension_converged_sigma;

    let convergence = check_convergence(&schedule.values, reference.h0, reference.h0_sigma);
    let delta_t = epistemic_distance(
        tension.initial_sigma,
        tension.final_sigma,
        schedule.total_correction,
    );
    let delta_t_verdict = DeltaTVerdict::classify_with(
        delta_t,
        config.thresholds.delta_t_systematic,
        config.thresholds.delta_t_new_physics,
    );

    tracing::info!(
        ladder = %local.label,
        initial_sigma = tension.initial_sigma,
        final_sigma = tension.final_sigma,
        "H0 analysis complete"
    );

    Ok(HubbleAnalysis {
        ladder: local.label.clone(),
        reference: reference.label.clone(),
        h0_initial: local.value,
        h0_sigma: local.sigma,
        h0_final: schedule.final_value,
        total_correction: schedule.total_correction,
        schedule,
        convergence,
        tension,
        delta_t,
        delta_t_verdict,
    })
}

impl HubbleAnalysis {
    /// Corrected H0 as a concordance input
    pub fn corrected_measurement(&self) -> Result<Measurement> {
        Measurement::new(
            format!("{} (corrected)", self.ladder),
            self.h0_final,
            self.h0_sigma,
        )
    }

    /// Console summary
    pub fn to_report_string(&self) -> String {
        let t = &self.tension;
        let mut out = format!(
            "{} H0 = {:.2} ± {:.2} km/s/Mpc vs {} {:.2} ± {:.2}\n\nResolution schedule:\n",
            self.ladder,
            self.h0_initial,
            self.h0_sigma,
            self.reference,
            t.reference_value,
            t.reference_sigma
        );
        for (level, (value, step)) in self
            .schedule
            .levels
            .iter()
            .zip(self.schedule.values.iter().zip(&self.schedule.corrections))
        {
            match level {
                Some(bits) => {
                    out.push_str(&format!("  N={:<2}  {:+.2}  → {:.2}\n", bits, step, value))
                }
                None => out.push_str(&format!("  start        {:.2}\n", value)),
            }
        }

        out.push_str(&format!(
            "\nH0: {:.2} → {:.2} km/s/Mpc (total correction {:+.2})\n",
            self.h0_initial, self.h0_final, self.total_correction
        ));
        out.push_str(&format!(
            "Tension: {:.2}σ → {:.2}σ ({:.1}% reduction)\n",
            t.initial_sigma, t.final_sigma, t.reduction_percent
        ));
        out.push_str(&format!(
            "Converged: {}\n",
            if t.converged { "YES" } else { "NO" }
        ));
        out.push_str(&format!(
            "Epistemic distance: ΔT = {:.3} ({})\n",
            self.delta_t, self.delta_t_verdict
        ));
        out
    }
}
