// End-to-end analysis scenarios on the published survey pack

use super::*;
use crate::config::{AnalysisConfig, LevelCorrection};
use crate::correction::CorrectionModel;
use crate::resolution::{DeltaTVerdict, SchedulePreset};
use crate::survey::SurveyRegistry;
use crate::tension::{ConsistencyStatus, Measurement};

fn analyse_all(config: &AnalysisConfig) -> Vec<SurveyAnalysis> {
    let registry = SurveyRegistry::published().unwrap();
    let model = config.correction_model().unwrap();
    registry
        .surveys()
        .iter()
        .map(|s| analyze_survey(s, &model, config).unwrap())
        .collect()
}

/// DES-Y3: 2.48σ against Planck, below 2σ after the (1+z)^-0.5 correction
#[test]
fn test_des_y3_analysis() {
    let registry = SurveyRegistry::published().unwrap();
    let config = AnalysisConfig::default();
    let des = registry.get("des").unwrap();
    let result = analyze_survey(des, &CorrectionModel::default(), &config).unwrap();

    assert_eq!(result.bins.len(), 4);
    assert_eq!(result.bins[0].bin, 1);
    assert_eq!((result.bins[3].z_min, result.bins[3].z_max), (0.90, 1.05));
    // Correction falls with redshift
    assert!(result.bins.windows(2).all(|w| w[0].correction > w[1].correction));

    assert!((result.s8_final - 0.7919).abs() < 1e-3);
    assert!((result.tension.initial_sigma - 2.484).abs() < 0.01);
    assert!((result.tension.final_sigma - 1.804).abs() < 0.01);
    assert!(result.tension.converged);
    // DES's own corrections follow a 0.016 amplitude, not the applied 0.020
    assert!(result.baseline_from_observed);
    assert!((result.baseline_fit.baseline - 0.01603).abs() < 1e-4);
    assert!(result.baseline_fit.rms_residual < 1e-4);
    assert!(result.schedule.is_none());
}

/// KiDS-1000 stays just above 2σ: the correction is not enough on its own
#[test]
fn test_kids_not_converged() {
    let registry = SurveyRegistry::published().unwrap();
    let kids = registry.get("kids").unwrap();
    let result =
        analyze_survey(kids, &CorrectionModel::default(), &AnalysisConfig::default()).unwrap();

    assert!((result.tension.initial_sigma - 2.60).abs() < 0.01);
    assert!((result.tension.final_sigma - 2.04).abs() < 0.01);
    assert!(!result.tension.converged);

    // A looser convergence threshold from the config flips the flag
    let mut config = AnalysisConfig::default();
    config.thresholds.tension_converged_sigma = 2.1;
    let relaxed = analyze_survey(kids, &CorrectionModel::default(), &config).unwrap();
    assert!(relaxed.tension.converged);
}

/// The ad hoc ΔT heuristic reads a partial reduction as non-systematic
#[test]
fn test_delta_t_reported() {
    let results = analyse_all(&AnalysisConfig::default());
    for r in &results {
        let expected = crate::resolution::epistemic_distance(
            r.tension.initial_sigma,
            r.tension.final_sigma,
            r.mean_correction,
        );
        assert_eq!(r.delta_t, expected);
        assert_eq!(r.delta_t_verdict, DeltaTVerdict::classify(expected));
    }
}

#[test]
fn test_schedule_walk_from_config() {
    let mut config = AnalysisConfig::default();
    config.resolution.schedule = SchedulePreset::Short;
    config.resolution.levels = vec![
        LevelCorrection { bits: 12, correction: 0.004 },
        LevelCorrection { bits: 16, correction: 0.010 },
        LevelCorrection { bits: 20, correction: 0.007 },
        LevelCorrection { bits: 24, correction: 0.003 },
    ];
    let registry = SurveyRegistry::published().unwrap();
    let des = registry.get("des").unwrap();
    let result = analyze_survey(des, &CorrectionModel::default(), &config).unwrap();

    let walk = result.schedule.unwrap();
    assert_eq!(walk.application.values.len(), 6);
    assert!((walk.application.final_value - 0.800).abs() < 1e-12);
    assert!(walk.convergence.converges);
    assert!(walk.convergence.monotonic);
    assert!(!walk.convergence.reached_target);
}

/// Observed corrections: KiDS and HSC near 0.020, DES near 0.016
#[test]
fn test_cross_survey_published_pack() {
    let config = AnalysisConfig::default();
    let results = analyse_all(&config);
    let validation = validate_cross_survey(&results, &config).unwrap();

    assert_eq!(validation.surveys, vec!["KiDS-1000", "DES-Y3", "HSC-Y3"]);
    let consistency = &validation.consistency;
    assert_eq!(consistency.status, ConsistencyStatus::Excellent);
    assert!((consistency.std_baseline - 0.001865).abs() < 1e-5);
    assert!((consistency.mean_baseline - 0.018663).abs() < 1e-5);
    assert!((consistency.range.0 - 0.016026).abs() < 1e-5);

    let combined = &validation.combined;
    assert!((combined.initial.combination.mean - 0.7718).abs() < 1e-3);
    assert!((combined.corrected.combination.mean - 0.7876).abs() < 1e-3);
    assert!((combined.corrected.combination.sigma - 0.01279).abs() < 1e-4);
    assert!((combined.tension_initial_sigma - 3.04).abs() < 0.01);
    assert!((combined.tension_final_sigma - 2.27).abs() < 0.01);
    assert!(!combined.converged);
}

/// The scatter comes from the surveys' data, not from the applied amplitude
#[test]
fn test_cross_survey_scatter_independent_of_applied_amplitude() {
    let mut spreads = Vec::new();
    for amplitude in [0.005, 0.02, 0.05] {
        let mut config = AnalysisConfig::default();
        config.correction.baseline = amplitude;
        let validation = validate_cross_survey(&analyse_all(&config), &config).unwrap();
        spreads.push(validation.consistency.std_baseline);
    }
    assert!(spreads.iter().all(|s| *s > 1e-3));
    assert!(spreads.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-12));
}

/// Without observed corrections the fit recovers the applied amplitude
#[test]
fn test_baseline_falls_back_to_applied_corrections() {
    let registry = SurveyRegistry::published().unwrap();
    let mut kids = registry.get("kids").unwrap().clone();
    kids.observed_corrections = None;
    let model = CorrectionModel::with_baseline(0.0237).unwrap();
    let result = analyze_survey(&kids, &model, &AnalysisConfig::default()).unwrap();

    assert!(!result.baseline_from_observed);
    assert!((result.baseline_fit.baseline - 0.0237).abs() < 1e-12);
    assert!(result.baseline_fit.baseline_std < 1e-12);
}

/// Baselines refitted with different amplitudes separate the statuses
#[test]
fn test_cross_survey_detects_scatter() {
    let config = AnalysisConfig::default();
    let registry = SurveyRegistry::published().unwrap();
    let amplitudes = [0.012, 0.020, 0.028];
    let results: Vec<_> = registry
        .surveys()
        .iter()
        .cloned()
        .map(|mut s| {
            s.observed_corrections = None;
            s
        })
        .zip(amplitudes)
        .map(|(s, a)| {
            analyze_survey(&s, &CorrectionModel::with_baseline(a).unwrap(), &config).unwrap()
        })
        .collect();

    let validation = validate_cross_survey(&results, &config).unwrap();
    assert_eq!(validation.consistency.status, ConsistencyStatus::Marginal);
    assert!(!validation.consistency.consistent);
}

#[test]
fn test_cross_survey_needs_two_surveys() {
    let config = AnalysisConfig::default();
    let results = analyse_all(&config);
    assert!(validate_cross_survey(&results[..1], &config).is_err());

    let duplicated = vec![results[0].clone(), results[0].clone()];
    assert!(validate_cross_survey(&duplicated, &config).is_err());
}

fn corrected_shoes(config: &AnalysisConfig) -> Measurement {
    let shoes = DistanceLadder::Shoes.measurement().unwrap();
    analyze_hubble(&shoes, config)
        .unwrap()
        .corrected_measurement()
        .unwrap()
}

/// SH0ES 73.04 walked through the default H0 table lands at 68.54
#[test]
fn test_hubble_shoes_full_schedule() {
    let config = AnalysisConfig::default();
    let shoes = DistanceLadder::Shoes.measurement().unwrap();
    let result = analyze_hubble(&shoes, &config).unwrap();

    assert_eq!(result.ladder, "SH0ES");
    assert_eq!(result.schedule.values.len(), 8);
    assert!((result.h0_final - 68.54).abs() < 1e-9);
    assert!((result.total_correction + 4.5).abs() < 1e-9);
    assert_eq!(result.h0_sigma, 1.04);

    assert!((result.tension.initial_sigma - 4.847).abs() < 0.01);
    assert!((result.tension.final_sigma - 1.007).abs() < 0.01);
    assert!((result.tension.reduction_percent - 79.2).abs() < 0.1);
    assert!(result.tension.converged);

    assert!(result.convergence.converges);
    assert!(result.convergence.monotonic);
    assert!(!result.convergence.reached_target);

    // The heuristic penalises the 4.5 km/s/Mpc shift
    assert!((result.delta_t - 0.486).abs() < 0.01);
    assert_eq!(result.delta_t_verdict, DeltaTVerdict::NewPhysics);
}

#[test]
fn test_hubble_follows_configured_schedule_and_reference() {
    let mut config = AnalysisConfig::default();
    config.resolution.schedule = SchedulePreset::Short;
    let shoes = DistanceLadder::Shoes.measurement().unwrap();
    let short = analyze_hubble(&shoes, &config).unwrap();
    // 8..24 leaves out the 28 and 32 bit corrections
    assert!((short.h0_final - 68.94).abs() < 1e-9);

    config.hubble.levels.clear();
    let untouched = analyze_hubble(&shoes, &config).unwrap();
    assert_eq!(untouched.h0_final, 73.04);
    assert_eq!(untouched.tension.reduction_percent, 0.0);
    assert!(!untouched.tension.converged);

    let mut config = AnalysisConfig::default();
    config.reference.h0 = 73.0;
    config.reference.label = "Local".to_string();
    let result = analyze_hubble(&shoes, &config).unwrap();
    assert_eq!(result.reference, "Local");
    assert!(result.tension.final_sigma > result.tension.initial_sigma);
}

#[test]
fn test_hubble_trgb_and_report() {
    let trgb = DistanceLadder::Trgb.measurement().unwrap();
    let result = analyze_hubble(&trgb, &AnalysisConfig::default()).unwrap();
    assert!((result.h0_final - 65.3).abs() < 1e-9);
    assert!((result.tension.initial_sigma - 1.235).abs() < 0.01);

    let corrected = result.corrected_measurement().unwrap();
    assert_eq!(corrected.label, "TRGB (corrected)");
    assert_eq!(corrected.sigma, 1.9);

    let text = result.to_report_string();
    assert!(text.contains("TRGB H0 = 69.80"));
    assert!(text.contains("N=16"));
    assert!(text.contains("Converged: YES"));
}

#[test]
fn test_default_concordance_without_lensing() {
    let local = corrected_shoes(&AnalysisConfig::default());
    let result = concordance(&default_probes(&local, None)).unwrap();
    assert!(result.probes.contains(&"SH0ES (corrected)".to_string()));

    let h0 = result.fit(Parameter::H0).unwrap();
    assert!((h0.test.combination.mean - 67.633).abs() < 0.01);
    assert_eq!(h0.test.dof, Some(2));

    assert_eq!(result.total_dof, 5);
    assert!((result.total_chi2 - 1.664).abs() < 0.01);
    assert_eq!(result.verdict, ConcordanceVerdict::Excellent);
    assert!(result.p_value > 0.5);
}

/// Adding the combined corrected weak-lensing S8 pulls χ²/dof up to GOOD
#[test]
fn test_concordance_with_corrected_lensing() {
    let config = AnalysisConfig::default();
    let validation = validate_cross_survey(&analyse_all(&config), &config).unwrap();
    let wl = validation.combined.corrected_measurement().unwrap();
    let local = corrected_shoes(&config);

    let result = concordance(&default_probes(&local, Some(&wl))).unwrap();
    assert_eq!(result.probes.len(), 5);
    assert_eq!(result.total_dof, 6);
    assert!((result.chi2_per_dof - 1.563).abs() < 0.01);
    assert_eq!(result.verdict, ConcordanceVerdict::Good);

    let s8 = result.fit(Parameter::S8).unwrap();
    assert_eq!(s8.test.labels.len(), 3);
    assert!((s8.test.combination.mean - 0.8154).abs() < 1e-3);
}

#[test]
fn test_concordance_needs_a_degree_of_freedom() {
    let probes = vec![
        Probe::new("A", "").with_h0(70.0, 1.0),
        Probe::new("B", "").with_s8(0.8, 0.02),
    ];
    assert!(concordance(&probes).is_err());
    assert!(concordance(&[]).is_err());
}

#[test]
fn test_concordance_rejects_zero_sigma() {
    let probes = vec![
        Probe::new("A", "").with_h0(70.0, 1.0),
        Probe::new("B", "").with_h0(71.0, 0.0),
    ];
    assert!(concordance(&probes).is_err());
}

#[test]
fn test_verdict_thresholds() {
    assert_eq!(ConcordanceVerdict::from_chi2_per_dof(0.9), ConcordanceVerdict::Excellent);
    assert_eq!(ConcordanceVerdict::from_chi2_per_dof(1.5), ConcordanceVerdict::Good);
    assert_eq!(ConcordanceVerdict::from_chi2_per_dof(2.0), ConcordanceVerdict::Marginal);
}

#[test]
fn test_report_strings_mention_results() {
    let config = AnalysisConfig::default();
    let results = analyse_all(&config);
    let text = results[1].to_report_string();
    assert!(text.contains("DES-Y3"));
    assert!(text.contains("1.80σ"));

    let validation = validate_cross_survey(&results, &config).unwrap();
    assert!(validation.to_report_string().contains("EXCELLENT"));
}
