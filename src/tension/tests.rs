// Scenario tests for the tension statistics
//
// Uses the published KiDS-1000 / DES-Y3 / HSC-Y3 and Planck / SH0ES / TRGB
// numbers rather than synthetic inputs.

use super::*;
use std::collections::BTreeMap;

fn measurement(label: &str, value: f64, sigma: f64) -> Measurement {
    Measurement::new(label, value, sigma).unwrap()
}

/// Three lensing surveys that recover nearly the same baseline
#[test]
fn test_three_surveys_excellent_consistency() {
    let mut baselines = BTreeMap::new();
    baselines.insert("KiDS-1000".to_string(), 0.0199);
    baselines.insert("DES-Y3".to_string(), 0.0201);
    baselines.insert("HSC-Y3".to_string(), 0.0200);

    let report = classify_consistency(&baselines).unwrap();
    assert_eq!(report.status, ConsistencyStatus::Excellent);
    assert!(report.consistent);
    assert!((report.mean_baseline - 0.0200).abs() < 1e-9);
    assert!((report.max_difference - 0.0001).abs() < 1e-9);
    assert_eq!(report.range, (0.0199, 0.0201));
}

/// Baselines scattered with population std exactly 0.004 and 0.006
#[test]
fn test_classifier_on_constructed_scatter() {
    let spread = |d: f64| {
        let mut b = BTreeMap::new();
        b.insert("a".to_string(), 0.02 - d);
        b.insert("b".to_string(), 0.02 + d);
        b
    };

    let good = classify_consistency(&spread(0.004)).unwrap();
    assert!((good.std_baseline - 0.004).abs() < 1e-12);
    assert_eq!(good.status, ConsistencyStatus::Good);

    let marginal = classify_consistency(&spread(0.006)).unwrap();
    assert_eq!(marginal.status, ConsistencyStatus::Marginal);
    assert!(!marginal.consistent);
}

/// Combined sigma shrinks as 1/sqrt(N) for equal uncertainties
#[test]
fn test_combined_sigma_decreases_with_more_surveys() {
    let mut inputs = Vec::new();
    let mut previous = f64::INFINITY;
    for n in 1..=5 {
        inputs.push(measurement(&format!("s{}", n), 0.78, 0.02));
        let combo = weighted_combination(&inputs).unwrap();
        assert!(combo.sigma < previous);
        assert!((combo.sigma - 0.02 / (n as f64).sqrt()).abs() < 1e-12);
        previous = combo.sigma;
    }
}

/// Published lensing S8 values are mutually consistent
#[test]
fn test_lensing_surveys_agree_with_each_other() {
    let inputs = vec![
        measurement("KiDS-1000", 0.759, 0.024),
        measurement("DES-Y3", 0.776, 0.017),
        measurement("HSC-Y3", 0.780, 0.033),
    ];
    let result = consistency_test(&inputs).unwrap();
    assert_eq!(result.dof, Some(2));
    assert!(result.chi2_per_dof.unwrap() < 1.0);
    assert!(result.p_value.unwrap() > 0.5);
    assert!(result.combination.mean > 0.759 && result.combination.mean < 0.780);
}

/// Planck versus the distance ladder is strongly inconsistent
#[test]
fn test_h0_probes_in_tension() {
    let planck = measurement("Planck", 67.36, 0.54);
    let shoes = measurement("SH0ES", 73.04, 1.04);
    let trgb = measurement("TRGB", 69.8, 1.9);

    assert!(planck.tension_with(&shoes).unwrap() > 4.5);
    assert!(planck.tension_with(&trgb).unwrap() < 1.5);

    let result = consistency_test(&[planck, shoes, trgb]).unwrap();
    assert!(result.p_value.unwrap() < 0.001);
}

/// Correcting DES by the model's mean bin correction reduces the tension with Planck
#[test]
fn test_des_correction_reduces_tension() {
    let model = crate::correction::CorrectionModel::default();
    let bins = model.apply_to_bins(&[0.3, 0.5, 0.7, 0.95], 0.776).unwrap();
    let r = TensionReduction::compute(0.776, bins.corrected_mean, 0.017, 0.834, 0.016).unwrap();

    assert!((r.initial_sigma - 2.48).abs() < 0.01);
    assert!(r.final_sigma < 2.0);
    assert!(r.reduction_percent > 25.0);
    assert!(r.converged);
}
