// Multi-probe ΛCDM concordance
//
// Each probe constrains some subset of (H0, S8, Ωm). Every parameter with at
// least one measurement gets its own weighted combination and χ²; the χ² and
// degrees of freedom are then summed into one goodness-of-fit verdict.

use crate::constants::{
    CONCORDANCE_EXCELLENT_CHI2_DOF, CONCORDANCE_GOOD_CHI2_DOF, PLANCK_H0, PLANCK_H0_SIGMA,
    PLANCK_OMEGA_M, PLANCK_OMEGA_M_SIGMA, PLANCK_S8, PLANCK_S8_SIGMA,
};
use crate::error::{Result, ValidationError};
use crate::tension::{consistency_test, p_value, ConsistencyTest, Measurement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Central value and 1σ uncertainty of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub value: f64,
    pub sigma: f64,
}

/// A cosmological probe and the parameters it constrains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h0: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s8: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega_m: Option<Constraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parameter {
    H0,
    S8,
    #[serde(rename = "Omega_m")]
    OmegaM,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [Parameter::H0, Parameter::S8, Parameter::OmegaM];

    fn of(self, probe: &Probe) -> Option<Constraint> {
        match self {
            Self::H0 => probe.h0,
            Self::S8 => probe.s8,
            Self::OmegaM => probe.omega_m,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::H0 => "H0",
            Self::S8 => "S8",
            Self::OmegaM => "Omega_m",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConcordanceVerdict {
    /// χ²/dof < 1.5
    Excellent,
    /// χ²/dof < 2.0
    Good,
    Marginal,
}

impl ConcordanceVerdict {
    pub fn from_chi2_per_dof(chi2_per_dof: f64) -> Self {
        if chi2_per_dof < CONCORDANCE_EXCELLENT_CHI2_DOF {
            Self::Excellent
        } else if chi2_per_dof < CONCORDANCE_GOOD_CHI2_DOF {
            Self::Good
        } else {
            Self::Marginal
        }
    }
}

impl fmt::Display for ConcordanceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Marginal => "MARGINAL",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFit {
    pub parameter: Parameter,
    pub test: ConsistencyTest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordanceResult {
    pub probes: Vec<String>,
    pub parameters: Vec<ParameterFit>,
    pub total_chi2: f64,
    pub total_dof: usize,
    pub chi2_per_dof: f64,
    pub p_value: f64,
    pub verdict: ConcordanceVerdict,
}

impl Probe {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            h0: None,
            s8: None,
            omega_m: None,
        }
    }

    pub fn with_h0(mut self, value: f64, sigma: f64) -> Self {
        self.h0 = Some(Constraint { value, sigma });
        self
    }

    pub fn with_s8(mut self, value: f64, sigma: f64) -> Self {
        self.s8 = Some(Constraint { value, sigma });
        self
    }

    pub fn with_omega_m(mut self, value: f64, sigma: f64) -> Self {
        self.omega_m = Some(Constraint { value, sigma });
        self
    }
}

/// Planck CMB, Planck lensing, BOSS BAO and the distance ladder
///
/// `local_h0` is normally the corrected output of
/// [`analyze_hubble`](super::analyze_hubble). `weak_lensing` (normally the
/// combined corrected cross-survey S8) is appended when given.
pub fn default_probes(local_h0: &Measurement, weak_lensing: Option<&Measurement>) -> Vec<Probe> {
    let mut probes = vec![
        Probe::new("Planck CMB", "CMB temperature + polarization")
            .with_h0(PLANCK_H0, PLANCK_H0_SIGMA)
            .with_s8(PLANCK_S8, PLANCK_S8_SIGMA)
            .with_omega_m(PLANCK_OMEGA_M, PLANCK_OMEGA_M_SIGMA),
        Probe::new("Planck lensing", "CMB lensing power spectrum")
            .with_s8(0.832, 0.013)
            .with_omega_m(0.321, 0.017),
        Probe::new("BAO (BOSS DR12)", "Baryon acoustic oscillations")
            .with_h0(67.8, 1.3)
            .with_omega_m(0.310, 0.005),
        Probe::new(local_h0.label.clone(), "Distance ladder")
            .with_h0(local_h0.value, local_h0.sigma),
    ];
    if let Some(wl) = weak_lensing {
        probes.push(Probe::new(wl.label.clone(), "Cosmic shear").with_s8(wl.value, wl.sigma));
    }
    probes
}

/// Joint goodness of fit of `probes` to a single ΛCDM parameter set
///
/// Parameters measured by only one probe contribute zero χ² and zero dof.
/// At least one degree of freedom overall is required.
pub fn concordance(probes: &[Probe]) -> Result<ConcordanceResult> {
    let mut parameters = Vec::new();
    for parameter in Parameter::ALL {
        let measurements: Vec<Measurement> = probes
            .iter()
            .filter_map(|p| parameter.of(p).map(|c| (p, c)))
            .map(|(p, c)| Measurement::new(p.name.clone(), c.value, c.sigma))
            .collect::<Result<_>>()?;
        if measurements.is_empty() {
            continue;
        }
        let test = consistency_test(&measurements)?;
        tracing::debug!(
            %parameter,
            n = measurements.len(),
            chi2 = test.chi2,
            "parameter combined"
        );
        parameters.push(ParameterFit { parameter, test });
    }

    let total_chi2: f64 = parameters.iter().map(|p| p.test.chi2).sum();
    let total_dof: usize = parameters.iter().filter_map(|p| p.test.dof).sum();
    if total_dof == 0 {
        return Err(ValidationError::InsufficientData {
            what: "concordance (measurements of one parameter)",
            required: 2,
            actual: parameters
                .iter()
                .map(|p| p.test.labels.len())
                .max()
                .unwrap_or(0),
        }
        .into());
    }

    let chi2_per_dof = total_chi2 / total_dof as f64;
    let p = p_value(total_chi2, total_dof)?;
    let verdict = ConcordanceVerdict::from_chi2_per_dof(chi2_per_dof);
    tracing::info!(total_chi2, total_dof, %verdict, "concordance evaluated");

    Ok(ConcordanceResult {
        probes: probes.iter().map(|p| p.name.clone()).collect(),
        parameters,
        total_chi2,
        total_dof,
        chi2_per_dof,
        p_value: p,
        verdict,
    })
}

impl ConcordanceResult {
    pub fn fit(&self, parameter: Parameter) -> Option<&ParameterFit> {
        self.parameters.iter().find(|p| p.parameter == parameter)
    }

    pub fn to_report_string(&self) -> String {
        let mut out = String::new();
        for fit in &self.parameters {
            let t = &fit.test;
            out.push_str(&format!(
                "{:<8} {:.4} ± {:.4}  χ² = {:.2}  dof = {}  ({})\n",
                fit.parameter.to_string(),
                t.combination.mean,
                t.combination.sigma,
                t.chi2,
                t.dof.unwrap_or(0),
                t.labels.join(", ")
            ));
        }
        out.push_str(&format!(
            "\nTotal χ² = {:.2}, dof = {}, χ²/dof = {:.2}, p = {:.3}\n",
            self.total_chi2, self.total_dof, self.chi2_per_dof, self.p_value
        ));
        out.push_str(&format!("Concordance: {}\n", self.verdict));
        out
    }
}
