// Cross-survey consistency classifier
//
// Judges whether independent surveys recover the same correction baseline.
// Pure threshold logic on the population standard deviation of the baselines.

use crate::constants::{CONSISTENCY_EXCELLENT_STD, CONSISTENCY_GOOD_STD};
use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsistencyStatus {
    /// std < 0.003
    Excellent,
    /// std < 0.005
    Good,
    Marginal,
}

impl ConsistencyStatus {
    pub fn from_std(std: f64) -> Self {
        if std < CONSISTENCY_EXCELLENT_STD {
            Self::Excellent
        } else if std < CONSISTENCY_GOOD_STD {
            Self::Good
        } else {
            Self::Marginal
        }
    }

    pub fn is_consistent(self) -> bool {
        matches!(self, Self::Excellent | Self::Good)
    }

    pub fn interpretation(self) -> &'static str {
        match self {
            Self::Excellent => "All surveys show statistically identical patterns",
            Self::Good => "Strong consistency across surveys",
            Self::Marginal => "Some pattern variation observed",
        }
    }
}

impl fmt::Display for ConsistencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Marginal => "MARGINAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub baselines: BTreeMap<String, f64>,
    pub mean_baseline: f64,
    pub std_baseline: f64,
    pub max_difference: f64,
    pub range: (f64, f64),
    pub status: ConsistencyStatus,
    pub consistent: bool,
}

/// Classify the scatter of per-survey baselines
pub fn classify_consistency(baselines: &BTreeMap<String, f64>) -> Result<ConsistencyReport> {
    if baselines.is_empty() {
        return Err(ValidationError::InsufficientData {
            what: "consistency classification",
            required: 1,
            actual: 0,
        }
        .into());
    }

    let values: Vec<f64> = baselines.values().copied().collect();
    let mean_baseline = values.iter().mean();
    let std_baseline = values.iter().population_std_dev();
    let max_difference = values
        .iter()
        .map(|v| (v - mean_baseline).abs())
        .fold(0.0, f64::max);
    let range = (
        values.iter().copied().fold(f64::INFINITY, f64::min),
        values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );
    let status = ConsistencyStatus::from_std(std_baseline);

    Ok(ConsistencyReport {
        baselines: baselines.clone(),
        mean_baseline,
        std_baseline,
        max_difference,
        range,
        status,
        consistent: status.is_consistent(),
    })
}
