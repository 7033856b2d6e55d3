//! JSON report envelope and on-disk persistence
//!
//! Every command result is wrapped in a [`Report`] carrying the crate version,
//! a format tag and the kind of result, so saved files can be read back
//! (e.g. survey results fed into a later cross-survey run).

use crate::analysis::SurveyAnalysis;
use crate::error::{AnalysisError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_FORMAT: &str = "concordia-json-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Survey,
    CrossSurvey,
    Concordance,
    Hubble,
    Tension,
    Combination,
    Distances,
    BaselineFit,
    Resolution,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Survey => "survey",
            Self::CrossSurvey => "cross-survey",
            Self::Concordance => "concordance",
            Self::Hubble => "hubble",
            Self::Tension => "tension",
            Self::Combination => "combination",
            Self::Distances => "distances",
            Self::BaselineFit => "baseline-fit",
            Self::Resolution => "resolution",
        };
        f.write_str(s)
    }
}

/// Versioned wrapper around one command result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    /// Crate version that produced the report
    pub version: String,
    /// Format identifier (`concordia-json-v1`)
    pub format: String,
    pub kind: ReportKind,
    pub result: T,
}

impl<T> Report<T> {
    pub fn new(kind: ReportKind, result: T) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: REPORT_FORMAT.to_string(),
            kind,
            result,
        }
    }
}

impl<T: Serialize> Report<T> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Write `report` as pretty-printed JSON
pub fn write_report<T: Serialize>(path: &Path, report: &Report<T>) -> Result<()> {
    let json = report.to_json()?;
    fs::write(path, json + "\n")?;
    tracing::info!(path = %path.display(), kind = %report.kind, "report written");
    Ok(())
}

/// Read a report and check its format tag and kind
pub fn read_report<T: DeserializeOwned>(path: &Path, kind: ReportKind) -> Result<Report<T>> {
    let content = fs::read_to_string(path)?;
    let report: Report<T> = serde_json::from_str(&content)?;
    if report.format != REPORT_FORMAT {
        return Err(AnalysisError::UnsupportedReport {
            expected: REPORT_FORMAT.to_string(),
            found: report.format,
        });
    }
    if report.kind != kind {
        return Err(AnalysisError::UnsupportedReport {
            expected: kind.to_string(),
            found: report.kind.to_string(),
        });
    }
    Ok(report)
}

/// Load saved survey results for a cross-survey run
pub fn load_survey_analyses(paths: &[PathBuf]) -> Result<Vec<SurveyAnalysis>> {
    paths
        .iter()
        .map(|p| read_report::<SurveyAnalysis>(p, ReportKind::Survey).map(|r| r.result))
        .collect()
}

/// `des_results.json` / `cross_survey_validation.json` style names
pub fn default_file_name(kind: ReportKind, stem: &str) -> String {
    let stem = stem.to_ascii_lowercase().replace('-', "_");
    match kind {
        ReportKind::CrossSurvey => format!("{}_validation.json", stem),
        _ => format!("{}_results.json", stem),
    }
}
