// Survey, cross-survey, H0 and multi-probe analyses
//
// Pulls the numerical layers together. Every survey goes through the same
// `analyze_survey` path; results are combined across surveys and then,
// with the corrected distance-ladder H0, across probes.

mod concordance;
mod cross_survey;
mod hubble;
mod per_survey;

pub use concordance::{
    concordance, default_probes, ConcordanceResult, ConcordanceVerdict, Constraint, Parameter,
    ParameterFit, Probe,
};
pub use cross_survey::{validate_cross_survey, CombinedS8, CrossSurveyValidation};
pub use hubble::{analyze_hubble, DistanceLadder, HubbleAnalysis};
pub use per_survey::{analyze_survey, BinResult, ScheduleWalk, SurveyAnalysis};

#[cfg(test)]
mod tests;
