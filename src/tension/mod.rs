// Tension and consistency statistics for independent measurements
//
// Everything here is a textbook formula over (value, sigma) pairs:
// - pairwise tension in units of the combined standard deviation
// - inverse-variance weighted combination
// - chi-squared against the combined mean and its p-value (statrs)
// - tension reduction bookkeeping after a correction is applied
// - threshold classification of cross-survey baseline scatter
//
// All inputs are validated: every sigma must be finite and > 0.

mod consistency;
mod reduction;
mod statistics;

pub use consistency::{classify_consistency, ConsistencyReport, ConsistencyStatus};
pub use reduction::{evaluate_reduction, TensionReduction};
pub use statistics::{
    chi_squared, consistency_test, p_value, tension_sigma, weighted_combination,
    ConsistencyTest, Measurement, WeightedCombination,
};

#[cfg(test)]
mod tests;
