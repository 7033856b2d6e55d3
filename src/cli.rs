//! CLI argument parsing for concordia

use crate::analysis::DistanceLadder;
use crate::constants::{PLANCK_H0, PLANCK_OMEGA_M};
use crate::resolution::{SchedulePreset, DEFAULT_OVERSAMPLING};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON report on stdout
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "concordia")]
#[command(version)]
#[command(about = "Cross-survey cosmology tension analysis", long_about = None)]
pub struct Cli {
    /// Analysis configuration (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Survey registry (TOML) used instead of the built-in KiDS/DES/HSC pack
    #[arg(long, global = true, value_name = "FILE")]
    pub surveys: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the redshift correction to one survey and measure the tension change
    Survey {
        /// Survey key or name fragment (e.g. kids, DES, hsc-y3)
        name: String,

        /// Override the correction baseline amplitude
        #[arg(long, value_name = "A")]
        baseline: Option<f64>,

        /// Write the JSON report to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Check that all surveys recover the same correction baseline
    CrossSurvey {
        /// Saved survey reports; analyses every registry survey when omitted
        #[arg(value_name = "REPORT")]
        reports: Vec<PathBuf>,

        /// Write the JSON report to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Walk the distance-ladder H0 through the resolution schedule
    Hubble {
        /// Local H0 measurement to correct
        #[arg(long, value_enum, default_value = "shoes")]
        ladder: DistanceLadder,

        /// Write the JSON report to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Tension in σ between two measurements
    Tension {
        v1: f64,
        s1: f64,
        v2: f64,
        s2: f64,
    },

    /// Inverse-variance combination with χ² and p-value
    Combine {
        /// Measured value (repeat for each measurement)
        #[arg(long = "value", required = true, allow_negative_numbers = true)]
        values: Vec<f64>,

        /// 1σ uncertainty, one per --value
        #[arg(long = "sigma", required = true)]
        sigmas: Vec<f64>,

        /// Optional label, one per --value
        #[arg(long = "label")]
        labels: Vec<String>,
    },

    /// Joint ΛCDM fit of CMB, BAO, distance ladder and weak lensing
    Concordance {
        /// Leave the combined weak-lensing result out of the fit
        #[arg(long)]
        without_lensing: bool,

        /// Write the JSON report to FILE
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Hubble, angular-diameter, comoving and luminosity distances
    Distance {
        /// Redshift
        #[arg(long)]
        z: f64,

        /// Hubble constant in km/s/Mpc
        #[arg(long, default_value_t = PLANCK_H0)]
        h0: f64,

        /// Matter density (flat universe)
        #[arg(long, default_value_t = PLANCK_OMEGA_M)]
        omega_m: f64,
    },

    /// Recover the baseline amplitude from observed corrections
    FitBaseline {
        /// Effective redshifts, comma separated
        #[arg(long, required = true, value_delimiter = ',')]
        z: Vec<f64>,

        /// Observed corrections, comma separated
        #[arg(long = "correction", required = true, value_delimiter = ',', allow_negative_numbers = true)]
        corrections: Vec<f64>,
    },

    /// Cell sizes, optimal resolution, and schedule walks
    #[command(group(
        ArgGroup::new("target")
            .required(true)
            .multiple(true)
            .args(["scale_mpc", "bits", "schedule"])
    ))]
    Resolution {
        /// Physical scale to resolve, in Mpc (not with --bits)
        #[arg(long, value_name = "MPC")]
        scale_mpc: Option<f64>,

        /// Resolution level to describe
        #[arg(long, value_name = "N")]
        bits: Option<u32>,

        /// Walk a schedule preset with the configured per-level corrections
        #[arg(long, value_enum)]
        schedule: Option<SchedulePreset>,

        /// Starting value for --schedule (requires --schedule)
        #[arg(long, allow_negative_numbers = true)]
        initial: Option<f64>,

        /// Cells across the physical scale
        #[arg(long, default_value_t = DEFAULT_OVERSAMPLING)]
        oversampling: f64,
    },
}
