//! concordia - cross-survey cosmology tension analysis
//!
//! This library applies redshift-dependent corrections of the form
//! ΔS8(z) = A·(1+z)^β to published weak-lensing results (KiDS-1000, DES-Y3,
//! HSC-Y3), measures tensions against reference measurements in units of σ,
//! checks that independent surveys recover the same correction, and fits
//! CMB, BAO, distance-ladder and lensing probes jointly.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod correction;
pub mod cosmology;
pub mod error;
pub mod report;
pub mod resolution;
pub mod survey;
pub mod tension;
