//! Physical constants and published reference measurements
//!
//! References:
//! - Planck: Planck Collaboration et al. 2020, A&A 641, A6
//! - SH0ES: Riess et al. 2022, ApJL 934, L7
//! - TRGB: Freedman et al. 2020, ApJ 891, 57

/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Horizon size today in Mpc, used to map resolution bits to cell sizes
pub const HORIZON_SIZE_TODAY_MPC: f64 = 14_000.0;

/// Highest redshift accepted by the correction and distance functions
pub const MAX_REDSHIFT: f64 = 10.0;

pub const PLANCK_H0: f64 = 67.36;
pub const PLANCK_H0_SIGMA: f64 = 0.54;
pub const PLANCK_OMEGA_M: f64 = 0.315;
pub const PLANCK_OMEGA_M_SIGMA: f64 = 0.007;
pub const PLANCK_OMEGA_LAMBDA: f64 = 0.685;
pub const PLANCK_SIGMA_8: f64 = 0.811;
pub const PLANCK_S8: f64 = 0.834;
pub const PLANCK_S8_SIGMA: f64 = 0.016;

pub const SHOES_H0: f64 = 73.04;
pub const SHOES_H0_SIGMA: f64 = 1.04;

pub const TRGB_H0: f64 = 69.8;
pub const TRGB_H0_SIGMA: f64 = 1.9;

/// H0 correction (km/s/Mpc) contributed at each resolution level of the
/// distance-ladder refinement: peculiar velocities, bulk flows, metallicity,
/// dust, population mixing, local extinction
pub const H0_CORRECTION_BY_RESOLUTION: [(u32, f64); 7] = [
    (8, 0.0),
    (12, -0.8),
    (16, -1.5),
    (20, -1.2),
    (24, -0.6),
    (28, -0.3),
    (32, -0.1),
];

/// Default correction amplitude A in ΔS8(z) = A·(1+z)^β
pub const UNIVERSAL_BASELINE: f64 = 0.0200;

/// Default redshift scaling exponent β
pub const REDSHIFT_SCALING_EXPONENT: f64 = -0.5;

/// Tensions below this many sigma count as resolved
pub const TENSION_CONVERGED_SIGMA: f64 = 2.0;

/// ΔT below this marks a systematic origin
pub const DELTA_T_CONVERGENCE_THRESHOLD: f64 = 0.15;

/// ΔT above this marks a non-converging tension
pub const DELTA_T_NEW_PHYSICS_THRESHOLD: f64 = 0.30;

/// Baseline std thresholds for the cross-survey classifier
pub const CONSISTENCY_EXCELLENT_STD: f64 = 0.003;
pub const CONSISTENCY_GOOD_STD: f64 = 0.005;

/// χ²/dof thresholds for the multi-probe verdict
pub const CONCORDANCE_EXCELLENT_CHI2_DOF: f64 = 1.5;
pub const CONCORDANCE_GOOD_CHI2_DOF: f64 = 2.0;

/// Planck S8 = σ8·sqrt(Ωm/0.3)
pub fn s8_from_sigma8(sigma_8: f64, omega_m: f64) -> f64 {
    sigma_8 * (omega_m / 0.3).sqrt()
}
