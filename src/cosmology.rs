//! Flat-universe distance approximations and coordinate conversions
//!
//! The distances here are low-order approximations, not redshift integrals:
//!
//! ```text
//! D_H = c / H0
//! D_A ≈ D_H · z/(1+z) · (1 + 0.5·Ωm·z)
//! D_C = D_A · (1+z)
//! D_L = D_A · (1+z)²
//! ```
//!
//! These are the forms the published analyses used, and they are kept for
//! that reason. They overestimate: against the flat ΛCDM integral
//! ([`Cosmology::comoving_distance_integrated`]) the comoving distance is 4%
//! high at z = 0.1, 23% high at z = 0.5 and 51% high at z = 1. Only the
//! z ≲ 0.1 regime is good to 5%. Use the integrated form where accuracy
//! matters.

use crate::constants::{PLANCK_H0, PLANCK_OMEGA_LAMBDA, PLANCK_OMEGA_M, SPEED_OF_LIGHT_KM_S};
use crate::error::{ensure_redshift, ValidationError};
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, ValidationError>;

/// Tolerance on |Ωm + Ω_Λ - 1|
pub const FLATNESS_TOLERANCE: f64 = 0.01;

/// Validated flat-universe parameter set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    /// Hubble constant in km/s/Mpc
    pub h0: f64,
    pub omega_m: f64,
    pub omega_lambda: f64,
}

/// Distances at one redshift, all in Mpc
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distances {
    pub z: f64,
    pub hubble_mpc: f64,
    pub angular_diameter_mpc: f64,
    pub comoving_mpc: f64,
    pub luminosity_mpc: f64,
    /// Reference value from the redshift integral
    pub comoving_integrated_mpc: f64,
}

impl Cosmology {
    /// Build a flat cosmology, Ω_Λ = 1 - Ωm
    pub fn flat(h0: f64, omega_m: f64) -> Result<Self> {
        Self::new(h0, omega_m, 1.0 - omega_m)
    }

    pub fn new(h0: f64, omega_m: f64, omega_lambda: f64) -> Result<Self> {
        let cosmo = Self {
            h0,
            omega_m,
            omega_lambda,
        };
        cosmo.validate()?;
        Ok(cosmo)
    }

    pub fn planck() -> Self {
        Self {
            h0: PLANCK_H0,
            omega_m: PLANCK_OMEGA_M,
            omega_lambda: PLANCK_OMEGA_LAMBDA,
        }
    }

    /// Check parameter ranges and the flatness constraint
    pub fn validate(&self) -> Result<()> {
        if !self.h0.is_finite() || !(40.0 < self.h0 && self.h0 < 100.0) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "H0",
                value: self.h0,
                range: "(40, 100) km/s/Mpc",
            });
        }
        check_density("Omega_m", self.omega_m)?;
        check_density("Omega_lambda", self.omega_lambda)?;

        let total = self.omega_m + self.omega_lambda;
        if (total - 1.0).abs() > FLATNESS_TOLERANCE {
            return Err(ValidationError::NotFlat { total });
        }
        Ok(())
    }

    /// Hubble distance c/H0 in Mpc
    pub fn hubble_distance(&self) -> f64 {
        SPEED_OF_LIGHT_KM_S / self.h0
    }

    pub fn angular_diameter_distance(&self, z: f64) -> Result<f64> {
        ensure_redshift(z)?;
        Ok(self.hubble_distance() * z / (1.0 + z) * (1.0 + 0.5 * self.omega_m * z))
    }

    pub fn comoving_distance(&self, z: f64) -> Result<f64> {
        Ok(self.angular_diameter_distance(z)? * (1.0 + z))
    }

    pub fn luminosity_distance(&self, z: f64) -> Result<f64> {
        Ok(self.angular_diameter_distance(z)? * (1.0 + z).powi(2))
    }

    /// Comoving distance from D_H ∫ dz/E(z), E(z) = sqrt(Ωm(1+z)³ + Ω_Λ)
    ///
    /// Composite Simpson rule, radiation neglected.
    pub fn comoving_distance_integrated(&self, z: f64) -> Result<f64> {
        ensure_redshift(z)?;
        if z == 0.0 {
            return Ok(0.0);
        }
        const STEPS: usize = 1024;
        let h = z / STEPS as f64;
        let inv_e = |x: f64| {
            1.0 / (self.omega_m * (1.0 + x).powi(3) + self.omega_lambda).sqrt()
        };
        let mut sum = inv_e(0.0) + inv_e(z);
        for i in 1..STEPS {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * inv_e(i as f64 * h);
        }
        Ok(self.hubble_distance() * sum * h / 3.0)
    }

    pub fn distances(&self, z: f64) -> Result<Distances> {
        let d_a = self.angular_diameter_distance(z)?;
        Ok(Distances {
            z,
            hubble_mpc: self.hubble_distance(),
            angular_diameter_mpc: d_a,
            comoving_mpc: d_a * (1.0 + z),
            luminosity_mpc: d_a * (1.0 + z).powi(2),
            comoving_integrated_mpc: self.comoving_distance_integrated(z)?,
        })
    }

    /// Comoving extent in Mpc subtended by `theta_arcmin` at `z_eff`
    pub fn angular_to_comoving_scale(&self, theta_arcmin: f64, z_eff: f64) -> Result<f64> {
        let theta_rad = (theta_arcmin / 60.0).to_radians();
        Ok(theta_rad * self.comoving_distance(z_eff)?)
    }

    /// Angle in arcmin subtended by a comoving extent at `z_eff`
    pub fn comoving_to_angular_scale(&self, scale_mpc: f64, z_eff: f64) -> Result<f64> {
        let d_a = self.angular_diameter_distance(z_eff)?;
        if d_a <= 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "z_eff",
                value: z_eff,
                range: "(0, inf)",
            });
        }
        let physical = scale_mpc / (1.0 + z_eff);
        Ok((physical / d_a).to_degrees() * 60.0)
    }
}

impl Default for Cosmology {
    fn default() -> Self {
        Self::planck()
    }
}

fn check_density(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0 < value && value < 1.0) {
        return Err(ValidationError::ParameterOutOfRange {
            name,
            value,
            range: "(0, 1)",
        });
    }
    Ok(())
}

/// a = 1/(1+z)
pub fn redshift_to_scale_factor(z: f64) -> Result<f64> {
    ensure_redshift(z)?;
    Ok(1.0 / (1.0 + z))
}

/// z = 1/a - 1, a in (0, 1]
pub fn scale_factor_to_redshift(a: f64) -> Result<f64> {
    if !a.is_finite() || a <= 0.0 || a > 1.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "scale factor",
            value: a,
            range: "(0, 1]",
        });
    }
    Ok(1.0 / a - 1.0)
}

/// Equatorial position plus comoving distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub distance_mpc: f64,
}

impl SkyPosition {
    pub fn new(ra_deg: f64, dec_deg: f64, distance_mpc: f64) -> Result<Self> {
        if !ra_deg.is_finite() || !(0.0..360.0).contains(&ra_deg) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "RA",
                value: ra_deg,
                range: "[0, 360) deg",
            });
        }
        if !dec_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(ValidationError::ParameterOutOfRange {
                name: "Dec",
                value: dec_deg,
                range: "[-90, 90] deg",
            });
        }
        if !distance_mpc.is_finite() || distance_mpc < 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "distance",
                value: distance_mpc,
                range: "[0, inf) Mpc",
            });
        }
        Ok(Self {
            ra_deg,
            dec_deg,
            distance_mpc,
        })
    }

    /// x toward RA=0/Dec=0, y toward RA=90°, z toward the north pole
    pub fn to_cartesian(&self) -> [f64; 3] {
        let (ra, dec) = (self.ra_deg.to_radians(), self.dec_deg.to_radians());
        [
            self.distance_mpc * dec.cos() * ra.cos(),
            self.distance_mpc * dec.cos() * ra.sin(),
            self.distance_mpc * dec.sin(),
        ]
    }

    pub fn from_cartesian(x: f64, y: f64, z: f64) -> Result<Self> {
        let distance_mpc = (x * x + y * y + z * z).sqrt();
        if distance_mpc == 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "distance",
                value: 0.0,
                range: "(0, inf) Mpc",
            });
        }
        let dec_deg = (z / distance_mpc).asin().to_degrees();
        let mut ra_deg = y.atan2(x).to_degrees();
        if ra_deg < 0.0 {
            ra_deg += 360.0;
        }
        Ok(Self {
            ra_deg,
            dec_deg,
            distance_mpc,
        })
    }
}
