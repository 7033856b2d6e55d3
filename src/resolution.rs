//! Resolution schedules and convergence bookkeeping
//!
//! A resolution level N (bits per axis) maps to a cell size R_H / 2^N with
//! R_H = 14000 Mpc. The corrections contributed at each level are input data
//! supplied by the caller; this module only walks a schedule and checks how
//! the resulting values converge. It never derives per-level corrections.

use crate::constants::{
    DELTA_T_CONVERGENCE_THRESHOLD, DELTA_T_NEW_PHYSICS_THRESHOLD, HORIZON_SIZE_TODAY_MPC,
};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

type Result<T> = std::result::Result<T, ValidationError>;

pub const MIN_RESOLUTION_BITS: u32 = 8;
pub const MAX_RESOLUTION_BITS: u32 = 32;

/// Cells per physical scale when choosing a resolution for it
pub const DEFAULT_OVERSAMPLING: f64 = 20.0;

const SCHEDULE_NAMES: &str = "full, short, conservative, aggressive, coarse";

/// Named resolution schedule presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePreset {
    /// 8..32 in steps of 4
    Full,
    /// 8..24 in steps of 4
    Short,
    /// 8..28 in steps of 4
    Conservative,
    /// 8..32 in steps of 2
    Aggressive,
    /// 8, 16, 24, 32
    Coarse,
}

impl SchedulePreset {
    pub fn levels(self) -> Vec<u32> {
        match self {
            Self::Full => (8..=32).step_by(4).collect(),
            Self::Short => (8..=24).step_by(4).collect(),
            Self::Conservative => (8..=28).step_by(4).collect(),
            Self::Aggressive => (8..=32).step_by(2).collect(),
            Self::Coarse => vec![8, 16, 24, 32],
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "full" | "default" => Ok(Self::Full),
            "short" => Ok(Self::Short),
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            "coarse" => Ok(Self::Coarse),
            _ => Err(ValidationError::UnknownSchedule {
                name: name.to_string(),
                valid: SCHEDULE_NAMES.to_string(),
            }),
        }
    }
}

pub fn validate_bits(bits: u32) -> Result<()> {
    if !(MIN_RESOLUTION_BITS..=MAX_RESOLUTION_BITS).contains(&bits) {
        return Err(ValidationError::ResolutionOutOfRange {
            bits,
            min: MIN_RESOLUTION_BITS,
            max: MAX_RESOLUTION_BITS,
        });
    }
    Ok(())
}

/// Non-empty, within range, non-decreasing
pub fn validate_schedule(schedule: &[u32]) -> Result<()> {
    if schedule.is_empty() {
        return Err(ValidationError::InvalidSchedule(
            "schedule cannot be empty".to_string(),
        ));
    }
    for &bits in schedule {
        validate_bits(bits)?;
    }
    if schedule.windows(2).any(|w| w[0] > w[1]) {
        return Err(ValidationError::InvalidSchedule(
            "schedule must be monotonically increasing".to_string(),
        ));
    }
    Ok(())
}

/// Cell size in Mpc at `bits` resolution
pub fn cell_size_mpc(bits: u32) -> f64 {
    HORIZON_SIZE_TODAY_MPC / 2f64.powi(bits as i32)
}

/// N = ceil(log2(R_H / Δr)), clamped to [8, 32]
pub fn cell_size_to_resolution(cell_size_mpc: f64) -> Result<u32> {
    if !cell_size_mpc.is_finite() || cell_size_mpc <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "cell size",
            value: cell_size_mpc,
            range: "(0, inf) Mpc",
        });
    }
    let exact = (HORIZON_SIZE_TODAY_MPC / cell_size_mpc).log2().ceil();
    Ok(exact.clamp(MIN_RESOLUTION_BITS as f64, MAX_RESOLUTION_BITS as f64) as u32)
}

/// Resolution whose cells resolve `scale_mpc` into `oversampling` pieces
pub fn physical_scale_to_resolution(scale_mpc: f64, oversampling: f64) -> Result<u32> {
    if !oversampling.is_finite() || oversampling <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "oversampling",
            value: oversampling,
            range: "(0, inf)",
        });
    }
    cell_size_to_resolution(scale_mpc / oversampling)
}

/// Structure scale resolved at this level
pub fn scale_category(bits: u32) -> &'static str {
    match bits {
        0..=9 => "Supercluster",
        10..=13 => "Cluster",
        14..=17 => "Group",
        18..=21 => "Galaxy",
        22..=25 => "Subgalactic",
        26..=29 => "Stellar cluster",
        _ => "Stellar neighborhood",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionInfo {
    pub bits: u32,
    pub cell_size_mpc: f64,
    pub cell_size_kpc: f64,
    pub cell_size_pc: f64,
    pub category: String,
}

pub fn resolution_info(bits: u32) -> Result<ResolutionInfo> {
    validate_bits(bits)?;
    let mpc = cell_size_mpc(bits);
    Ok(ResolutionInfo {
        bits,
        cell_size_mpc: mpc,
        cell_size_kpc: mpc * 1e3,
        cell_size_pc: mpc * 1e6,
        category: scale_category(bits).to_string(),
    })
}

/// Values after each step of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleApplication {
    /// `None` marks the uncorrected starting point
    pub levels: Vec<Option<u32>>,
    pub values: Vec<f64>,
    pub corrections: Vec<f64>,
    pub final_value: f64,
    pub total_correction: f64,
}

/// Walk `schedule`, adding the correction listed for each level
///
/// Levels absent from `corrections` contribute nothing.
pub fn apply_schedule(
    initial: f64,
    schedule: &[u32],
    corrections: &BTreeMap<u32, f64>,
) -> Result<ScheduleApplication> {
    validate_schedule(schedule)?;

    let mut levels = vec![None];
    let mut values = vec![initial];
    let mut steps = vec![0.0];
    let mut current = initial;

    for &bits in schedule {
        let step = corrections.get(&bits).copied().unwrap_or(0.0);
        current += step;
        levels.push(Some(bits));
        values.push(current);
        steps.push(step);
    }

    Ok(ScheduleApplication {
        levels,
        values,
        corrections: steps,
        final_value: current,
        total_correction: current - initial,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceCheck {
    /// Final distance to target below the initial one
    pub converges: bool,
    pub reached_target: bool,
    /// Distance to target never increases
    pub monotonic: bool,
    pub initial_distance: f64,
    pub final_distance: f64,
}

pub fn check_convergence(values: &[f64], target: f64, tolerance: f64) -> ConvergenceCheck {
    let distances: Vec<f64> = values.iter().map(|v| (v - target).abs()).collect();
    let (Some(&first), Some(&last)) = (distances.first(), distances.last()) else {
        return ConvergenceCheck {
            converges: false,
            reached_target: false,
            monotonic: false,
            initial_distance: f64::INFINITY,
            final_distance: f64::INFINITY,
        };
    };

    if distances.len() < 2 {
        return ConvergenceCheck {
            converges: false,
            reached_target: false,
            monotonic: false,
            initial_distance: first,
            final_distance: last,
        };
    }

    ConvergenceCheck {
        converges: last < first,
        reached_target: last < tolerance,
        monotonic: distances.windows(2).all(|w| w[0] >= w[1]),
        initial_distance: first,
        final_distance: last,
    }
}

/// Epistemic distance ΔT = (1 - r) + 0.3·|ΔX| / (T₀ + 0.01)
///
/// r is the fractional tension reduction (T₀ - T₁)/T₀ and ΔX the applied
/// correction. An ad hoc convergence heuristic, not a statistic: small when
/// a modest correction removes most of the tension. Zero when T₀ is zero.
pub fn epistemic_distance(initial_tension: f64, final_tension: f64, correction: f64) -> f64 {
    if initial_tension == 0.0 {
        return 0.0;
    }
    let reduction = (initial_tension - final_tension) / initial_tension;
    let penalty = correction.abs() / (initial_tension + 0.01);
    (1.0 - reduction) + 0.3 * penalty
}

/// Reading of the epistemic distance ΔT at the end of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeltaTVerdict {
    /// ΔT < 0.15
    Systematic,
    Inconclusive,
    /// ΔT > 0.30
    NewPhysics,
}

impl DeltaTVerdict {
    pub fn classify(delta_t: f64) -> Self {
        Self::classify_with(
            delta_t,
            DELTA_T_CONVERGENCE_THRESHOLD,
            DELTA_T_NEW_PHYSICS_THRESHOLD,
        )
    }

    /// Same as [`classify`](Self::classify) with caller-chosen cut points
    pub fn classify_with(delta_t: f64, systematic_below: f64, new_physics_above: f64) -> Self {
        if delta_t < systematic_below {
            Self::Systematic
        } else if delta_t > new_physics_above {
            Self::NewPhysics
        } else {
            Self::Inconclusive
        }
    }
}

impl fmt::Display for DeltaTVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Systematic => "SYSTEMATIC",
            Self::Inconclusive => "INCONCLUSIVE",
            Self::NewPhysics => "NEW_PHYSICS",
        };
        f.write_str(s)
    }
}
