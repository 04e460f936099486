use serde::{Deserialize, Serialize};

use crate::Value;

/// Tuning knobs for the adaptive penalty coefficients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PenaltyParams {
    /// Multiplier applied to a coefficient when too few recent solutions
    /// were feasible with respect to its constraint.
    pub penalty_increase: f64,

    /// Multiplier applied when enough recent solutions were feasible.
    pub penalty_decrease: f64,

    /// Fraction of recent solutions that should be feasible.
    pub target_feasible: f64,
}

impl Default for PenaltyParams {
    fn default() -> Self {
        PenaltyParams {
            penalty_increase: 1.34,
            penalty_decrease: 0.32,
            target_feasible: 0.43,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Initial coefficient for the excess-load penalty.
    pub initial_capacity_penalty: Value,

    /// Initial coefficient for the time-warp penalty.
    pub initial_time_warp_penalty: Value,

    /// Overrides the vehicle count of the instance when set.
    pub nb_vehicles: Option<usize>,

    /// Number of nearest neighbours each client is evaluated against
    /// during local search.
    pub nb_granular: usize,

    pub penalty: PenaltyParams,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            initial_capacity_penalty: 20,
            initial_time_warp_penalty: 6,
            nb_vehicles: None,
            nb_granular: 20,
            penalty: PenaltyParams::default(),
        }
    }
}
