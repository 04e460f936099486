use crate::{
    config::{PenaltyParams, SolverConfig},
    Cost, Value,
};

/// Maps constraint violations to cost penalties. The two coefficients are
/// tunable between search iterations so the search can drift through the
/// infeasible region without getting stuck there.
#[derive(Debug, Clone)]
pub struct PenaltyManager {
    vehicle_capacity: Value,
    capacity_penalty: Value,
    time_warp_penalty: Value,
    params: PenaltyParams,
}

const MIN_PENALTY: Value = 1;
const MAX_PENALTY: Value = 100_000;

impl PenaltyManager {
    pub fn new(
        vehicle_capacity: Value,
        capacity_penalty: Value,
        time_warp_penalty: Value,
        params: PenaltyParams,
    ) -> Self {
        PenaltyManager {
            vehicle_capacity,
            capacity_penalty: capacity_penalty.clamp(MIN_PENALTY, MAX_PENALTY),
            time_warp_penalty: time_warp_penalty.clamp(MIN_PENALTY, MAX_PENALTY),
            params,
        }
    }

    /// Sets up the manager with a config's initial coefficients and
    /// tuning parameters.
    pub fn from_config(vehicle_capacity: Value, config: &SolverConfig) -> Self {
        PenaltyManager::new(
            vehicle_capacity,
            config.initial_capacity_penalty,
            config.initial_time_warp_penalty,
            config.penalty,
        )
    }

    /// Penalty for carrying the given load on one route. Zero while the
    /// load fits the vehicle.
    #[inline]
    pub fn load_penalty(&self, load: Value) -> Cost {
        let excess = (load - self.vehicle_capacity).max(0);
        excess as Cost * self.capacity_penalty as Cost
    }

    #[inline]
    pub fn tw_penalty(&self, time_warp: Value) -> Cost {
        time_warp as Cost * self.time_warp_penalty as Cost
    }

    pub fn capacity_penalty(&self) -> Value {
        self.capacity_penalty
    }

    pub fn time_warp_penalty(&self) -> Value {
        self.time_warp_penalty
    }

    /// Nudges the excess-load coefficient toward the target feasibility
    /// ratio, given the fraction of recent solutions that were
    /// load-feasible.
    pub fn update_capacity_penalty(&mut self, feasible_fraction: f64) {
        self.capacity_penalty = self.compute(self.capacity_penalty, feasible_fraction);
    }

    /// Same as [`Self::update_capacity_penalty`], for the time-warp
    /// coefficient.
    pub fn update_time_warp_penalty(&mut self, feasible_fraction: f64) {
        self.time_warp_penalty = self.compute(self.time_warp_penalty, feasible_fraction);
    }

    fn compute(&self, penalty: Value, feasible_fraction: f64) -> Value {
        let diff = self.params.target_feasible - feasible_fraction;

        // Close enough to target; leave the coefficient alone.
        if diff.abs() < 0.05 {
            return penalty;
        }

        let scaled = if diff > 0.0 {
            // Too many infeasible solutions: push the penalty up. The +1
            // keeps a coefficient of 1 from sticking at 1 forever.
            penalty as f64 * self.params.penalty_increase + 1.0
        } else {
            penalty as f64 * self.params.penalty_decrease
        };

        (scaled.round() as Value).clamp(MIN_PENALTY, MAX_PENALTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(capacity_penalty: Value, time_warp_penalty: Value) -> PenaltyManager {
        PenaltyManager::new(10, capacity_penalty, time_warp_penalty, PenaltyParams::default())
    }

    #[test]
    fn test_from_config_uses_initial_coefficients() {
        let config = SolverConfig::default();
        let pm = PenaltyManager::from_config(10, &config);

        assert_eq!(pm.capacity_penalty(), config.initial_capacity_penalty);
        assert_eq!(pm.time_warp_penalty(), config.initial_time_warp_penalty);
    }

    #[test]
    fn test_load_penalty_is_zero_within_capacity() {
        let pm = manager(20, 6);

        assert_eq!(pm.load_penalty(0), 0);
        assert_eq!(pm.load_penalty(10), 0);
    }

    #[test]
    fn test_load_penalty_scales_with_excess() {
        let pm = manager(20, 6);

        assert_eq!(pm.load_penalty(11), 20);
        assert_eq!(pm.load_penalty(18), 160);
    }

    #[test]
    fn test_tw_penalty_scales_with_warp() {
        let pm = manager(20, 6);

        assert_eq!(pm.tw_penalty(0), 0);
        assert_eq!(pm.tw_penalty(2087), 6 * 2087);
    }

    #[test]
    fn test_penalty_products_use_wide_accumulator() {
        let pm = manager(100_000, 100_000);

        // Well past i32 range; must not wrap.
        assert_eq!(pm.tw_penalty(Value::MAX), Value::MAX as Cost * 100_000);
    }

    #[test]
    fn test_update_increases_when_too_infeasible() {
        let mut pm = manager(20, 6);

        pm.update_capacity_penalty(0.0);
        assert_eq!(pm.capacity_penalty(), 28); // 20 * 1.34 + 1, rounded

        pm.update_time_warp_penalty(0.1);
        assert_eq!(pm.time_warp_penalty(), 9);
    }

    #[test]
    fn test_update_decreases_when_too_feasible() {
        let mut pm = manager(20, 6);

        pm.update_capacity_penalty(1.0);
        assert_eq!(pm.capacity_penalty(), 6); // 20 * 0.32, rounded

        pm.update_time_warp_penalty(1.0);
        assert_eq!(pm.time_warp_penalty(), 2);
    }

    #[test]
    fn test_update_keeps_coefficient_near_target() {
        let mut pm = manager(20, 6);

        pm.update_capacity_penalty(0.43);
        assert_eq!(pm.capacity_penalty(), 20);
    }

    #[test]
    fn test_update_never_drops_below_one() {
        let mut pm = manager(1, 1);

        pm.update_capacity_penalty(1.0);
        assert_eq!(pm.capacity_penalty(), 1);
    }
}
