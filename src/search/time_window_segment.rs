use crate::{problem::ProblemData, Value};

/// Timing summary of a contiguous stretch of visits.
///
/// A segment knows how long it takes to traverse, how much time warp is
/// already locked in, and the window `[tw_early, tw_late]` of feasible
/// start times that realize that warp. Two adjacent segments combine in
/// O(1) with [`TimeWindowSegment::merge`], and merging is associative, so
/// any prefix/suffix/interior summary of a route can be assembled from
/// smaller pieces in whatever order is convenient.
///
/// All arithmetic saturates: a pathological instance can pile up more warp
/// than fits the value domain, and a saturated summary is still ordered
/// correctly against cheaper alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowSegment {
    /// First client of the segment. Only used to look up travel distances
    /// when merging.
    idx_first: usize,
    /// Last client of the segment.
    idx_last: usize,
    /// Total time from arrival at the first client to departure from the
    /// last, absent warp corrections.
    duration: Value,
    /// Time warp already incurred within this segment.
    time_warp: Value,
    /// Earliest start of service at the first client achieving
    /// `time_warp`.
    tw_early: Value,
    /// Latest such start.
    tw_late: Value,
}

impl TimeWindowSegment {
    /// Summary of visiting a single client.
    pub fn singleton(data: &ProblemData, client: usize) -> Self {
        let c = data.client(client);

        TimeWindowSegment {
            idx_first: client,
            idx_last: client,
            duration: c.service_duration,
            time_warp: 0,
            tw_early: c.tw_early,
            tw_late: c.tw_late,
        }
    }

    /// Combines `first` and `second` into the summary of traversing
    /// `first` and then `second`, including the travel leg between them.
    pub fn merge(data: &ProblemData, first: Self, second: Self) -> Self {
        let dist = data.dist(first.idx_last, second.idx_first);

        // Arrival offset at `second`, relative to the service start at
        // `first`.
        let delta = first
            .duration
            .saturating_sub(first.time_warp)
            .saturating_add(dist);

        let delta_wait = second
            .tw_early
            .saturating_sub(delta)
            .saturating_sub(first.tw_late)
            .max(0);

        let delta_warp = first
            .tw_early
            .saturating_add(delta)
            .saturating_sub(second.tw_late)
            .max(0);

        TimeWindowSegment {
            idx_first: first.idx_first,
            idx_last: second.idx_last,
            duration: first
                .duration
                .saturating_add(second.duration)
                .saturating_add(dist)
                .saturating_add(delta_wait),
            time_warp: first
                .time_warp
                .saturating_add(second.time_warp)
                .saturating_add(delta_warp),
            tw_early: second
                .tw_early
                .saturating_sub(delta)
                .max(first.tw_early)
                .saturating_sub(delta_warp),
            tw_late: second
                .tw_late
                .saturating_sub(delta)
                .min(first.tw_late)
                .saturating_add(delta_wait),
        }
    }

    /// Minimum total time warp over the whole segment.
    pub fn total_time_warp(&self) -> Value {
        self.time_warp
            .saturating_add(self.tw_early.saturating_sub(self.tw_late).max(0))
    }

    pub fn duration(&self) -> Value {
        self.duration
    }

    pub fn tw_early(&self) -> Value {
        self.tw_early
    }

    pub fn tw_late(&self) -> Value {
        self.tw_late
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::problem::Client;
    use crate::test_utils;

    type Tws = TimeWindowSegment;

    #[test]
    fn test_singleton_mirrors_client() {
        let data = test_utils::ok_small();
        let tws = Tws::singleton(&data, 1);

        assert_eq!(tws.duration(), 360);
        assert_eq!(tws.tw_early(), 15_600);
        assert_eq!(tws.tw_late(), 22_500);
        assert_eq!(tws.total_time_warp(), 0);
    }

    #[test]
    fn test_merge_without_warp_or_wait() {
        let data = test_utils::ok_small();

        // Depot, then client 1. The depot window is wide open, so the only
        // effect is shifting the start window back by the travel leg.
        let merged = Tws::merge(&data, Tws::singleton(&data, 0), Tws::singleton(&data, 1));

        assert_eq!(merged.duration(), 360 + 1_544);
        assert_eq!(merged.total_time_warp(), 0);
        assert_eq!(merged.tw_early(), 15_600 - 1_544);
        assert_eq!(merged.tw_late(), 22_500 - 1_544);
    }

    #[test]
    fn test_merge_locks_in_time_warp() {
        let data = test_utils::ok_small();

        // Depot -> 1 -> 3. Service at 1 cannot start before 15'600, takes
        // 360, and the leg to 3 is 1'427; client 3 closes at 15'300, so
        // 2'087 units of warp are unavoidable.
        let prefix = Tws::merge(&data, Tws::singleton(&data, 0), Tws::singleton(&data, 1));
        let merged = Tws::merge(&data, prefix, Tws::singleton(&data, 3));

        assert_eq!(merged.total_time_warp(), 2_087);

        // Closing the route at the depot adds nothing on top.
        let closed = Tws::merge(&data, merged, Tws::singleton(&data, 0));
        assert_eq!(closed.total_time_warp(), 2_087);
    }

    #[test]
    fn test_merge_is_associative() {
        let data = test_utils::ok_small();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..250 {
            let a = Tws::singleton(&data, rng.random_range(0..=4));
            let b = Tws::singleton(&data, rng.random_range(0..=4));
            let c = Tws::singleton(&data, rng.random_range(0..=4));

            let left = Tws::merge(&data, Tws::merge(&data, a, b), c);
            let right = Tws::merge(&data, a, Tws::merge(&data, b, c));

            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_huge_warp_saturates_instead_of_wrapping() {
        // Alternating visits that open at the end of the value domain and
        // close at its start force close to `Value::MAX` units of warp per
        // pair; chaining two pairs overflows any non-saturating i32 sum.
        let late = Client::new(0, 0, 0, 0, Value::MAX - 1, Value::MAX - 1);
        let early = Client::new(0, 0, 0, 0, 0, 0);

        let clients = vec![late, early, late, early];
        let data = ProblemData::from_coords(clients, 1, 10).unwrap();

        let mut tws = Tws::singleton(&data, 0);
        for client in 1..4 {
            tws = Tws::merge(&data, tws, Tws::singleton(&data, client));
        }

        assert_eq!(tws.total_time_warp(), Value::MAX);
    }
}
