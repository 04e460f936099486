use crate::define_index_newtype;
use crate::search::node::NodeIdx;
use crate::Value;

define_index_newtype!(RouteIdx, Route);

/// One vehicle's tour in the working representation: the client nodes
/// between its two depot sentinels, plus the prefix caches that make the
/// segment queries cheap.
///
/// Mutations go through [`super::WorkingSolution`], which splices the
/// linked nodes and marks the affected routes dirty. Queries on a dirty
/// route are programming errors; `WorkingSolution::update` rebuilds every
/// cache from the links.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) idx: RouteIdx,
    pub(crate) start: NodeIdx,
    pub(crate) end: NodeIdx,

    /// Node at each position, sentinels included: `visits[0]` is the start
    /// depot, `visits[size + 1]` the end depot.
    pub(crate) visits: Vec<NodeIdx>,
    /// `cum_dist[p]` is the travel distance from the start depot to
    /// position `p`.
    pub(crate) cum_dist: Vec<Value>,
    /// `cum_load[p]` is the total demand of positions `0..=p`.
    pub(crate) cum_load: Vec<Value>,

    pub(crate) load: Value,
    pub(crate) time_warp: Value,
    pub(crate) overloaded: bool,
    pub(crate) dirty: bool,

    /// Bumped on every cache rebuild; lets callers detect stale move
    /// evaluations cheaply.
    pub(crate) version: u64,
}

impl Route {
    pub(crate) fn new(idx: RouteIdx, start: NodeIdx, end: NodeIdx) -> Self {
        Route {
            idx,
            start,
            end,
            visits: vec![start, end],
            cum_dist: vec![0, 0],
            cum_load: vec![0, 0],
            load: 0,
            time_warp: 0,
            overloaded: false,
            dirty: true,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn idx(&self) -> RouteIdx {
        self.idx
    }

    /// Number of client visits on this route.
    pub fn size(&self) -> usize {
        self.visits.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Node at the given position: 0 is the start depot, `size() + 1` the
    /// end depot.
    pub fn node_at(&self, position: usize) -> NodeIdx {
        debug_assert!(!self.dirty, "queried a dirty route");
        self.visits[position]
    }

    pub fn start_depot(&self) -> NodeIdx {
        self.start
    }

    pub fn end_depot(&self) -> NodeIdx {
        self.end
    }

    /// Travel distance along the visits from position `from` to position
    /// `to`, with `from <= to`.
    pub fn dist_between(&self, from: usize, to: usize) -> Value {
        debug_assert!(!self.dirty, "queried a dirty route");
        debug_assert!(from <= to);
        self.cum_dist[to] - self.cum_dist[from]
    }

    /// Total demand of the visits at positions `from..=to`, with
    /// `1 <= from <= to`.
    pub fn load_between(&self, from: usize, to: usize) -> Value {
        debug_assert!(!self.dirty, "queried a dirty route");
        debug_assert!(1 <= from && from <= to);
        self.cum_load[to] - self.cum_load[from - 1]
    }

    pub fn load(&self) -> Value {
        debug_assert!(!self.dirty, "queried a dirty route");
        self.load
    }

    pub fn time_warp(&self) -> Value {
        debug_assert!(!self.dirty, "queried a dirty route");
        self.time_warp
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp() > 0
    }

    pub fn has_excess_load(&self) -> bool {
        debug_assert!(!self.dirty, "queried a dirty route");
        self.overloaded
    }

    pub fn is_feasible(&self) -> bool {
        !self.has_excess_load() && !self.has_time_warp()
    }
}
