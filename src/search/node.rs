use crate::define_index_newtype;
use crate::search::route::RouteIdx;
use crate::search::time_window_segment::TimeWindowSegment;

define_index_newtype!(NodeIdx, Node);

/// One visit in the working representation. Client nodes and the per-route
/// depot sentinels share this type; sentinels carry client id 0.
///
/// The `prev`/`next` links are authoritative at all times. Everything else
/// (`position`, `tw_before`, `tw_after`) is a cache that is only valid
/// while the owning route is clean.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) client: usize,
    pub(crate) position: usize,
    pub(crate) route: RouteIdx,
    pub(crate) prev: NodeIdx,
    pub(crate) next: NodeIdx,

    /// Timing summary of this visit alone.
    pub(crate) tw: TimeWindowSegment,
    /// Timing summary of the route prefix up to and including this visit.
    pub(crate) tw_before: TimeWindowSegment,
    /// Timing summary of the route suffix from this visit to the end
    /// depot.
    pub(crate) tw_after: TimeWindowSegment,
}

impl Node {
    pub(crate) fn new(client: usize, tw: TimeWindowSegment) -> Self {
        Node {
            client,
            position: 0,
            route: RouteIdx::new(0),
            prev: NodeIdx::new(0),
            next: NodeIdx::new(0),
            tw,
            tw_before: tw,
            tw_after: tw,
        }
    }

    pub fn client(&self) -> usize {
        self.client
    }

    /// 1-based position within the route; the start depot sits at 0.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn route(&self) -> RouteIdx {
        self.route
    }

    pub fn is_depot(&self) -> bool {
        self.client == 0
    }

    pub fn tw_before(&self) -> TimeWindowSegment {
        self.tw_before
    }

    pub fn tw_after(&self) -> TimeWindowSegment {
        self.tw_after
    }
}
