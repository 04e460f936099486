use thiserror::Error;

use crate::Value;

/// Instance-level validation failures. These are fatal at load time: a
/// problem with any of these defects cannot be searched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstanceError {
    #[error("client {client} has negative demand {demand}")]
    NegativeDemand { client: usize, demand: Value },

    #[error("client {client} has malformed time window [{early}, {late}]")]
    MalformedTimeWindow {
        client: usize,
        early: Value,
        late: Value,
    },

    #[error("distance matrix has {actual} entries, expected {expected}x{expected}")]
    MatrixDimensionMismatch { actual: usize, expected: usize },

    #[error("distance matrix entry ({from}, {to}) is negative")]
    NegativeDistance { from: usize, to: usize },

    #[error("instance needs at least one vehicle")]
    NoVehicles,
}

/// Solution-level construction failures. The caller may recover from these
/// by rebuilding the offending solution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolutionError {
    #[error("solution has {actual} non-empty routes, but the fleet only has {maximum} vehicles")]
    TooManyRoutes { actual: usize, maximum: usize },

    #[error("solution supplies {actual} routes, but the fleet has {expected} vehicles")]
    RouteCountMismatch { actual: usize, expected: usize },
}
