use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::SolutionError;
use crate::penalty::PenaltyManager;
use crate::problem::ProblemData;
use crate::search::TimeWindowSegment;
use crate::{Cost, Value};

/// A complete candidate solution: one ordered client list per vehicle.
///
/// The route list is canonicalized at construction: non-empty routes keep
/// their relative order and move to the front, empty routes collect at the
/// tail. Cost and the feasibility flags are computed once, up front, and
/// never change afterwards.
///
/// Clients that appear in no route, or in more than one, are accepted
/// here; guaranteeing a bijection between clients and visits is the
/// caller's contract.
#[derive(Debug, Clone)]
pub struct Individual {
    routes: Vec<Vec<usize>>,
    num_routes: usize,

    /// Predecessor and successor of each client in its route, depot
    /// adjacency encoded as 0. Indexed by client id; entry 0 is `(0, 0)`.
    neighbours: Vec<(usize, usize)>,

    distance: Cost,
    excess_load: Value,
    time_warp: Value,
    cost: Cost,
}

impl Individual {
    /// Builds an individual from one client list per vehicle.
    ///
    /// The caller must supply at least `nb_vehicles` route entries (extra
    /// entries are fine as long as they are empty); anything else means
    /// the solution and the fleet disagree, which the caller may recover
    /// from by rebuilding.
    pub fn new(
        data: &ProblemData,
        penalty_manager: &PenaltyManager,
        routes: Vec<Vec<usize>>,
    ) -> Result<Self, SolutionError> {
        let nb_vehicles = data.nb_vehicles();

        if routes.len() < nb_vehicles {
            return Err(SolutionError::RouteCountMismatch {
                actual: routes.len(),
                expected: nb_vehicles,
            });
        }

        let num_routes = routes.iter().filter(|route| !route.is_empty()).count();
        if num_routes > nb_vehicles {
            return Err(SolutionError::TooManyRoutes {
                actual: num_routes,
                maximum: nb_vehicles,
            });
        }

        // Stable partition: non-empty routes first, relative order kept.
        let capacity = routes.len();
        let mut canonical = Vec::with_capacity(capacity);
        let mut empties = Vec::new();
        for route in routes {
            if route.is_empty() {
                empties.push(route);
            } else {
                canonical.push(route);
            }
        }
        canonical.append(&mut empties);

        let mut neighbours = vec![(0, 0); data.nb_clients() + 1];
        let mut distance: Cost = 0;
        let mut excess_load: Value = 0;
        let mut time_warp: Value = 0;
        let mut cost: Cost = 0;

        for route in canonical.iter().filter(|route| !route.is_empty()) {
            let mut load: Value = 0;
            let mut tws = TimeWindowSegment::singleton(data, 0);
            let mut prev = 0;

            for (position, &client) in route.iter().enumerate() {
                let succ = route.get(position + 1).copied().unwrap_or(0);
                neighbours[client] = (prev, succ);

                distance += data.dist(prev, client) as Cost;
                load += data.client(client).demand;
                tws = TimeWindowSegment::merge(data, tws, TimeWindowSegment::singleton(data, client));

                prev = client;
            }

            distance += data.dist(prev, 0) as Cost;
            tws = TimeWindowSegment::merge(data, tws, TimeWindowSegment::singleton(data, 0));

            let route_warp = tws.total_time_warp();
            excess_load += (load - data.vehicle_capacity()).max(0);
            time_warp = time_warp.saturating_add(route_warp);

            cost += penalty_manager.load_penalty(load);
            cost += penalty_manager.tw_penalty(route_warp);
        }

        cost += distance;

        Ok(Individual {
            routes: canonical,
            num_routes,
            neighbours,
            distance,
            excess_load,
            time_warp,
            cost,
        })
    }

    /// The canonicalized route list. Its length is at least the vehicle
    /// count; trailing routes may be empty.
    pub fn routes(&self) -> &[Vec<usize>] {
        &self.routes
    }

    /// Number of non-empty routes.
    pub fn num_routes(&self) -> usize {
        self.num_routes
    }

    pub fn neighbours(&self) -> &[(usize, usize)] {
        &self.neighbours
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn distance(&self) -> Cost {
        self.distance
    }

    pub fn excess_load(&self) -> Value {
        self.excess_load
    }

    pub fn time_warp(&self) -> Value {
        self.time_warp
    }

    pub fn has_excess_capacity(&self) -> bool {
        self.excess_load > 0
    }

    pub fn has_time_warp(&self) -> bool {
        self.time_warp > 0
    }

    pub fn is_feasible(&self) -> bool {
        !self.has_excess_capacity() && !self.has_time_warp()
    }

    /// Number of client adjacencies present in exactly one of the two
    /// individuals, ignoring direction. Identical solutions are at
    /// distance 0; reversing a route does not change the measure, and
    /// `a.broken_pairs_distance(&b) == b.broken_pairs_distance(&a)`.
    pub fn broken_pairs_distance(&self, other: &Individual) -> usize {
        let mut endpoint_diffs = 0;

        for client in 1..self.neighbours.len() {
            let ours = client_adjacencies(self.neighbours[client]);
            let theirs = client_adjacencies(other.neighbours[client]);

            endpoint_diffs += ours.iter().filter(|&&c| !theirs.contains(&c)).count();
            endpoint_diffs += theirs.iter().filter(|&&c| !ours.contains(&c)).count();
        }

        // Every broken adjacency is seen from both of its endpoints.
        endpoint_diffs / 2
    }
}

/// The clients adjacent to one visit, direction and depot stripped.
fn client_adjacencies((pred, succ): (usize, usize)) -> SmallVec<[usize; 2]> {
    let mut adjacent = SmallVec::new();

    if pred != 0 {
        adjacent.push(pred);
    }
    if succ != 0 && succ != pred {
        adjacent.push(succ);
    }

    adjacent
}

/// Structural equality over the canonicalized routes; trailing empty
/// routes do not participate.
impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.num_routes == other.num_routes
            && self
                .routes
                .iter()
                .zip(&other.routes)
                .take(self.num_routes)
                .all(|(ours, theirs)| ours == theirs)
    }
}

impl Eq for Individual {}

/// Serializes as the plain list-of-lists of client ids.
impl Serialize for Individual {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.routes.serialize(serializer)
    }
}
