use crate::penalty::PenaltyManager;
use crate::problem::ProblemData;
use crate::search::node::{Node, NodeIdx};
use crate::search::route::{Route, RouteIdx};
use crate::search::time_window_segment::TimeWindowSegment;
use crate::solution::Individual;

/// Mutable working state of one search session.
///
/// Owns every [`Node`] and [`Route`] in a pair of flat arenas; the nodes
/// reference each other by index, so the doubly-linked tours never hold
/// Rust references into the arena. Client `c` always lives at node index
/// `c`; the two depot sentinels of route `r` live at the tail of the node
/// arena.
///
/// Mutations (`insert_after`, `remove`, `swap_with`) only touch the links
/// and mark the affected routes dirty. Callers batch their mutations and
/// then call [`WorkingSolution::update`] on each dirty route before the
/// next query.
pub struct WorkingSolution<'a> {
    data: &'a ProblemData,
    nodes: Vec<Node>,
    routes: Vec<Route>,
}

impl<'a> WorkingSolution<'a> {
    pub fn new(data: &'a ProblemData) -> Self {
        let nb_clients = data.nb_clients();
        let nb_vehicles = data.nb_vehicles();

        let mut nodes = Vec::with_capacity(nb_clients + 1 + 2 * nb_vehicles);
        for client in 0..=nb_clients {
            nodes.push(Node::new(client, TimeWindowSegment::singleton(data, client)));
        }

        let depot_tw = TimeWindowSegment::singleton(data, 0);
        let mut routes = Vec::with_capacity(nb_vehicles);
        for vehicle in 0..nb_vehicles {
            let start = NodeIdx::new(nodes.len());
            nodes.push(Node::new(0, depot_tw));
            let end = NodeIdx::new(nodes.len());
            nodes.push(Node::new(0, depot_tw));

            let idx = RouteIdx::new(vehicle);
            nodes[start].route = idx;
            nodes[start].next = end;
            nodes[start].prev = end;
            nodes[end].route = idx;
            nodes[end].prev = start;
            nodes[end].next = start;

            routes.push(Route::new(idx, start, end));
        }

        let mut solution = WorkingSolution {
            data,
            nodes,
            routes,
        };

        for vehicle in 0..nb_vehicles {
            solution.update(RouteIdx::new(vehicle));
        }

        solution
    }

    /// Rebuilds the linked tours from an individual's routes.
    pub fn load(&mut self, individual: &Individual) {
        for route in &mut self.routes {
            route.dirty = true;
        }

        for vehicle in 0..self.routes.len() {
            let idx = RouteIdx::new(vehicle);
            let start = self.routes[idx].start;
            let end = self.routes[idx].end;

            let mut prev = start;
            if let Some(clients) = individual.routes().get(vehicle) {
                for &client in clients {
                    let node = NodeIdx::new(client);
                    self.nodes[prev].next = node;
                    self.nodes[node].prev = prev;
                    self.nodes[node].route = idx;
                    prev = node;
                }
            }

            self.nodes[prev].next = end;
            self.nodes[end].prev = prev;

            self.update(idx);
        }
    }

    /// Reads the current tours back out as an immutable individual.
    pub fn export(&self, penalty_manager: &PenaltyManager) -> Individual {
        let routes = self
            .routes
            .iter()
            .map(|route| {
                route.visits[1..route.visits.len() - 1]
                    .iter()
                    .map(|&node| self.nodes[node].client)
                    .collect()
            })
            .collect();

        Individual::new(self.data, penalty_manager, routes)
            .expect("a working solution never uses more routes than the fleet has vehicles")
    }

    pub fn data(&self) -> &ProblemData {
        self.data
    }

    pub fn node(&self, node: NodeIdx) -> &Node {
        &self.nodes[node]
    }

    /// Node handle of the given client.
    pub fn client_node(&self, client: usize) -> NodeIdx {
        debug_assert!(client >= 1 && client <= self.data.nb_clients());
        NodeIdx::new(client)
    }

    pub fn route(&self, route: RouteIdx) -> &Route {
        &self.routes[route]
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[inline]
    pub fn next(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node].next
    }

    #[inline]
    pub fn prev(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node].prev
    }

    #[inline]
    pub fn client_of(&self, node: NodeIdx) -> usize {
        self.nodes[node].client
    }

    /// Splices `node` out of its current place and in again right after
    /// `after`, which may be on a different route. Both involved routes
    /// become dirty.
    pub fn insert_after(&mut self, node: NodeIdx, after: NodeIdx) {
        debug_assert_ne!(node, after);

        let old_prev = self.nodes[node].prev;
        let old_next = self.nodes[node].next;
        self.nodes[old_prev].next = old_next;
        self.nodes[old_next].prev = old_prev;

        let succ = self.nodes[after].next;
        self.nodes[after].next = node;
        self.nodes[node].prev = after;
        self.nodes[node].next = succ;
        self.nodes[succ].prev = node;

        let old_route = self.nodes[node].route;
        let new_route = self.nodes[after].route;
        self.nodes[node].route = new_route;

        self.routes[old_route].dirty = true;
        self.routes[new_route].dirty = true;
    }

    /// Unlinks `node` from its route. The node keeps a stale route
    /// back-reference until it is inserted again.
    pub fn remove(&mut self, node: NodeIdx) {
        let prev = self.nodes[node].prev;
        let next = self.nodes[node].next;
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;

        self.nodes[node].prev = node;
        self.nodes[node].next = node;

        let route = self.nodes[node].route;
        self.routes[route].dirty = true;
    }

    /// Exchanges the list positions of two nodes, possibly across routes.
    pub fn swap_with(&mut self, a: NodeIdx, b: NodeIdx) {
        debug_assert_ne!(a, b);

        let (a_prev, a_next) = (self.nodes[a].prev, self.nodes[a].next);
        let (b_prev, b_next) = (self.nodes[b].prev, self.nodes[b].next);

        if a_next == b {
            // a immediately precedes b: a_prev -> b -> a -> b_next
            self.nodes[a_prev].next = b;
            self.nodes[b].prev = a_prev;
            self.nodes[b].next = a;
            self.nodes[a].prev = b;
            self.nodes[a].next = b_next;
            self.nodes[b_next].prev = a;
        } else if b_next == a {
            self.nodes[b_prev].next = a;
            self.nodes[a].prev = b_prev;
            self.nodes[a].next = b;
            self.nodes[b].prev = a;
            self.nodes[b].next = a_next;
            self.nodes[a_next].prev = b;
        } else {
            self.nodes[a_prev].next = b;
            self.nodes[b].prev = a_prev;
            self.nodes[b].next = a_next;
            self.nodes[a_next].prev = b;

            self.nodes[b_prev].next = a;
            self.nodes[a].prev = b_prev;
            self.nodes[a].next = b_next;
            self.nodes[b_next].prev = a;
        }

        let route_a = self.nodes[a].route;
        let route_b = self.nodes[b].route;
        self.nodes[a].route = route_b;
        self.nodes[b].route = route_a;

        self.routes[route_a].dirty = true;
        self.routes[route_b].dirty = true;
    }

    /// Rebuilds every cache of the given route from its links. Idempotent
    /// on a clean route.
    pub fn update(&mut self, route: RouteIdx) {
        let start = self.routes[route].start;
        let end = self.routes[route].end;

        let mut visits = std::mem::take(&mut self.routes[route].visits);
        visits.clear();
        visits.push(start);
        let mut cursor = self.nodes[start].next;
        while cursor != end {
            visits.push(cursor);
            cursor = self.nodes[cursor].next;
        }
        visits.push(end);

        for (position, &node) in visits.iter().enumerate() {
            self.nodes[node].position = position;
            self.nodes[node].route = route;
        }

        let mut cum_dist = std::mem::take(&mut self.routes[route].cum_dist);
        let mut cum_load = std::mem::take(&mut self.routes[route].cum_load);
        cum_dist.clear();
        cum_load.clear();
        cum_dist.push(0);
        cum_load.push(0);

        for window in visits.windows(2) {
            let from = self.nodes[window[0]].client;
            let to = self.nodes[window[1]].client;

            cum_dist.push(cum_dist.last().unwrap() + self.data.dist(from, to));
            cum_load.push(cum_load.last().unwrap() + self.data.client(to).demand);
        }

        self.nodes[start].tw_before = self.nodes[start].tw;
        for position in 1..visits.len() {
            let merged = TimeWindowSegment::merge(
                self.data,
                self.nodes[visits[position - 1]].tw_before,
                self.nodes[visits[position]].tw,
            );
            self.nodes[visits[position]].tw_before = merged;
        }

        self.nodes[end].tw_after = self.nodes[end].tw;
        for position in (0..visits.len() - 1).rev() {
            let merged = TimeWindowSegment::merge(
                self.data,
                self.nodes[visits[position]].tw,
                self.nodes[visits[position + 1]].tw_after,
            );
            self.nodes[visits[position]].tw_after = merged;
        }

        let load = *cum_load.last().unwrap();
        let time_warp = self.nodes[end].tw_before.total_time_warp();

        let entry = &mut self.routes[route];
        entry.load = load;
        entry.time_warp = time_warp;
        entry.overloaded = load > self.data.vehicle_capacity();
        entry.visits = visits;
        entry.cum_dist = cum_dist;
        entry.cum_load = cum_load;
        entry.dirty = false;
        entry.version += 1;
    }

    /// Timing summary of the visits at positions `from..=to` of a route.
    pub fn tw_between(&self, route: RouteIdx, from: usize, to: usize) -> TimeWindowSegment {
        let entry = &self.routes[route];
        debug_assert!(!entry.dirty, "queried a dirty route");
        debug_assert!(from <= to && to < entry.visits.len());

        let mut tws = self.nodes[entry.visits[from]].tw;
        for position in from + 1..=to {
            tws = TimeWindowSegment::merge(self.data, tws, self.nodes[entry.visits[position]].tw);
        }

        tws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PenaltyParams;
    use crate::test_utils;
    use crate::Cost;

    fn penalties(data: &ProblemData) -> PenaltyManager {
        PenaltyManager::new(data.vehicle_capacity(), 20, 6, PenaltyParams::default())
    }

    fn load_routes<'a>(
        data: &'a ProblemData,
        pm: &PenaltyManager,
        mut routes: Vec<Vec<usize>>,
    ) -> WorkingSolution<'a> {
        routes.resize(data.nb_vehicles(), vec![]);
        let individual = Individual::new(data, pm, routes).unwrap();
        let mut solution = WorkingSolution::new(data);
        solution.load(&individual);
        solution
    }

    #[test]
    fn test_route_caches_match_explicit_recomputation() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let solution = load_routes(&data, &pm, vec![vec![1, 2, 3], vec![4]]);

        let route = solution.route(RouteIdx::new(0));
        assert_eq!(route.size(), 3);

        // Distance over the whole traversal equals the leg-by-leg sum.
        let explicit: Cost = data.dist_path(&[0, 1, 2, 3, 0]);
        assert_eq!(route.dist_between(0, 4) as Cost, explicit);

        // Load equals the demand sum, both per segment and in total.
        assert_eq!(route.load(), 5 + 5 + 3);
        assert_eq!(route.load_between(1, 2), 10);
        assert_eq!(route.load_between(2, 3), 8);

        // The folded timing summary agrees with the cached figure.
        let tws = solution.tw_between(RouteIdx::new(0), 0, 4);
        assert_eq!(route.time_warp(), tws.total_time_warp());
    }

    #[test]
    fn test_update_is_idempotent() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let mut solution = load_routes(&data, &pm, vec![vec![1, 2], vec![3, 4]]);

        let before = solution.route(RouteIdx::new(0)).clone();
        solution.update(RouteIdx::new(0));
        let after = solution.route(RouteIdx::new(0));

        assert_eq!(before.visits, after.visits);
        assert_eq!(before.cum_dist, after.cum_dist);
        assert_eq!(before.cum_load, after.cum_load);
        assert_eq!(before.load, after.load);
        assert_eq!(before.time_warp, after.time_warp);
    }

    #[test]
    fn test_insert_after_moves_node_across_routes() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let mut solution = load_routes(&data, &pm, vec![vec![1, 2], vec![3, 4]]);

        // Move client 2 behind client 3.
        let node = solution.client_node(2);
        let after = solution.client_node(3);
        solution.insert_after(node, after);
        solution.update(RouteIdx::new(0));
        solution.update(RouteIdx::new(1));

        let exported = solution.export(&pm);
        assert_eq!(exported.routes()[0], vec![1]);
        assert_eq!(exported.routes()[1], vec![3, 2, 4]);

        assert_eq!(solution.node(node).route(), RouteIdx::new(1));
        assert_eq!(solution.node(node).position(), 2);
    }

    #[test]
    fn test_remove_unlinks_node() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let mut solution = load_routes(&data, &pm, vec![vec![1, 2, 3], vec![4]]);

        solution.remove(solution.client_node(2));
        solution.update(RouteIdx::new(0));

        let route = solution.route(RouteIdx::new(0));
        assert_eq!(route.size(), 2);
        assert_eq!(route.load(), 5 + 3);
    }

    #[test]
    fn test_swap_with_exchanges_adjacent_nodes() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let mut solution = load_routes(&data, &pm, vec![vec![1, 2, 3], vec![4]]);

        solution.swap_with(solution.client_node(1), solution.client_node(2));
        solution.update(RouteIdx::new(0));

        let exported = solution.export(&pm);
        assert_eq!(exported.routes()[0], vec![2, 1, 3]);
    }

    #[test]
    fn test_swap_with_exchanges_nodes_across_routes() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let mut solution = load_routes(&data, &pm, vec![vec![1, 2], vec![3, 4]]);

        solution.swap_with(solution.client_node(1), solution.client_node(4));
        solution.update(RouteIdx::new(0));
        solution.update(RouteIdx::new(1));

        let exported = solution.export(&pm);
        assert_eq!(exported.routes()[0], vec![4, 2]);
        assert_eq!(exported.routes()[1], vec![3, 1]);

        assert_eq!(solution.node(solution.client_node(1)).route(), RouteIdx::new(1));
        assert_eq!(solution.node(solution.client_node(4)).route(), RouteIdx::new(0));
    }

    #[test]
    fn test_round_trip_preserves_routes() {
        let data = test_utils::ok_small();
        let pm = penalties(&data);
        let individual =
            Individual::new(&data, &pm, vec![vec![3, 4], vec![1, 2], vec![]]).unwrap();

        let mut solution = WorkingSolution::new(&data);
        solution.load(&individual);

        assert_eq!(solution.export(&pm), individual);
    }
}
