use crate::penalty::PenaltyManager;
use crate::search::node::NodeIdx;
use crate::search::time_window_segment::TimeWindowSegment as Tws;
use crate::search::working_solution::WorkingSolution;
use crate::Cost;

/// Exchanges `N` consecutive nodes starting at U with `M` consecutive
/// nodes starting at V. `(1, 0)` is pure relocate, `(1, 1)` pure swap;
/// larger parameters generalize both to segments.
///
/// ```text
/// Relocate (M = 0, N = 2):
///    BEFORE:  ... p(U) -> [U, endU] -> n(endU) ...     ... V -> n(V) ...
///    AFTER:   ... p(U) -> n(endU) ...          ... V -> [U, endU] -> n(V) ...
///
/// Swap (N = 2, M = 1):
///    BEFORE:  ... p(U) -> [U, endU] -> n(endU) ...  ... p(V) -> [V] -> n(V) ...
///    AFTER:   ... p(U) -> [V] -> n(endU) ...   ... p(V) -> [U, endU] -> n(V) ...
/// ```
///
/// `evaluate` never mutates anything and returns the exact change in
/// penalized cost the move would cause, or 0 for configurations the move
/// does not apply to (segments spanning a depot, overlapping or adjacent
/// segments, null moves, and the mirror half of symmetric swaps). The
/// caller applies a move only when the returned delta is negative; a
/// non-negative return may be a partial bound, since evaluation stops as
/// soon as the move can no longer be improving.
///
/// Both `evaluate` and `apply` require clean routes; the caller updates
/// the two affected routes after every application.
pub struct Exchange<const N: usize, const M: usize>;

pub type Exchange10 = Exchange<1, 0>;
pub type Exchange20 = Exchange<2, 0>;
pub type Exchange30 = Exchange<3, 0>;
pub type Exchange11 = Exchange<1, 1>;
pub type Exchange21 = Exchange<2, 1>;
pub type Exchange22 = Exchange<2, 2>;
pub type Exchange33 = Exchange<3, 3>;

impl<const N: usize, const M: usize> Exchange<N, M> {
    const VALID: () = assert!(N >= M && N >= 1, "exchange needs N >= M and N >= 1");

    pub fn evaluate(
        solution: &WorkingSolution,
        penalty_manager: &PenaltyManager,
        u: NodeIdx,
        v: NodeIdx,
    ) -> Cost {
        let () = Self::VALID;

        if Self::contains_depot(solution, u, N) || Self::overlap(solution, u, v) {
            return 0;
        }

        if M > 0 && Self::contains_depot(solution, v, M) {
            return 0;
        }

        if M == 0 {
            // Relocating U directly behind its own predecessor changes
            // nothing.
            if u == solution.next(v) {
                return 0;
            }

            Self::evaluate_relocate(solution, penalty_manager, u, v)
        } else {
            // A symmetric swap is evaluated once per unordered pair.
            if N == M && solution.client_of(u) >= solution.client_of(v) {
                return 0;
            }

            if Self::adjacent(solution, u, v) {
                return 0;
            }

            Self::evaluate_swap(solution, penalty_manager, u, v)
        }
    }

    /// Moves the V-segment into U's slot and vice versa; the `N - M`
    /// surplus U-nodes go right behind the end of V's segment. The caller
    /// must update both affected routes afterwards.
    pub fn apply(solution: &mut WorkingSolution, u: NodeIdx, v: NodeIdx) {
        let () = Self::VALID;

        let u_route = solution.node(u).route();
        let v_route = solution.node(v).route();
        let pos_u = solution.node(u).position();
        let pos_v = solution.node(v).position();

        let mut u_to_insert = if N == 1 {
            u
        } else {
            solution.route(u_route).node_at(pos_u + N - 1)
        };
        let insert_after = if M == 0 {
            v
        } else {
            solution.route(v_route).node_at(pos_v + M - 1)
        };

        // Insert the surplus U-nodes after the end of V's segment, tail
        // first so the splice point stays put.
        for _ in 0..N - M {
            let prev = solution.prev(u_to_insert);
            solution.insert_after(u_to_insert, insert_after);
            u_to_insert = prev;
        }

        // Swap the overlapping pairs.
        let mut u = u;
        let mut v = v;
        for _ in 0..N.min(M) {
            solution.swap_with(u, v);
            u = solution.next(u);
            v = solution.next(v);
        }
    }

    /// The segment of the given length starting at `node` runs past the
    /// end depot, or starts on a depot.
    fn contains_depot(solution: &WorkingSolution, node: NodeIdx, seg_length: usize) -> bool {
        let node = solution.node(node);

        if node.is_depot() {
            return true;
        }

        // The last client sits at position size(); the segment sticks out
        // if its final position exceeds that.
        node.position() + seg_length - 1 > solution.route(node.route()).size()
    }

    /// The two segments share nodes within one route.
    fn overlap(solution: &WorkingSolution, u: NodeIdx, v: NodeIdx) -> bool {
        let u = solution.node(u);
        let v = solution.node(v);

        u.route() == v.route()
            && u.position() as i64 <= v.position() as i64 + M as i64 - 1
            && v.position() as i64 <= u.position() as i64 + N as i64 - 1
    }

    /// The two segments touch within one route.
    fn adjacent(solution: &WorkingSolution, u: NodeIdx, v: NodeIdx) -> bool {
        let u = solution.node(u);
        let v = solution.node(v);

        u.route() == v.route()
            && (u.position() + N == v.position() || v.position() + M == u.position())
    }

    fn evaluate_relocate(
        solution: &WorkingSolution,
        penalty_manager: &PenaltyManager,
        u: NodeIdx,
        v: NodeIdx,
    ) -> Cost {
        let data = solution.data();
        let u_node = solution.node(u);
        let v_node = solution.node(v);
        let u_route_idx = u_node.route();
        let v_route_idx = v_node.route();
        let u_route = solution.route(u_route_idx);
        let v_route = solution.route(v_route_idx);

        let pos_u = u_node.position();
        let pos_v = v_node.position();

        let end_u = if N == 1 {
            u
        } else {
            u_route.node_at(pos_u + N - 1)
        };
        let p_u = solution.prev(u);
        let n_end_u = solution.next(end_u);
        let n_v = solution.next(v);

        let current = u_route.dist_between(pos_u - 1, pos_u + N) as Cost
            + data.dist(v_node.client(), solution.client_of(n_v)) as Cost;

        let proposed = data.dist(v_node.client(), u_node.client()) as Cost
            + u_route.dist_between(pos_u, pos_u + N - 1) as Cost
            + data.dist(solution.client_of(end_u), solution.client_of(n_v)) as Cost
            + data.dist(solution.client_of(p_u), solution.client_of(n_end_u)) as Cost;

        let mut delta = proposed - current;

        if u_route_idx != v_route_idx {
            if u_route.is_feasible() && delta >= 0 {
                return delta;
            }

            let u_tws = Tws::merge(
                data,
                solution.node(p_u).tw_before(),
                solution.node(n_end_u).tw_after(),
            );
            delta += penalty_manager.tw_penalty(u_tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(u_route.time_warp());

            let seg_load = u_route.load_between(pos_u, pos_u + N - 1);
            delta += penalty_manager.load_penalty(u_route.load() - seg_load);
            delta -= penalty_manager.load_penalty(u_route.load());

            // Removing the segment from U's route alone does not pay off;
            // adding it elsewhere can only cost more.
            if delta >= 0 {
                return delta;
            }

            delta += penalty_manager.load_penalty(v_route.load() + seg_load);
            delta -= penalty_manager.load_penalty(v_route.load());

            let v_tws = Tws::merge(
                data,
                Tws::merge(
                    data,
                    v_node.tw_before(),
                    solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                ),
                solution.node(n_v).tw_after(),
            );
            delta += penalty_manager.tw_penalty(v_tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(v_route.time_warp());
        } else {
            if !u_route.has_time_warp() && delta >= 0 {
                return delta;
            }

            let tws = if pos_u < pos_v {
                Tws::merge(
                    data,
                    Tws::merge(
                        data,
                        Tws::merge(
                            data,
                            solution.node(p_u).tw_before(),
                            solution.tw_between(u_route_idx, pos_u + N, pos_v),
                        ),
                        solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                    ),
                    solution.node(n_v).tw_after(),
                )
            } else {
                Tws::merge(
                    data,
                    Tws::merge(
                        data,
                        Tws::merge(
                            data,
                            v_node.tw_before(),
                            solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                        ),
                        solution.tw_between(u_route_idx, pos_v + 1, pos_u - 1),
                    ),
                    solution.node(n_end_u).tw_after(),
                )
            };

            delta += penalty_manager.tw_penalty(tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(u_route.time_warp());
        }

        delta
    }

    fn evaluate_swap(
        solution: &WorkingSolution,
        penalty_manager: &PenaltyManager,
        u: NodeIdx,
        v: NodeIdx,
    ) -> Cost {
        let data = solution.data();
        let u_node = solution.node(u);
        let v_node = solution.node(v);
        let u_route_idx = u_node.route();
        let v_route_idx = v_node.route();
        let u_route = solution.route(u_route_idx);
        let v_route = solution.route(v_route_idx);

        let pos_u = u_node.position();
        let pos_v = v_node.position();

        let end_u = if N == 1 {
            u
        } else {
            u_route.node_at(pos_u + N - 1)
        };
        let end_v = if M == 1 {
            v
        } else {
            v_route.node_at(pos_v + M - 1)
        };

        let p_u = solution.prev(u);
        let p_v = solution.prev(v);
        let n_end_u = solution.next(end_u);
        let n_end_v = solution.next(end_v);

        let current = u_route.dist_between(pos_u - 1, pos_u + N) as Cost
            + v_route.dist_between(pos_v - 1, pos_v + M) as Cost;

        //   p(U) -> V -> ... -> endV -> n(endU)
        // + p(V) -> U -> ... -> endU -> n(endV)
        let proposed = data.dist(solution.client_of(p_u), v_node.client()) as Cost
            + v_route.dist_between(pos_v, pos_v + M - 1) as Cost
            + data.dist(solution.client_of(end_v), solution.client_of(n_end_u)) as Cost
            + data.dist(solution.client_of(p_v), u_node.client()) as Cost
            + u_route.dist_between(pos_u, pos_u + N - 1) as Cost
            + data.dist(solution.client_of(end_u), solution.client_of(n_end_v)) as Cost;

        let mut delta = proposed - current;

        if u_route_idx != v_route_idx {
            if u_route.is_feasible() && v_route.is_feasible() && delta >= 0 {
                return delta;
            }

            let u_tws = Tws::merge(
                data,
                Tws::merge(
                    data,
                    solution.node(p_u).tw_before(),
                    solution.tw_between(v_route_idx, pos_v, pos_v + M - 1),
                ),
                solution.node(n_end_u).tw_after(),
            );
            delta += penalty_manager.tw_penalty(u_tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(u_route.time_warp());

            let v_tws = Tws::merge(
                data,
                Tws::merge(
                    data,
                    solution.node(p_v).tw_before(),
                    solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                ),
                solution.node(n_end_v).tw_after(),
            );
            delta += penalty_manager.tw_penalty(v_tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(v_route.time_warp());

            let load_u = u_route.load_between(pos_u, pos_u + N - 1);
            let load_v = v_route.load_between(pos_v, pos_v + M - 1);
            let load_diff = load_u - load_v;

            delta += penalty_manager.load_penalty(u_route.load() - load_diff);
            delta -= penalty_manager.load_penalty(u_route.load());

            delta += penalty_manager.load_penalty(v_route.load() + load_diff);
            delta -= penalty_manager.load_penalty(v_route.load());
        } else {
            if !u_route.has_time_warp() && delta >= 0 {
                return delta;
            }

            let tws = if pos_u < pos_v {
                Tws::merge(
                    data,
                    Tws::merge(
                        data,
                        Tws::merge(
                            data,
                            Tws::merge(
                                data,
                                solution.node(p_u).tw_before(),
                                solution.tw_between(u_route_idx, pos_v, pos_v + M - 1),
                            ),
                            solution.tw_between(u_route_idx, pos_u + N, pos_v - 1),
                        ),
                        solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                    ),
                    solution.node(n_end_v).tw_after(),
                )
            } else {
                Tws::merge(
                    data,
                    Tws::merge(
                        data,
                        Tws::merge(
                            data,
                            Tws::merge(
                                data,
                                solution.node(p_v).tw_before(),
                                solution.tw_between(u_route_idx, pos_u, pos_u + N - 1),
                            ),
                            solution.tw_between(u_route_idx, pos_v + M, pos_u - 1),
                        ),
                        solution.tw_between(u_route_idx, pos_v, pos_v + M - 1),
                    ),
                    solution.node(n_end_u).tw_after(),
                )
            };

            delta += penalty_manager.tw_penalty(tws.total_time_warp());
            delta -= penalty_manager.tw_penalty(u_route.time_warp());
        }

        delta
    }
}
