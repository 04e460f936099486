use fxhash::FxHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument};

use crate::config::SolverConfig;
use crate::penalty::PenaltyManager;
use crate::problem::ProblemData;
use crate::search::exchange::Exchange;
use crate::search::node::NodeIdx;
use crate::search::working_solution::WorkingSolution;
use crate::solution::Individual;
use crate::Cost;

/// The exchange variants the driver runs, in evaluation order. Relocates
/// come first: they are the cheapest to evaluate and tend to clean up the
/// grossest defects before the segment swaps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    Exchange10,
    Exchange20,
    Exchange30,
    Exchange11,
    Exchange21,
    Exchange22,
    Exchange33,
}

impl SearchOperator {
    pub const ALL: [SearchOperator; 7] = [
        SearchOperator::Exchange10,
        SearchOperator::Exchange20,
        SearchOperator::Exchange30,
        SearchOperator::Exchange11,
        SearchOperator::Exchange21,
        SearchOperator::Exchange22,
        SearchOperator::Exchange33,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SearchOperator::Exchange10 => "relocate",
            SearchOperator::Exchange20 => "relocate-pair",
            SearchOperator::Exchange30 => "relocate-triple",
            SearchOperator::Exchange11 => "swap",
            SearchOperator::Exchange21 => "swap-pair-single",
            SearchOperator::Exchange22 => "swap-pairs",
            SearchOperator::Exchange33 => "swap-triples",
        }
    }

    pub fn evaluate(
        self,
        solution: &WorkingSolution,
        penalty_manager: &PenaltyManager,
        u: NodeIdx,
        v: NodeIdx,
    ) -> Cost {
        match self {
            SearchOperator::Exchange10 => Exchange::<1, 0>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange20 => Exchange::<2, 0>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange30 => Exchange::<3, 0>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange11 => Exchange::<1, 1>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange21 => Exchange::<2, 1>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange22 => Exchange::<2, 2>::evaluate(solution, penalty_manager, u, v),
            SearchOperator::Exchange33 => Exchange::<3, 3>::evaluate(solution, penalty_manager, u, v),
        }
    }

    pub fn apply(self, solution: &mut WorkingSolution, u: NodeIdx, v: NodeIdx) {
        match self {
            SearchOperator::Exchange10 => Exchange::<1, 0>::apply(solution, u, v),
            SearchOperator::Exchange20 => Exchange::<2, 0>::apply(solution, u, v),
            SearchOperator::Exchange30 => Exchange::<3, 0>::apply(solution, u, v),
            SearchOperator::Exchange11 => Exchange::<1, 1>::apply(solution, u, v),
            SearchOperator::Exchange21 => Exchange::<2, 1>::apply(solution, u, v),
            SearchOperator::Exchange22 => Exchange::<2, 2>::apply(solution, u, v),
            SearchOperator::Exchange33 => Exchange::<3, 3>::apply(solution, u, v),
        }
    }
}

/// Runs the exchange operators over a solution until no move improves it.
///
/// One instance owns the working node/route state for a whole search
/// session; `search` loads an individual into that state, descends to a
/// local optimum, and serializes the result back out. Candidate pairs are
/// restricted to each client's nearest neighbours, visited in an order
/// reshuffled on every call.
pub struct LocalSearch<'a> {
    solution: WorkingSolution<'a>,
    operators: Vec<SearchOperator>,

    /// Granular neighbourhood: for each client, the closest other clients
    /// by travel distance.
    neighbours: Vec<Vec<usize>>,

    /// Client visit order, reshuffled per search call.
    order: Vec<usize>,

    /// Route versions at the time a pair was last evaluated. A pair whose
    /// routes are unchanged since then cannot have become improving.
    tested: FxHashMap<(usize, usize), (u64, u64)>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(data: &'a ProblemData, config: &SolverConfig) -> Self {
        LocalSearch {
            solution: WorkingSolution::new(data),
            operators: SearchOperator::ALL.to_vec(),
            neighbours: compute_neighbours(data, config.nb_granular),
            order: (1..=data.nb_clients()).collect(),
            tested: FxHashMap::default(),
        }
    }

    /// Replaces the operator set, e.g. to run relocates only.
    pub fn with_operators(mut self, operators: Vec<SearchOperator>) -> Self {
        self.operators = operators;
        self
    }

    /// Improves `individual` until no operator finds an improving move, or
    /// `stop` reports true. The stop predicate is polled between moves, so
    /// a long descent can be abandoned without finishing the sweep.
    #[instrument(skip_all, level = "debug")]
    pub fn search<R, F>(
        &mut self,
        individual: &Individual,
        penalty_manager: &PenaltyManager,
        rng: &mut R,
        mut stop: F,
    ) -> Individual
    where
        R: Rng,
        F: FnMut() -> bool,
    {
        self.solution.load(individual);
        self.order.shuffle(rng);
        self.tested.clear();

        let mut evaluated: u64 = 0;
        let mut applied: u64 = 0;
        let mut stopped = false;

        loop {
            let mut improved = false;

            'sweep: for i in 0..self.order.len() {
                let u_client = self.order[i];

                for j in 0..self.neighbours[u_client].len() {
                    if stop() {
                        stopped = true;
                        break 'sweep;
                    }

                    let v_client = self.neighbours[u_client][j];
                    improved |= self.improve_pair(
                        penalty_manager,
                        u_client,
                        v_client,
                        &mut evaluated,
                        &mut applied,
                    );
                }

                // Starting a fresh route is never covered by the
                // neighbourhood; try the first empty one, if any.
                let empty_start = self
                    .solution
                    .routes()
                    .iter()
                    .find(|route| route.is_empty())
                    .map(|route| route.start_depot());

                if let Some(v) = empty_start {
                    let u = self.solution.client_node(u_client);
                    improved |=
                        self.improve_nodes(penalty_manager, u, v, &mut evaluated, &mut applied);
                }
            }

            if stopped || !improved {
                break;
            }
        }

        debug!(evaluated, applied, stopped, "local search finished");
        self.solution.export(penalty_manager)
    }

    fn improve_pair(
        &mut self,
        penalty_manager: &PenaltyManager,
        u_client: usize,
        v_client: usize,
        evaluated: &mut u64,
        applied: &mut u64,
    ) -> bool {
        let u = self.solution.client_node(u_client);
        let v = self.solution.client_node(v_client);

        let versions = (
            self.solution.route(self.solution.node(u).route()).version(),
            self.solution.route(self.solution.node(v).route()).version(),
        );

        if self.tested.get(&(u_client, v_client)) == Some(&versions) {
            return false;
        }
        self.tested.insert((u_client, v_client), versions);

        self.improve_nodes(penalty_manager, u, v, evaluated, applied)
    }

    fn improve_nodes(
        &mut self,
        penalty_manager: &PenaltyManager,
        u: NodeIdx,
        v: NodeIdx,
        evaluated: &mut u64,
        applied: &mut u64,
    ) -> bool {
        for idx in 0..self.operators.len() {
            let operator = self.operators[idx];

            *evaluated += 1;
            let delta = operator.evaluate(&self.solution, penalty_manager, u, v);

            if delta < 0 {
                let u_route = self.solution.node(u).route();
                let v_route = self.solution.node(v).route();

                operator.apply(&mut self.solution, u, v);
                self.solution.update(u_route);
                if v_route != u_route {
                    self.solution.update(v_route);
                }

                *applied += 1;
                debug!(operator = operator.name(), delta, "applied move");
                return true;
            }
        }

        false
    }
}

fn compute_neighbours(data: &ProblemData, nb_granular: usize) -> Vec<Vec<usize>> {
    let mut neighbours = vec![vec![]; data.nb_clients() + 1];

    for client in 1..=data.nb_clients() {
        let mut others: Vec<usize> = (1..=data.nb_clients())
            .filter(|&other| other != client)
            .collect();

        others.sort_by_key(|&other| data.dist(client, other));
        others.truncate(nb_granular);

        neighbours[client] = others;
    }

    neighbours
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use super::*;
    use crate::test_utils;

    #[test]
    fn test_neighbours_are_sorted_by_distance() {
        let data = test_utils::ok_small();
        let neighbours = compute_neighbours(&data, 2);

        // From client 2, the closest clients are 3 (621) and 4 (1'090).
        assert_eq!(neighbours[2], vec![3, 4]);

        // Truncation respects the granularity.
        assert_eq!(neighbours[1].len(), 2);
    }

    #[test]
    fn test_search_reaches_local_optimum() {
        let data = test_utils::ok_small();
        let pm = test_utils::ok_small_penalties(&data);
        let config = SolverConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);

        let start =
            Individual::new(&data, &pm, vec![vec![1, 2, 3, 4], vec![], vec![]]).unwrap();
        let mut local_search = LocalSearch::new(&data, &config);

        let result = local_search.search(&start, &pm, &mut rng, || false);

        // The start wastes thousands of units on time warp, so the
        // descent must find something strictly better. At these penalty
        // coefficients the result need not be feasible: a reordered
        // single route with a small load penalty beats every feasible
        // split of this instance.
        assert!(result.cost() < start.cost());

        // Searching the result again yields no further improvement.
        let again = local_search.search(&result, &pm, &mut rng, || false);
        assert_eq!(again.cost(), result.cost());
    }

    #[test]
    fn test_search_never_worsens() {
        let data = test_utils::ok_small();
        let pm = test_utils::ok_small_penalties(&data);
        let config = SolverConfig::default();
        let mut rng = SmallRng::seed_from_u64(99);

        for routes in [
            vec![vec![1, 2], vec![3], vec![4]],
            vec![vec![1, 3], vec![2, 4], vec![]],
            vec![vec![4, 3, 1, 2], vec![], vec![]],
        ] {
            let start = Individual::new(&data, &pm, routes).unwrap();
            let result =
                LocalSearch::new(&data, &config).search(&start, &pm, &mut rng, || false);

            assert!(result.cost() <= start.cost());
        }
    }

    #[test]
    fn test_stop_predicate_halts_the_descent() {
        let data = test_utils::ok_small();
        let pm = test_utils::ok_small_penalties(&data);
        let config = SolverConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let start =
            Individual::new(&data, &pm, vec![vec![1, 2, 3, 4], vec![], vec![]]).unwrap();

        // Stopping immediately returns the loaded solution unchanged.
        let result = LocalSearch::new(&data, &config).search(&start, &pm, &mut rng, || true);
        assert_eq!(result, start);
    }

    #[test]
    fn test_search_on_grid_instance() {
        // Nine clients on a grid, demand 1 each, wide-open windows. The
        // round-robin start interleaves the grid badly.
        let data = test_utils::grid_instance(2, 5, 1, 3, 5);
        let pm = PenaltyManager::new(data.vehicle_capacity(), 20, 6, Default::default());
        let config = SolverConfig::default();
        let mut rng = SmallRng::seed_from_u64(11);

        let mut routes = vec![vec![]; 3];
        for client in 1..=data.nb_clients() {
            routes[(client - 1) % 3].push(client);
        }

        let start = Individual::new(&data, &pm, routes).unwrap();
        let result = LocalSearch::new(&data, &config).search(&start, &pm, &mut rng, || false);

        assert!(result.cost() < start.cost());
    }

    #[test]
    fn test_restricted_operator_set() {
        let data = test_utils::ok_small();
        let pm = test_utils::ok_small_penalties(&data);
        let config = SolverConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);

        let start =
            Individual::new(&data, &pm, vec![vec![1, 2, 3, 4], vec![], vec![]]).unwrap();

        let mut relocate_only = LocalSearch::new(&data, &config)
            .with_operators(vec![SearchOperator::Exchange10]);
        let result = relocate_only.search(&start, &pm, &mut rng, || false);

        assert!(result.cost() < start.cost());
    }
}
