use crate::config::PenaltyParams;
use crate::penalty::PenaltyManager;
use crate::problem::{Client, ProblemData};
use crate::Value;

/// Small four-client instance with three vehicles of capacity 10 and an
/// explicit (asymmetric) distance matrix. Tight enough that single-route
/// solutions violate both the capacity and the time windows, which makes
/// it a convenient fixture for penalty and warp behaviour.
pub fn ok_small() -> ProblemData {
    let clients = vec![
        Client::new(2_334, 726, 0, 0, 0, 45_000),
        Client::new(226, 1_297, 5, 360, 15_600, 22_500),
        Client::new(590, 530, 5, 360, 12_000, 19_500),
        Client::new(435, 718, 3, 420, 8_400, 15_300),
        Client::new(1_191, 639, 5, 360, 12_000, 19_500),
    ];

    #[rustfmt::skip]
    let dist = vec![
            0, 1_544, 1_944, 1_931, 1_476,
        1_726,     0, 1_992, 1_427, 1_593,
        1_965, 1_975,     0,   621, 1_090,
        2_063, 1_433,   647,     0,   818,
        1_475, 1_594, 1_090,   828,     0,
    ];

    ProblemData::new(clients, dist, 3, 10).unwrap()
}

/// Penalty manager for [`ok_small`] with the default initial coefficients.
pub fn ok_small_penalties(data: &ProblemData) -> PenaltyManager {
    PenaltyManager::new(data.vehicle_capacity(), 20, 6, PenaltyParams::default())
}

/// Clients on a `rows x cols` unit grid, all with the given demand and a
/// wide-open time window. Client 0 (the depot) sits at the origin.
pub fn grid_instance(
    rows: Value,
    cols: Value,
    demand: Value,
    nb_vehicles: usize,
    vehicle_capacity: Value,
) -> ProblemData {
    let mut clients = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let is_depot = clients.is_empty();
            clients.push(Client::new(
                x * 100,
                y * 100,
                if is_depot { 0 } else { demand },
                0,
                0,
                1_000_000,
            ));
        }
    }

    ProblemData::from_coords(clients, nb_vehicles, vehicle_capacity).unwrap()
}
