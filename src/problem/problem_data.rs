use crate::{error::InstanceError, problem::client::Client, Cost, Value};

/// Immutable problem instance: the clients (depot included at index 0), a
/// dense travel distance matrix, and the homogeneous fleet description.
#[derive(Debug, Clone)]
pub struct ProblemData {
    clients: Vec<Client>,
    dist: Vec<Value>,
    dim: usize,
    nb_vehicles: usize,
    vehicle_capacity: Value,
}

impl ProblemData {
    /// Builds an instance from clients and an explicit distance matrix. The
    /// matrix is given row-major; entry `(i, j)` is the travel distance
    /// from client `i` to client `j`.
    pub fn new(
        clients: Vec<Client>,
        dist: Vec<Value>,
        nb_vehicles: usize,
        vehicle_capacity: Value,
    ) -> Result<Self, InstanceError> {
        let dim = clients.len();

        if nb_vehicles == 0 {
            return Err(InstanceError::NoVehicles);
        }

        if dist.len() != dim * dim {
            return Err(InstanceError::MatrixDimensionMismatch {
                actual: dist.len(),
                expected: dim,
            });
        }

        for (idx, client) in clients.iter().enumerate() {
            if client.demand < 0 {
                return Err(InstanceError::NegativeDemand {
                    client: idx,
                    demand: client.demand,
                });
            }

            if client.tw_early > client.tw_late {
                return Err(InstanceError::MalformedTimeWindow {
                    client: idx,
                    early: client.tw_early,
                    late: client.tw_late,
                });
            }
        }

        if let Some(pos) = dist.iter().position(|&d| d < 0) {
            return Err(InstanceError::NegativeDistance {
                from: pos / dim,
                to: pos % dim,
            });
        }

        Ok(ProblemData {
            clients,
            dist,
            dim,
            nb_vehicles,
            vehicle_capacity,
        })
    }

    /// Builds an instance deriving the matrix from client coordinates,
    /// rounding each Euclidean distance to the nearest integer.
    pub fn from_coords(
        clients: Vec<Client>,
        nb_vehicles: usize,
        vehicle_capacity: Value,
    ) -> Result<Self, InstanceError> {
        let dim = clients.len();
        let mut dist = vec![0; dim * dim];

        for (i, from) in clients.iter().enumerate() {
            for (j, to) in clients.iter().enumerate() {
                let dx = (from.x - to.x) as f64;
                let dy = (from.y - to.y) as f64;
                dist[i * dim + j] = (dx * dx + dy * dy).sqrt().round() as Value;
            }
        }

        ProblemData::new(clients, dist, nb_vehicles, vehicle_capacity)
    }

    pub fn client(&self, client: usize) -> &Client {
        &self.clients[client]
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Number of clients, excluding the depot.
    pub fn nb_clients(&self) -> usize {
        self.dim - 1
    }

    pub fn nb_vehicles(&self) -> usize {
        self.nb_vehicles
    }

    pub fn vehicle_capacity(&self) -> Value {
        self.vehicle_capacity
    }

    #[inline]
    pub fn dist(&self, from: usize, to: usize) -> Value {
        self.dist[from * self.dim + to]
    }

    /// Total travel distance along a path of client ids.
    pub fn dist_path(&self, path: &[usize]) -> Cost {
        path.windows(2)
            .map(|leg| self.dist(leg[0], leg[1]) as Cost)
            .sum()
    }
}
