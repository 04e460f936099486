use std::path::Path;

use anyhow::{anyhow, Context};
use smallvec::SmallVec;

use crate::config::SolverConfig;
use crate::problem::{Client, ProblemData};
use crate::Value;

/// Raw parse result, before fleet overrides and matrix derivation.
#[derive(Debug, Clone)]
pub struct Instance {
    pub nb_clients: usize,
    pub nb_vehicles: usize,
    pub vehicle_capacity: Value,
    pub clients: Vec<Client>,
}

impl Instance {
    /// Builds the immutable problem, deriving a rounded Euclidean distance
    /// matrix from the coordinates. `config.nb_vehicles` overrides the
    /// instance's own fleet size when set.
    pub fn into_problem(self, config: &SolverConfig) -> anyhow::Result<ProblemData> {
        let nb_vehicles = config.nb_vehicles.unwrap_or(self.nb_vehicles);

        ProblemData::from_coords(self.clients, nb_vehicles, self.vehicle_capacity)
            .map_err(Into::into)
    }
}

/// Parses a plain-text instance.
///
/// The first non-empty line is a header `nbClients nbVehicles
/// vehicleCapacity`; it is followed by one line per visit,
///
/// ```text
/// id xCoord yCoord demand twEarly twLate serviceDuration releaseTime
/// ```
///
/// starting with the depot as id 0. Ids must be consecutive.
pub fn parse(text: &str) -> anyhow::Result<Instance> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let header = lines.next().ok_or_else(|| anyhow!("empty instance"))?;
    let fields: SmallVec<[&str; 8]> = header.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(anyhow!("header must be 'nbClients nbVehicles vehicleCapacity'"));
    }

    let nb_clients: usize = fields[0]
        .parse()
        .with_context(|| format!("invalid client count: {}", fields[0]))?;
    let nb_vehicles: usize = fields[1]
        .parse()
        .with_context(|| format!("invalid vehicle count: {}", fields[1]))?;
    let vehicle_capacity: Value = fields[2]
        .parse()
        .with_context(|| format!("invalid vehicle capacity: {}", fields[2]))?;

    let mut clients = Vec::with_capacity(nb_clients + 1);

    for line in lines {
        let fields: SmallVec<[&str; 8]> = line.split_whitespace().collect();
        if fields.len() != 8 {
            return Err(anyhow!("malformed visit line: '{line}'"));
        }

        let id: usize = fields[0]
            .parse()
            .with_context(|| format!("invalid visit id: {}", fields[0]))?;
        if id != clients.len() {
            return Err(anyhow!("visit ids must be consecutive, got {id}"));
        }

        let mut values: SmallVec<[Value; 8]> = SmallVec::new();
        for field in &fields[1..] {
            values.push(
                field
                    .parse()
                    .with_context(|| format!("invalid number '{field}' in line '{line}'"))?,
            );
        }

        let &[x, y, demand, tw_early, tw_late, service, release] = &values[..] else {
            return Err(anyhow!("malformed visit line: '{line}'"));
        };

        clients.push(Client::new(x, y, demand, service, tw_early, tw_late).with_release_time(release));
    }

    if clients.len() != nb_clients + 1 {
        return Err(anyhow!(
            "expected {} visit lines (depot included), found {}",
            nb_clients + 1,
            clients.len()
        ));
    }

    Ok(Instance {
        nb_clients,
        nb_vehicles,
        vehicle_capacity,
        clients,
    })
}

/// Reads and parses an instance file, applying the config's fleet
/// override.
pub fn read_instance<P: AsRef<Path>>(
    path: P,
    config: &SolverConfig,
) -> anyhow::Result<ProblemData> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.as_ref().display()))?;

    parse(&text)?.into_problem(config)
}
