use serde::{Deserialize, Serialize};

use crate::Value;

/// One visit location. Client 0 is the depot: it has no demand, no service
/// duration, and its time window spans the whole planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub x: Value,
    pub y: Value,
    pub demand: Value,
    pub service_duration: Value,
    pub tw_early: Value,
    pub tw_late: Value,
    pub release_time: Value,
}

impl Client {
    pub fn new(
        x: Value,
        y: Value,
        demand: Value,
        service_duration: Value,
        tw_early: Value,
        tw_late: Value,
    ) -> Self {
        Client {
            x,
            y,
            demand,
            service_duration,
            tw_early,
            tw_late,
            release_time: 0,
        }
    }

    pub fn with_release_time(mut self, release_time: Value) -> Self {
        self.release_time = release_time;
        self
    }
}
