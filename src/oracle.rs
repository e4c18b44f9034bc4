// 10.0 oracle.rs: ground-truth win percentages. the engine trusts any value
// the feed returns on the [0, 1000] axis; validation and aggregation live
// upstream of this boundary.

use std::collections::HashMap;

use crate::types::{Price, TeamId};

pub trait WinPctOracle {
    /// Current win percentage for a team as a price on [0, 1000].
    /// Implementations return [`Price::CENTER`] for a team with no
    /// recorded games rather than failing.
    fn team_win_pct(&self, team: TeamId) -> Price;
}

/// In-memory feed for the simulator and tests. Unlisted teams report the
/// neutral 500, matching a season that has not started.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    table: HashMap<TeamId, Price>,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pct(mut self, team: TeamId, pct: Price) -> Self {
        self.set(team, pct);
        self
    }

    pub fn set(&mut self, team: TeamId, pct: Price) {
        self.table.insert(team, pct);
    }
}

impl WinPctOracle for TableOracle {
    fn team_win_pct(&self, team: TeamId) -> Price {
        self.table.get(&team).copied().unwrap_or(Price::CENTER)
    }
}
