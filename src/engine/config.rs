// 12.1: engine configuration. role wiring plus event-log tuning; all
// fields are plain data so a host can build one from its own config file.

use serde::{Deserialize, Serialize};

use crate::types::AccountId;

/// Tuning knobs and role assignments for an [`Engine`](super::Engine).
///
/// `admin` gates governance operations (parameter updates, pause and
/// resume, funding registration). `funding_trigger` gates rate updates
/// and funding execution; the admin may also invoke those directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Account allowed to perform governance operations.
    pub admin: AccountId,
    /// Account allowed to drive the funding cycle.
    pub funding_trigger: AccountId,
    /// Maximum number of events retained in the in-memory log. Oldest
    /// entries are dropped first once the cap is exceeded.
    pub max_events: usize,
    /// Print a line per event as it is emitted.
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin: AccountId(0),
            funding_trigger: AccountId(0),
            max_events: 100_000,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_reasonable() {
        let config = EngineConfig::default();
        assert_eq!(config.admin, AccountId(0));
        assert_eq!(config.funding_trigger, AccountId(0));
        assert!(config.max_events > 0);
        assert!(!config.verbose);
    }

    #[test]
    fn config_serde_round_trip() {
        let config = EngineConfig {
            admin: AccountId(7),
            funding_trigger: AccountId(9),
            max_events: 500,
            verbose: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.admin, AccountId(7));
        assert_eq!(back.funding_trigger, AccountId(9));
        assert_eq!(back.max_events, 500);
        assert!(back.verbose);
    }
}
