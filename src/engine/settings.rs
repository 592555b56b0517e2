use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::planner::DateFieldLocator;

/// Engine tuning, read from YAML; every key is optional
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Deadline for one pipeline execution
    pub query_timeout_ms: u64,
    /// Pipelines of a batch run at once; size it to the store's connection pool
    pub max_concurrency: usize,
    pub date_field_locator: DateFieldLocator,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            query_timeout_ms: 30_000,
            max_concurrency: 8,
            date_field_locator: DateFieldLocator::SectionWalk,
        }
    }
}

impl EngineSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Batch parallelism, never below one
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.query_timeout(), Duration::from_secs(30));
        assert_eq!(settings.concurrency(), 8);
        assert_eq!(settings.date_field_locator, DateFieldLocator::SectionWalk);
    }

    #[test]
    fn test_zero_concurrency_still_runs() {
        let settings = EngineSettings {
            max_concurrency: 0,
            ..Default::default()
        };
        assert_eq!(settings.concurrency(), 1);
    }
}
