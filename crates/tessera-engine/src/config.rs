//! Engine configuration.

/// Default maximum number of named trees in one database.
pub const DEFAULT_MAX_TREES: usize = 4096;

/// Configuration for an engine [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of named trees that may exist at once.
    pub max_trees: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_trees: DEFAULT_MAX_TREES,
        }
    }
}

impl EngineConfig {
    /// Sets the maximum number of named trees.
    #[must_use]
    pub fn with_max_trees(mut self, max_trees: usize) -> Self {
        self.max_trees = max_trees;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EngineConfig::default();
        assert_eq!(config.max_trees, DEFAULT_MAX_TREES);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::default().with_max_trees(8);
        assert_eq!(config.max_trees, 8);
    }
}
