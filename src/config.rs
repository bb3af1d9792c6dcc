//! Configuration management for the anonymizer

/// Default configuration for the anonymizer
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum number of indistinguishable rows per group
    pub k: usize,

    /// Seed for the random choices of the grouping engine; a fresh seed is
    /// drawn when unset
    pub seed: Option<u64>,

    /// Row count from which the cost graph is computed in parallel
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k: 2,
            seed: None,
            parallel_threshold: 512,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(k: usize, seed: Option<u64>, parallel_threshold: usize) -> Self {
        Self {
            k,
            seed,
            parallel_threshold,
        }
    }
}
