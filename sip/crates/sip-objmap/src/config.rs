//! Configuration Module - Object Map Tuning Parameters
//!
//! Controls the bucket-count progression of the map and the occupancy
//! thresholds that decide when the table is rebuilt.

use crate::logging::MapLoggerConfig;
use thiserror::Error;

/// Prime numbers used as hash table sizes.
///
/// Each entry is at least 3 so the secondary hash `size - 2 - ...` never
/// divides by zero. The last entry is the capacity ceiling.
pub const DEFAULT_PRIMES: &[usize] = &[
    521,
    1031,
    2053,
    4099,
    8209,
    16411,
    32771,
    65537,
    131101,
    262147,
    524309,
    1048583,
    2097169,
    4194319,
    8388617,
    16777259,
    33554467,
    67108879,
    134217757,
    268435459,
    536870923,
    1073741827,
    2147483659,
];

/// Smallest usable table size for double hashing
pub const MIN_TABLE_SIZE: usize = 3;

/// Main configuration for the object map
///
/// # Examples
///
/// ```rust
/// use sip_objmap::MapConfig;
///
/// let config = MapConfig::default();
/// assert_eq!(config.initial_size(), 521);
///
/// // A tiny table that reorganises quickly
/// let config = MapConfig::with_primes(vec![11, 23, 47]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Ascending table sizes
    ///
    /// Growth moves one step along this list. Sizes should be prime for the
    /// probe sequence to visit every bucket.
    ///
    /// Default: [`DEFAULT_PRIMES`]
    pub primes: Vec<usize>,

    /// Reorganisation is skipped while more than `size >> headroom_shift`
    /// buckets are still unused.
    ///
    /// Default: 3 (12.5%)
    pub headroom_shift: u32,

    /// When reorganising, the table grows unless reclaiming stale buckets
    /// would leave at least `size >> reclaim_shift` buckets unused.
    ///
    /// Default: 2 (25%)
    pub reclaim_shift: u32,

    /// Emit map events through the logger
    ///
    /// Default: false
    pub verbose: bool,

    /// Collect operation counters
    ///
    /// Default: true
    pub stats_enabled: bool,

    /// Logger settings used when `verbose` is set
    pub log: MapLoggerConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            primes: DEFAULT_PRIMES.to_vec(),
            headroom_shift: 3,
            reclaim_shift: 2,
            verbose: false,
            stats_enabled: true,
            log: MapLoggerConfig::default(),
        }
    }
}

impl MapConfig {
    /// Default configuration with a custom size progression
    pub fn with_primes(primes: Vec<usize>) -> Self {
        MapConfig {
            primes,
            ..Default::default()
        }
    }

    /// First table size
    ///
    /// Returns 0 for an empty prime table; `validate` rejects that case.
    pub fn initial_size(&self) -> usize {
        self.primes.first().copied().unwrap_or(0)
    }

    /// Largest table size the map can grow to
    pub fn max_size(&self) -> usize {
        self.primes.last().copied().unwrap_or(0)
    }

    /// Validate configuration
    ///
    /// ```rust
    /// use sip_objmap::MapConfig;
    ///
    /// let config = MapConfig::with_primes(vec![2, 5]);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primes.is_empty() {
            return Err(ConfigError::InvalidPrimeTable(
                "at least one table size is required".to_string(),
            ));
        }

        if let Some(&small) = self.primes.iter().find(|&&p| p < MIN_TABLE_SIZE) {
            return Err(ConfigError::InvalidPrimeTable(format!(
                "table size {} is below the minimum of {}",
                small, MIN_TABLE_SIZE
            )));
        }

        if let Some(pair) = self.primes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidPrimeTable(format!(
                "table sizes must be strictly ascending ({} followed by {})",
                pair[0], pair[1]
            )));
        }

        if self.headroom_shift == 0 || self.reclaim_shift == 0 {
            return Err(ConfigError::InvalidThreshold(
                "threshold shifts must be > 0".to_string(),
            ));
        }

        if self.reclaim_shift >= self.headroom_shift {
            return Err(ConfigError::InvalidThreshold(
                "reclaim_shift must be smaller than headroom_shift".to_string(),
            ));
        }

        if self.headroom_shift >= usize::BITS {
            return Err(ConfigError::InvalidThreshold(format!(
                "headroom_shift must be < {}",
                usize::BITS
            )));
        }

        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid prime table: {0}")]
    InvalidPrimeTable(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = MapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_size(), 521);
        assert_eq!(config.max_size(), 2147483659);
    }

    #[test]
    fn test_empty_primes_rejected() {
        let config = MapConfig::with_primes(Vec::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPrimeTable(_))
        ));
    }

    #[test]
    fn test_size_below_three_rejected() {
        let config = MapConfig::with_primes(vec![2, 7]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_ascending_rejected() {
        let config = MapConfig::with_primes(vec![11, 11, 23]);
        assert!(config.validate().is_err());

        let config = MapConfig::with_primes(vec![23, 11]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_shifts() {
        let config = MapConfig {
            reclaim_shift: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));

        let config = MapConfig {
            headroom_shift: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
