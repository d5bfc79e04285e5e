//! Difficulty parameters
//!
//! The three consensus parameters shared by chain construction and validation.
//! A chain only validates under the exact parameters it was built with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Easiest allowed target, as compact bits
pub const DEFAULT_POW_LIMIT_BITS: u32 = 0x1f00_ffff;

/// Desired seconds between blocks
pub const TARGET_SPACING_SECONDS: i64 = 10 * 60;

/// Number of blocks between difficulty adjustments
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 2016;

/// Parameter validation errors, raised at the boundary before the core runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid bits value: {0}")]
    InvalidBits(String),
    #[error("Target spacing must be positive, got {0}")]
    NonPositiveSpacing(i64),
    #[error("Difficulty adjustment interval must be positive")]
    ZeroInterval,
}

/// Consensus parameters for difficulty derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyParams {
    /// Easiest allowed target (compact bits); also the genesis bits
    pub pow_limit_bits: u32,
    /// Desired seconds between blocks
    pub target_spacing_seconds: i64,
    /// Blocks per retarget window
    pub difficulty_adjustment_interval: u64,
}

impl DifficultyParams {
    /// Create validated parameters
    pub fn new(
        pow_limit_bits: u32,
        target_spacing_seconds: i64,
        difficulty_adjustment_interval: u64,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            pow_limit_bits,
            target_spacing_seconds,
            difficulty_adjustment_interval,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject parameters the difficulty engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_spacing_seconds <= 0 {
            return Err(ConfigError::NonPositiveSpacing(self.target_spacing_seconds));
        }
        if self.difficulty_adjustment_interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    /// Expected duration of one full retarget window
    pub fn target_timespan(&self) -> i64 {
        let interval = i64::try_from(self.difficulty_adjustment_interval).unwrap_or(i64::MAX);
        self.target_spacing_seconds.saturating_mul(interval)
    }
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            pow_limit_bits: DEFAULT_POW_LIMIT_BITS,
            target_spacing_seconds: TARGET_SPACING_SECONDS,
            difficulty_adjustment_interval: DIFFICULTY_ADJUSTMENT_INTERVAL,
        }
    }
}

/// Parse compact bits from hex, with or without a `0x` prefix
pub fn parse_bits(value: &str) -> Result<u32, ConfigError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(ConfigError::InvalidBits(value.to_string()));
    }

    u32::from_str_radix(digits, 16).map_err(|_| ConfigError::InvalidBits(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DifficultyParams::default();
        assert_eq!(params.pow_limit_bits, 0x1f00ffff);
        assert_eq!(params.target_spacing_seconds, 600);
        assert_eq!(params.difficulty_adjustment_interval, 2016);
        assert_eq!(params.target_timespan(), 600 * 2016);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert_eq!(
            DifficultyParams::new(0x1f00ffff, 0, 10),
            Err(ConfigError::NonPositiveSpacing(0))
        );
        assert_eq!(
            DifficultyParams::new(0x1f00ffff, 600, 0),
            Err(ConfigError::ZeroInterval)
        );
    }

    #[test]
    fn test_parse_bits() {
        assert_eq!(parse_bits("1f00ffff"), Ok(0x1f00ffff));
        assert_eq!(parse_bits("0x207fffff"), Ok(0x207fffff));
        assert_eq!(parse_bits("1d00FFFF"), Ok(0x1d00ffff));
        assert!(parse_bits("").is_err());
        assert!(parse_bits("xyz").is_err());
        assert!(parse_bits("1ffffffff").is_err());
    }
}
