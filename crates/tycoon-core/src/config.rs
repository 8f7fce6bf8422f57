//! World configuration.
//!
//! Controls how many plots are laid out and how big they are. Loaded from
//! JSON or built in code, then validated before the world is created.
//!
//! ```
//! use tycoon_core::config::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "plot_count": 4 }"#).unwrap();
//! assert_eq!(config.plot_count, 4);
//! assert!(config.validate().is_empty());
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// World layout and service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of plots laid out at world load
    pub plot_count: u32,
    /// Distance between neighbouring plot centres along +x
    pub plot_spacing: f32,
    /// Extents of each plot's platform
    pub platform_size: Vec3,
    /// Centre of the first plot's platform surface
    pub origin: Vec3,
    /// Seed for instance ids (None = random)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            plot_count: 6,
            plot_spacing: 160.0,
            platform_size: Vec3::new(128.0, 2.0, 128.0),
            origin: Vec3::ZERO,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Validate, returning the list of problems as an error
    pub fn check(&self) -> Result<(), ConfigError> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// Every problem with this configuration. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.plot_count == 0 {
            errors.push("plot_count must be at least 1".into());
        }
        if self.platform_size.cmple(Vec3::ZERO).any() || !self.platform_size.is_finite() {
            errors.push(format!(
                "platform_size must be positive on every axis (got {:?})",
                self.platform_size
            ));
        }
        if !self.origin.is_finite() {
            errors.push("origin must be finite".into());
        }
        if !self.plot_spacing.is_finite() || self.plot_spacing < self.platform_size.x {
            errors.push(format!(
                "plot_spacing {} is smaller than the platform width {}",
                self.plot_spacing, self.platform_size.x
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "plot_count": 2, "seed": 99 }"#).unwrap();
        assert_eq!(config.plot_count, 2);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.platform_size, GameConfig::default().platform_size);
    }

    #[test]
    fn test_overlapping_plots_rejected() {
        let config = GameConfig {
            plot_spacing: 10.0,
            ..Default::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("plot_spacing"));
    }

    #[test]
    fn test_zero_plots_and_flat_platform_rejected() {
        let config = GameConfig {
            plot_count: 0,
            platform_size: Vec3::new(128.0, 0.0, 128.0),
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 2);
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "plot_count": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}
