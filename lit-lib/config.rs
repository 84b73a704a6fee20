//! Tuning knobs for locating and syncing, as read from `sync.toml`.
//!
//! ```toml
//! [locate]
//! divisor = 5        # one allowed mismatch per `divisor` chars of needle
//! floor = 1          # never fewer mismatches than this
//! cap = 8            # never more mismatches than this
//! retry-floor = 2    # ambiguous results are retried down to this tolerance
//! fold = "whitespace"
//! refine = true
//! radius = 20
//!
//! [sync]
//! target-select = "cursor"        # or "line"
//! source-window = "line"          # or { radius = N }
//! rendered-window = { radius = 20 }
//! ```

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  approx::CharFold,
  fragment::Segmentation,
};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Parse(#[from] toml::de::Error),
  #[error("locate.divisor must be at least 1")]
  ZeroDivisor,
  #[error("locate.floor must be at least 1")]
  ZeroFloor,
  #[error("locate.floor ({floor}) is larger than locate.cap ({cap})")]
  FloorAboveCap { floor: usize, cap: usize },
  #[error("locate.retry-floor must be at least 1")]
  ZeroRetryFloor,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LocateConfig {
  pub divisor:     usize,
  pub floor:       usize,
  pub cap:         usize,
  /// Smallest tolerance that is still retried one lower when a search is
  /// ambiguous.
  pub retry_floor: usize,
  pub fold:        CharFold,
  /// Retry failed lookups with a narrowed window.
  pub refine:      bool,
  /// Window radius for lookups given only a position.
  pub radius:      usize,
}

impl Default for LocateConfig {
  fn default() -> Self {
    Self {
      divisor:     5,
      floor:       1,
      cap:         8,
      retry_floor: 2,
      fold:        CharFold::Whitespace,
      refine:      true,
      radius:      20,
    }
  }
}

impl LocateConfig {
  /// `max(floor, min(cap, needle_len / divisor))`
  pub fn default_mismatches(&self, needle_len: usize) -> usize {
    (needle_len / self.divisor.max(1)).min(self.cap).max(self.floor)
  }

  pub fn validate(&self) -> Result<()> {
    if self.divisor == 0 {
      return Err(ConfigError::ZeroDivisor);
    }
    if self.floor == 0 {
      return Err(ConfigError::ZeroFloor);
    }
    if self.floor > self.cap {
      return Err(ConfigError::FloorAboveCap {
        floor: self.floor,
        cap:   self.cap,
      });
    }
    if self.retry_floor == 0 {
      return Err(ConfigError::ZeroRetryFloor);
    }
    Ok(())
  }
}

/// What the other view selects after a cursor (not a selection) was synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetSelect {
  #[default]
  Cursor,
  /// Select the line containing the found position.
  Line,
}

/// How a view picks the text around its cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowConfig {
  Line,
  Radius(usize),
}

impl From<WindowConfig> for Segmentation {
  fn from(window: WindowConfig) -> Self {
    match window {
      WindowConfig::Line => Segmentation::Lines,
      WindowConfig::Radius(radius) => Segmentation::Radius(radius),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SyncConfig {
  pub target_select:   TargetSelect,
  pub source_window:   WindowConfig,
  pub rendered_window: WindowConfig,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      target_select:   TargetSelect::Cursor,
      source_window:   WindowConfig::Line,
      rendered_window: WindowConfig::Radius(20),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
  pub locate: LocateConfig,
  pub sync:   SyncConfig,
}

impl Config {
  pub fn from_toml(value: toml::Value) -> Result<Self> {
    let config: Self = value.try_into()?;
    config.locate.validate()?;
    Ok(config)
  }

  pub fn parse(source: &str) -> Result<Self> {
    let config: Self = toml::from_str(source)?;
    config.locate.validate()?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_mismatches_scale_with_length() {
    let config = LocateConfig::default();
    assert_eq!(config.default_mismatches(0), 1);
    assert_eq!(config.default_mismatches(4), 1);
    assert_eq!(config.default_mismatches(14), 2);
    assert_eq!(config.default_mismatches(40), 8);
    assert_eq!(config.default_mismatches(400), 8);
  }

  #[test]
  fn empty_source_is_default() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
  }

  #[test]
  fn parses_all_keys() {
    let config = Config::parse(
      r#"
        [locate]
        divisor = 4
        floor = 2
        cap = 6
        retry-floor = 3
        fold = "exact"
        refine = false
        radius = 12

        [sync]
        target-select = "line"
        source-window = { radius = 30 }
        rendered-window = "line"
      "#,
    )
    .unwrap();

    assert_eq!(config.locate, LocateConfig {
      divisor:     4,
      floor:       2,
      cap:         6,
      retry_floor: 3,
      fold:        CharFold::Exact,
      refine:      false,
      radius:      12,
    });
    assert_eq!(config.sync, SyncConfig {
      target_select:   TargetSelect::Line,
      source_window:   WindowConfig::Radius(30),
      rendered_window: WindowConfig::Line,
    });
  }

  #[test]
  fn unknown_keys_are_rejected() {
    assert!(matches!(
      Config::parse("[locate]\nmystery = 1"),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn invalid_values_are_rejected() {
    assert!(matches!(
      Config::parse("[locate]\ndivisor = 0"),
      Err(ConfigError::ZeroDivisor)
    ));
    assert!(matches!(
      Config::parse("[locate]\nfloor = 0"),
      Err(ConfigError::ZeroFloor)
    ));
    assert!(matches!(
      Config::parse("[locate]\nfloor = 9"),
      Err(ConfigError::FloorAboveCap { floor: 9, cap: 8 })
    ));
    assert!(matches!(
      Config::parse("[locate]\nretry-floor = 0"),
      Err(ConfigError::ZeroRetryFloor)
    ));
  }

  #[test]
  fn from_toml_value() {
    let value: toml::Value = toml::from_str("[sync]\ntarget-select = \"line\"").unwrap();
    let config = Config::from_toml(value).unwrap();
    assert_eq!(config.sync.target_select, TargetSelect::Line);
    assert_eq!(config.locate, LocateConfig::default());
  }
}
