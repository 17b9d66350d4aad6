//! Configuration for the event-time watermark operator.
//!
//! A [`WatermarkConfig`] names the event-time column and the allowed lateness.
//! It is built in code or loaded from TOML:
//!
//! ```rust
//! use laminar_watermark::WatermarkConfig;
//!
//! let config = WatermarkConfig::from_toml_str(
//!     r#"
//!     event_time_column = "ts"
//!     delay = "10 minutes"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.delay.delay_ms(), 600_000);
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnId, ColumnRef};
use crate::time::CalendarInterval;

/// What to do when the event-time column is absent from the input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumnPolicy {
    /// Fail operator construction.
    #[default]
    Error,
    /// Leave the schema untagged and pass data through without statistics.
    Ignore,
}

/// Configuration for an event-time watermark operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkConfig {
    /// Name of the event-time column.
    pub event_time_column: String,

    /// Logical id of the event-time column, when the planner assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<u64>,

    /// Allowed lateness.
    #[serde(default)]
    pub delay: CalendarInterval,

    /// Behavior when the event-time column cannot be found.
    #[serde(default)]
    pub on_missing_column: MissingColumnPolicy,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            event_time_column: "event_time".to_string(),
            column_id: None,
            delay: CalendarInterval::ZERO,
            on_missing_column: MissingColumnPolicy::Error,
        }
    }
}

impl WatermarkConfig {
    /// Creates a configuration for the given column and delay.
    #[must_use]
    pub fn new(event_time_column: impl Into<String>, delay: CalendarInterval) -> Self {
        Self {
            event_time_column: event_time_column.into(),
            delay,
            ..Default::default()
        }
    }

    /// Sets the logical column id.
    #[must_use]
    pub fn with_column_id(mut self, id: u64) -> Self {
        self.column_id = Some(id);
        self
    }

    /// Sets the missing-column policy.
    #[must_use]
    pub fn with_missing_column_policy(mut self, policy: MissingColumnPolicy) -> Self {
        self.on_missing_column = policy;
        self
    }

    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or invalid values, and
    /// [`ConfigError::Invalid`] if the configuration fails [`validate`](Self::validate).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the operator cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty column name or a negative delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_time_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "event_time_column must not be empty".to_string(),
            ));
        }
        if self.delay.is_negative() {
            return Err(ConfigError::Invalid(format!(
                "delay must not be negative: {}",
                self.delay
            )));
        }
        Ok(())
    }

    /// Reference to the configured event-time column.
    #[must_use]
    pub fn column_ref(&self) -> ColumnRef {
        match self.column_id {
            Some(id) => ColumnRef::with_id(self.event_time_column.clone(), ColumnId(id)),
            None => ColumnRef::named(self.event_time_column.clone()),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
