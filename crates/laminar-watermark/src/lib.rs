//! # `LaminarDB` Watermark
//!
//! Event-time statistics and allowed-lateness tagging for partitioned streams.
//!
//! This crate provides:
//! - **Statistics**: [`EventTimeStats`], a mergeable `(max, min, sum, count)` aggregate
//! - **Accumulators**: [`EventTimeStatsAccumulator`], one per task, plus a
//!   message-passing [`StatsCollector`] that folds finished task attempts
//! - **Operator**: [`EventTimeWatermarkOperator`], a pass-through stage that feeds the
//!   accumulator and tags the event-time column with its allowed lateness
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use arrow_array::{Int64Array, RecordBatch};
//! use arrow_schema::{DataType, Field, Schema};
//! use laminar_watermark::operator::{ColumnRef, MemorySource};
//! use laminar_watermark::time::CalendarInterval;
//! use laminar_watermark::EventTimeWatermarkOperator;
//!
//! let schema = Arc::new(Schema::new(vec![Field::new("ts", DataType::Int64, false)]));
//! let batch = RecordBatch::try_new(
//!     Arc::clone(&schema),
//!     vec![Arc::new(Int64Array::from(vec![5_000, 9_000]))],
//! )
//! .unwrap();
//! let source = MemorySource::new(Arc::clone(&schema), vec![vec![batch]]);
//!
//! let delay: CalendarInterval = "2 milliseconds".parse().unwrap();
//! let mut op =
//!     EventTimeWatermarkOperator::try_new(ColumnRef::named("ts"), delay, Arc::new(source)).unwrap();
//!
//! let passed = op.execute(0).unwrap().collect::<Result<Vec<_>, _>>().unwrap();
//! assert_eq!(passed.len(), 1);
//! assert_eq!(op.stats().max, 9);
//! assert_eq!(op.current_watermark().unwrap().timestamp(), 7);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregation;
pub mod config;
pub mod operator;
pub mod schema;
pub mod time;

// Re-export key types
pub use aggregation::{CollectorHandle, EventTimeStats, EventTimeStatsAccumulator, StatsCollector};
pub use config::{MissingColumnPolicy, WatermarkConfig};
pub use operator::EventTimeWatermarkOperator;

/// Result type for laminar-watermark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for laminar-watermark
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operator errors
    #[error("Operator error: {0}")]
    Operator(#[from] operator::OperatorError),

    /// Time-related errors
    #[error("Time error: {0}")]
    Time(#[from] time::TimeError),

    /// Collector errors
    #[error("Collector error: {0}")]
    Collector(#[from] aggregation::CollectorError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
