//! # Aggregation Module
//!
//! Mergeable event-time statistics and their collection across partitions.
//!
//! ## Module Overview
//!
//! - [`stats`]: [`EventTimeStats`], the `(max, min, sum, count)` value and its merge algebra
//! - [`accumulator`]: [`EventTimeStatsAccumulator`], the per-task mergeable container
//! - [`collector`]: [`StatsCollector`], folds finished task attempts exactly once per partition

/// Per-task accumulator.
pub mod accumulator;
/// Message-passing collection of task results.
pub mod collector;
/// Event-time statistics value type.
pub mod stats;

pub use accumulator::EventTimeStatsAccumulator;
pub use collector::{CollectorError, CollectorHandle, StatsCollector, TaskAttempt, TaskReport};
pub use stats::EventTimeStats;
