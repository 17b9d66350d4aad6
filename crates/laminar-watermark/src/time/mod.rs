//! # Time Module
//!
//! Event time values, watermarks, and lateness intervals.
//!
//! ## Concepts
//!
//! - **Event Time**: Timestamp when the event actually occurred, in milliseconds
//! - **Watermark**: Assertion that no events with timestamp < watermark will arrive
//! - **Allowed Lateness**: A [`CalendarInterval`] subtracted from the maximum observed
//!   event time to produce the watermark
//!
//! ## Event Time Extraction
//!
//! Use [`EventTimeColumn`] to read per-row timestamps out of Arrow `RecordBatch` columns:
//!
//! ```ignore
//! use laminar_watermark::time::EventTimeColumn;
//!
//! let column = EventTimeColumn::try_new(index, schema.field(index).data_type())?;
//! column.for_each_millis(&batch, |ts| stats.add(ts))?;
//! ```
//!
//! ## Lateness Intervals
//!
//! ```rust
//! use laminar_watermark::time::CalendarInterval;
//!
//! let delay: CalendarInterval = "10 minutes".parse().unwrap();
//! assert_eq!(delay.delay_ms(), 600_000);
//! ```

mod event_time;
mod interval;

pub use event_time::{EventTimeColumn, TimestampFormat};
pub use interval::{CalendarInterval, DAYS_PER_MONTH, MILLIS_PER_DAY};

/// A watermark indicating event time progress.
///
/// Watermarks are assertions that no events with timestamps earlier than the
/// watermark will arrive. Downstream operators use them to finalize or evict
/// state older than the watermark.
///
/// # Example
///
/// ```rust
/// use laminar_watermark::time::Watermark;
///
/// let watermark = Watermark::new(1000);
///
/// assert!(watermark.is_late(999));
/// assert!(!watermark.is_late(1000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(pub i64);

impl Watermark {
    /// Creates a new watermark with the given timestamp.
    #[inline]
    #[must_use]
    pub fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// Derives a watermark from the maximum observed event time and a delay.
    ///
    /// Saturates at `i64::MIN` instead of wrapping.
    #[inline]
    #[must_use]
    pub fn from_max_event_time(max_event_time: i64, delay_ms: i64) -> Self {
        Self(max_event_time.saturating_sub(delay_ms))
    }

    /// Returns the watermark timestamp in milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    /// Checks if an event is late relative to this watermark.
    ///
    /// An event is considered late if its timestamp is strictly less than
    /// the watermark timestamp.
    #[inline]
    #[must_use]
    pub fn is_late(&self, event_time: i64) -> bool {
        event_time < self.0
    }
}

impl From<Watermark> for i64 {
    fn from(watermark: Watermark) -> Self {
        watermark.0
    }
}

/// Errors that can occur in time operations.
#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    /// Interval string could not be parsed
    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval {
        /// The text that failed to parse
        input: String,
        /// Reason for failure
        reason: String,
    },

    /// Interval component does not fit its field
    #[error("Interval component overflows: {0}")]
    IntervalOverflow(String),

    /// Column type cannot hold event times
    #[error("Incompatible event-time column {index}: expected {expected}, found {found}")]
    IncompatibleType {
        /// Column index
        index: usize,
        /// Expected type
        expected: String,
        /// Actual type found
        found: String,
    },

    /// Column index out of bounds
    #[error("Column index {index} out of bounds (batch has {num_columns} columns)")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Number of columns in batch
        num_columns: usize,
    },
}
