//! Running statistics over observed event times.

use std::fmt;

use crate::time::Watermark;

/// Max, min, sum, and count of observed event times (milliseconds).
///
/// Merging is component-wise and both associative and commutative, so partial
/// statistics from any subset of partitions combine in any order. [`EventTimeStats::ZERO`]
/// is the merge identity.
///
/// The sum is kept in 128 bits so that neither `add` nor `merge` can overflow
/// for any realistic stream volume.
///
/// # Example
///
/// ```rust
/// use laminar_watermark::EventTimeStats;
///
/// let stats: EventTimeStats = [5, 1, 9, 3].into_iter().collect();
/// assert_eq!((stats.max, stats.min, stats.sum, stats.count), (9, 1, 18, 4));
/// assert_eq!(stats.avg(), Some(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventTimeStats {
    /// Latest event time observed
    pub max: i64,
    /// Earliest event time observed
    pub min: i64,
    /// Sum of all observed event times
    pub sum: i128,
    /// Number of observed event times
    pub count: u64,
}

impl EventTimeStats {
    /// The merge identity: no event times observed.
    pub const ZERO: Self = Self {
        max: i64::MIN,
        min: i64::MAX,
        sum: 0,
        count: 0,
    };

    /// Records one event time.
    #[inline]
    pub fn add(&mut self, event_time: i64) {
        self.max = self.max.max(event_time);
        self.min = self.min.min(event_time);
        self.sum += i128::from(event_time);
        self.count += 1;
    }

    /// Merges another set of statistics into this one.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.max = self.max.max(other.max);
        self.min = self.min.min(other.min);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Returns true if no event time has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean event time, truncated toward zero.
    ///
    /// Returns `None` when no event time has been observed.
    #[must_use]
    pub fn avg(&self) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        // A mean of i64 values always fits an i64.
        i64::try_from(self.sum / i128::from(self.count)).ok()
    }

    /// Watermark derived from the maximum observed event time and a delay.
    ///
    /// Returns `None` when no event time has been observed.
    #[must_use]
    pub fn watermark(&self, delay_ms: i64) -> Option<Watermark> {
        if self.is_empty() {
            None
        } else {
            Some(Watermark::from_max_event_time(self.max, delay_ms))
        }
    }
}

impl Default for EventTimeStats {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Extend<i64> for EventTimeStats {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for event_time in iter {
            self.add(event_time);
        }
    }
}

impl FromIterator<i64> for EventTimeStats {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut stats = Self::ZERO;
        stats.extend(iter);
        stats
    }
}

impl fmt::Display for EventTimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.avg() {
            Some(avg) => write!(
                f,
                "max={} min={} avg={} count={}",
                self.max, self.min, avg, self.count
            ),
            None => write!(f, "empty"),
        }
    }
}
