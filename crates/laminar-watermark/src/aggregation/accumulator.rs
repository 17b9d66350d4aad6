//! Per-task accumulator around [`EventTimeStats`].

use super::EventTimeStats;

/// Mergeable container holding one [`EventTimeStats`].
///
/// Every execution context that processes a partition owns its own accumulator.
/// Contexts obtain one through [`copy_and_reset`](Self::copy_and_reset) (or
/// [`copy_independent`](Self::copy_independent) when the current value should be
/// carried over) and the engine merges the finished copies into one canonical value.
///
/// An accumulator is mutated only through `&mut self`; sharing one instance
/// between threads requires handing it over, never concurrent mutation.
///
/// # Example
///
/// ```rust
/// use laminar_watermark::EventTimeStatsAccumulator;
///
/// let driver = EventTimeStatsAccumulator::new();
/// let mut task_a = driver.copy_and_reset();
/// let mut task_b = driver.copy_and_reset();
/// task_a.add(10);
/// task_b.add(20);
///
/// let mut merged = driver.copy_independent();
/// merged.merge(&task_a);
/// merged.merge(&task_b);
/// assert_eq!(merged.value().max, 20);
/// assert!(driver.is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventTimeStatsAccumulator {
    stats: EventTimeStats,
}

impl EventTimeStatsAccumulator {
    /// Creates an accumulator holding the identity value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: EventTimeStats::ZERO,
        }
    }

    /// Returns true if the held value equals [`EventTimeStats::ZERO`].
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.stats == EventTimeStats::ZERO
    }

    /// Returns a snapshot of the held value.
    #[must_use]
    pub fn value(&self) -> EventTimeStats {
        self.stats
    }

    /// Returns a new accumulator seeded with the current value.
    ///
    /// Later mutations of either accumulator do not affect the other.
    #[must_use]
    pub fn copy_independent(&self) -> Self {
        Self { stats: self.stats }
    }

    /// Returns a new accumulator of the same kind holding the identity value.
    #[must_use]
    pub fn copy_and_reset(&self) -> Self {
        Self::new()
    }

    /// Resets the held value to the identity.
    pub fn reset(&mut self) {
        self.stats = EventTimeStats::ZERO;
    }

    /// Records one event time.
    #[inline]
    pub fn add(&mut self, event_time: i64) {
        self.stats.add(event_time);
    }

    /// Merges the value of `other` into this accumulator.
    ///
    /// `other` is left unchanged.
    pub fn merge(&mut self, other: &Self) {
        self.stats.merge(&other.stats);
    }
}

impl From<EventTimeStats> for EventTimeStatsAccumulator {
    fn from(stats: EventTimeStats) -> Self {
        Self { stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero() {
        let acc = EventTimeStatsAccumulator::new();
        assert!(acc.is_zero());
        assert_eq!(acc.value(), EventTimeStats::ZERO);
    }

    #[test]
    fn test_add_and_value() {
        let mut acc = EventTimeStatsAccumulator::new();
        for ts in [5, 1, 9, 3] {
            acc.add(ts);
        }
        assert!(!acc.is_zero());

        let value = acc.value();
        assert_eq!(value.max, 9);
        assert_eq!(value.min, 1);
        assert_eq!(value.sum, 18);
        assert_eq!(value.count, 4);
        assert_eq!(value.avg(), Some(4));
    }

    #[test]
    fn test_reset_restores_identity() {
        let mut acc = EventTimeStatsAccumulator::new();
        acc.add(42);
        acc.reset();

        assert!(acc.is_zero());
        assert_eq!(acc.value(), EventTimeStats::ZERO);
    }

    #[test]
    fn test_copy_independent_is_detached() {
        let mut original = EventTimeStatsAccumulator::new();
        original.add(100);

        let mut copy = original.copy_independent();
        assert_eq!(copy.value(), original.value());

        copy.add(500);
        assert_eq!(original.value().max, 100);
        assert_eq!(copy.value().max, 500);

        original.reset();
        assert_eq!(copy.value().count, 2);
    }

    #[test]
    fn test_copy_and_reset() {
        let mut original = EventTimeStatsAccumulator::new();
        original.add(7);

        let fresh = original.copy_and_reset();
        assert!(fresh.is_zero());
        assert_eq!(original.value().count, 1);
    }

    #[test]
    fn test_merge_only_mutates_self() {
        let mut a = EventTimeStatsAccumulator::new();
        a.add(1);
        let mut b = EventTimeStatsAccumulator::new();
        b.add(9);

        a.merge(&b);
        assert_eq!(a.value().max, 9);
        assert_eq!(a.value().min, 1);
        assert_eq!(b.value().count, 1);
        assert_eq!(b.value().min, 9);
    }
}
