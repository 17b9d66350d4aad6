//! Message-passing collection of task-local event-time statistics.
//!
//! Tasks never share an accumulator. Each task sends the final value of its own
//! accumulator through a [`CollectorHandle`]; a single [`StatsCollector`] folds
//! the reports into one driver-visible value.
//!
//! ## Attempts
//!
//! A partition may be executed more than once (retries, speculative execution).
//! The collector keeps at most one contribution per partition:
//!
//! - a report from a higher attempt supersedes the current one
//! - a report from a lower or equal attempt is ignored
//! - an abort withdraws the matching attempt and blocks its late report

use fxhash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{EventTimeStats, EventTimeStatsAccumulator};

/// Identifier of one execution of a partition's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskAttempt {
    /// Logical partition
    pub partition: u32,
    /// Execution attempt, increasing with every retry
    pub attempt: u32,
}

impl TaskAttempt {
    /// Creates a task attempt identifier.
    #[must_use]
    pub fn new(partition: u32, attempt: u32) -> Self {
        Self { partition, attempt }
    }
}

/// Message sent from a task to the collector.
#[derive(Debug, Clone)]
pub enum TaskReport {
    /// The attempt finished with the given statistics
    Completed {
        /// Reporting attempt
        task: TaskAttempt,
        /// Final accumulator value of the attempt
        stats: EventTimeStats,
    },
    /// The attempt was aborted; its contribution must be discarded
    Aborted {
        /// Aborted attempt
        task: TaskAttempt,
    },
}

/// Errors that can occur when reporting to a collector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    /// The collector has been dropped
    #[error("Collector closed, report for partition {} attempt {} lost", .0.partition, .0.attempt)]
    Closed(TaskAttempt),
}

/// Sending side of a [`StatsCollector`], cloned into every task.
#[derive(Debug, Clone)]
pub struct CollectorHandle {
    tx: UnboundedSender<TaskReport>,
}

impl CollectorHandle {
    /// Reports the final accumulator value of a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Closed`] if the collector has been dropped.
    pub fn report(
        &self,
        task: TaskAttempt,
        accumulator: &EventTimeStatsAccumulator,
    ) -> Result<(), CollectorError> {
        self.tx
            .send(TaskReport::Completed {
                task,
                stats: accumulator.value(),
            })
            .map_err(|_| CollectorError::Closed(task))
    }

    /// Withdraws an attempt's contribution.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Closed`] if the collector has been dropped.
    pub fn abort(&self, task: TaskAttempt) -> Result<(), CollectorError> {
        self.tx
            .send(TaskReport::Aborted { task })
            .map_err(|_| CollectorError::Closed(task))
    }
}

/// Folds task reports into one canonical [`EventTimeStats`].
#[derive(Debug)]
pub struct StatsCollector {
    rx: UnboundedReceiver<TaskReport>,
    accepted: FxHashMap<u32, (u32, EventTimeStats)>,
    aborted: FxHashSet<TaskAttempt>,
}

impl StatsCollector {
    /// Creates a collector and the first handle for reporting to it.
    #[must_use]
    pub fn new() -> (Self, CollectorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let collector = Self {
            rx,
            accepted: FxHashMap::default(),
            aborted: FxHashSet::default(),
        };
        (collector, CollectorHandle { tx })
    }

    /// Applies every report already sent, without waiting.
    ///
    /// Returns the number of reports applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(report) = self.rx.try_recv() {
            self.apply(report);
            applied += 1;
        }
        applied
    }

    /// Applies reports until every [`CollectorHandle`] has been dropped and
    /// returns the merged statistics.
    pub async fn collect(&mut self) -> EventTimeStats {
        while let Some(report) = self.rx.recv().await {
            self.apply(report);
        }
        self.merged()
    }

    /// Merges the accepted contribution of every partition.
    #[must_use]
    pub fn merged(&self) -> EventTimeStats {
        self.accepted
            .values()
            .fold(EventTimeStats::ZERO, |mut acc, (_, stats)| {
                acc.merge(stats);
                acc
            })
    }

    /// Number of partitions with an accepted contribution.
    #[must_use]
    pub fn partitions(&self) -> usize {
        self.accepted.len()
    }

    /// Attempt currently accepted for `partition`, if any.
    #[must_use]
    pub fn accepted_attempt(&self, partition: u32) -> Option<u32> {
        self.accepted.get(&partition).map(|(attempt, _)| *attempt)
    }

    fn apply(&mut self, report: TaskReport) {
        match report {
            TaskReport::Completed { task, stats } => {
                if self.aborted.contains(&task) {
                    tracing::debug!(
                        partition = task.partition,
                        attempt = task.attempt,
                        "Ignoring report from aborted attempt"
                    );
                    return;
                }
                if let Some((current, _)) = self.accepted.get(&task.partition) {
                    if *current >= task.attempt {
                        tracing::debug!(
                            partition = task.partition,
                            attempt = task.attempt,
                            accepted = *current,
                            "Ignoring stale event-time stats report"
                        );
                        return;
                    }
                }
                tracing::trace!(
                    partition = task.partition,
                    attempt = task.attempt,
                    count = stats.count,
                    "Accepted event-time stats"
                );
                self.accepted.insert(task.partition, (task.attempt, stats));
            }
            TaskReport::Aborted { task } => {
                self.aborted.insert(task);
                if self
                    .accepted
                    .get(&task.partition)
                    .is_some_and(|(attempt, _)| *attempt == task.attempt)
                {
                    self.accepted.remove(&task.partition);
                    tracing::debug!(
                        partition = task.partition,
                        attempt = task.attempt,
                        "Discarded contribution of aborted attempt"
                    );
                }
            }
        }
    }
}
