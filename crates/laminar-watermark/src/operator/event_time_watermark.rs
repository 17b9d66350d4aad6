//! Event-time watermark operator.
//!
//! [`EventTimeWatermarkOperator`] is a transparent pass-through stage. For every
//! row it reads the event time, converts it to milliseconds, and records it in
//! the operator's [`EventTimeStatsAccumulator`]. Its output schema is the input
//! schema with the event-time column tagged with the allowed lateness, which
//! downstream stateful operators read to compute `watermark = max - delay`.
//!
//! ## Parallel execution
//!
//! Each task works on its own [`fork`](EventTimeWatermarkOperator::fork) of the
//! operator and reports the forked accumulator to a
//! [`StatsCollector`](crate::aggregation::StatsCollector) when it finishes.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use laminar_watermark::aggregation::{StatsCollector, TaskAttempt};
//! # use laminar_watermark::EventTimeWatermarkOperator;
//! # fn run(driver: &EventTimeWatermarkOperator) -> laminar_watermark::Result<()> {
//! let (mut collector, handle) = StatsCollector::new();
//! std::thread::scope(|s| {
//!     for partition in 0..driver.input().partitions() {
//!         let mut task = driver.fork();
//!         let handle = handle.clone();
//!         s.spawn(move || -> laminar_watermark::Result<()> {
//!             for batch in task.execute(partition)? {
//!                 let _batch = batch?;
//!             }
//!             let attempt = TaskAttempt::new(u32::try_from(partition).unwrap(), 0);
//!             handle.report(attempt, task.accumulator())?;
//!             Ok(())
//!         });
//!     }
//! });
//! collector.drain();
//! let watermark = collector.merged().watermark(driver.delay_ms());
//! # Ok(())
//! # }
//! ```

use std::iter::Map;
use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use super::{BatchIter, BatchSource, OperatorError};
use crate::aggregation::{EventTimeStats, EventTimeStatsAccumulator};
use crate::config::{MissingColumnPolicy, WatermarkConfig};
use crate::schema::{tag_event_time_column, ColumnRef};
use crate::time::{CalendarInterval, EventTimeColumn, Watermark};

type BatchResult = Result<RecordBatch, OperatorError>;

/// Pass-through operator that measures event times and tags the output schema.
#[derive(Debug)]
pub struct EventTimeWatermarkOperator {
    event_time: ColumnRef,
    delay: CalendarInterval,
    delay_ms: i64,
    input: Arc<dyn BatchSource>,
    output_schema: SchemaRef,
    column: Option<EventTimeColumn>,
    accumulator: EventTimeStatsAccumulator,
}

impl EventTimeWatermarkOperator {
    /// Creates an operator over `input`.
    ///
    /// The output schema is derived here, once.
    ///
    /// # Errors
    ///
    /// Returns an error if the event-time column is missing from the input schema
    /// or its type cannot hold event times.
    pub fn try_new(
        event_time: ColumnRef,
        delay: CalendarInterval,
        input: Arc<dyn BatchSource>,
    ) -> crate::Result<Self> {
        Self::with_policy(event_time, delay, input, MissingColumnPolicy::Error)
    }

    /// Creates an operator from a [`WatermarkConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or, under
    /// [`MissingColumnPolicy::Error`], the event-time column is missing.
    pub fn from_config(config: &WatermarkConfig, input: Arc<dyn BatchSource>) -> crate::Result<Self> {
        config.validate()?;
        Self::with_policy(
            config.column_ref(),
            config.delay,
            input,
            config.on_missing_column,
        )
    }

    /// Creates an operator with an explicit missing-column policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the event-time column has an incompatible type, or is
    /// missing and `policy` is [`MissingColumnPolicy::Error`].
    pub fn with_policy(
        event_time: ColumnRef,
        delay: CalendarInterval,
        input: Arc<dyn BatchSource>,
        policy: MissingColumnPolicy,
    ) -> crate::Result<Self> {
        let input_schema = input.schema();
        let delay_ms = delay.delay_ms();
        let (output_schema, index) = tag_event_time_column(&input_schema, &event_time, delay_ms);

        let column = match index {
            Some(index) => Some(EventTimeColumn::try_new(
                index,
                input_schema.field(index).data_type(),
            )?),
            None => match policy {
                MissingColumnPolicy::Error => {
                    return Err(OperatorError::ColumnNotFound {
                        column: event_time.to_string(),
                        available: input_schema
                            .fields()
                            .iter()
                            .map(|f| f.name().clone())
                            .collect(),
                    }
                    .into());
                }
                MissingColumnPolicy::Ignore => {
                    tracing::warn!(
                        column = %event_time,
                        "Event-time column not found, output schema left untagged"
                    );
                    None
                }
            },
        };

        tracing::debug!(
            column = %event_time,
            index = ?index,
            delay = %delay,
            delay_ms,
            "Created event-time watermark operator"
        );

        Ok(Self {
            event_time,
            delay,
            delay_ms,
            input,
            output_schema,
            column,
            accumulator: EventTimeStatsAccumulator::new(),
        })
    }

    /// Returns a task-local instance sharing this operator's configuration.
    ///
    /// The fork starts from a zero accumulator, so merging every fork's value
    /// never counts the driver's own value twice.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            event_time: self.event_time.clone(),
            delay: self.delay,
            delay_ms: self.delay_ms,
            input: Arc::clone(&self.input),
            output_schema: Arc::clone(&self.output_schema),
            column: self.column,
            accumulator: self.accumulator.copy_and_reset(),
        }
    }

    /// Wraps a stream of batches.
    ///
    /// The returned iterator yields every batch unchanged and records its event
    /// times as it goes. Nothing is recorded until the iterator is consumed;
    /// consuming the same input twice records it twice.
    pub fn process<I>(
        &mut self,
        input: I,
    ) -> PassThrough<'_, Map<I::IntoIter, fn(RecordBatch) -> BatchResult>>
    where
        I: IntoIterator<Item = RecordBatch>,
    {
        let wrap: fn(RecordBatch) -> BatchResult = Ok;
        self.process_results(input.into_iter().map(wrap))
    }

    /// Like [`process`](Self::process), for fallible upstream streams.
    ///
    /// Upstream errors are passed through unchanged.
    pub fn process_results<I>(&mut self, input: I) -> PassThrough<'_, I::IntoIter>
    where
        I: IntoIterator<Item = BatchResult>,
    {
        PassThrough {
            inner: input.into_iter(),
            column: self.column,
            accumulator: &mut self.accumulator,
        }
    }

    /// Executes one partition of the upstream source through this operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream source cannot start the partition.
    pub fn execute(&mut self, partition: usize) -> Result<PassThrough<'_, BatchIter>, OperatorError> {
        let batches = self.input.execute(partition)?;
        Ok(self.process_results(batches))
    }

    /// Input schema.
    #[must_use]
    pub fn input_schema(&self) -> SchemaRef {
        self.input.schema()
    }

    /// Output schema with the event-time column tagged.
    #[must_use]
    pub fn output_schema(&self) -> SchemaRef {
        Arc::clone(&self.output_schema)
    }

    /// Upstream source.
    #[must_use]
    pub fn input(&self) -> &Arc<dyn BatchSource> {
        &self.input
    }

    /// Configured event-time column.
    #[must_use]
    pub fn event_time_column(&self) -> &ColumnRef {
        &self.event_time
    }

    /// Position of the event-time column, or `None` if it was not found.
    #[must_use]
    pub fn event_time_index(&self) -> Option<usize> {
        self.column.map(|c| c.index())
    }

    /// Configured allowed lateness.
    #[must_use]
    pub fn delay(&self) -> CalendarInterval {
        self.delay
    }

    /// Allowed lateness in milliseconds, as written to the output schema.
    #[must_use]
    pub fn delay_ms(&self) -> i64 {
        self.delay_ms
    }

    /// The operator's accumulator.
    #[must_use]
    pub fn accumulator(&self) -> &EventTimeStatsAccumulator {
        &self.accumulator
    }

    /// Mutable access to the operator's accumulator, for merging task results.
    pub fn accumulator_mut(&mut self) -> &mut EventTimeStatsAccumulator {
        &mut self.accumulator
    }

    /// Statistics recorded so far.
    #[must_use]
    pub fn stats(&self) -> EventTimeStats {
        self.accumulator.value()
    }

    /// Watermark implied by the statistics recorded so far.
    ///
    /// Returns `None` before any event time has been recorded.
    #[must_use]
    pub fn current_watermark(&self) -> Option<Watermark> {
        self.stats().watermark(self.delay_ms)
    }
}

/// Lazy pass-through iterator returned by
/// [`EventTimeWatermarkOperator::process`].
#[derive(Debug)]
pub struct PassThrough<'a, I> {
    inner: I,
    column: Option<EventTimeColumn>,
    accumulator: &'a mut EventTimeStatsAccumulator,
}

impl<I> Iterator for PassThrough<'_, I>
where
    I: Iterator<Item = BatchResult>,
{
    type Item = BatchResult;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = match self.inner.next()? {
            Ok(batch) => batch,
            Err(e) => return Some(Err(e)),
        };

        if let Some(column) = self.column {
            let accumulator = &mut *self.accumulator;
            match column.for_each_millis(&batch, |ts| accumulator.add(ts)) {
                Ok(observed) => {
                    tracing::trace!(rows = batch.num_rows(), observed, "Recorded event times");
                }
                Err(e) => return Some(Err(e.into())),
            }
        }

        Some(Ok(batch))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
