//! # Operator Module
//!
//! The event-time watermark operator and the upstream abstraction it reads from.
//!
//! The engine calls the operator once per partition. The operator wraps the
//! partition's batch stream lazily: every batch is yielded unchanged, and the
//! event times of its rows are recorded in the operator's accumulator as a side
//! effect of iteration.

use std::fmt;
use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

mod event_time_watermark;

pub use event_time_watermark::{EventTimeWatermarkOperator, PassThrough};

pub use crate::schema::{ColumnId, ColumnRef};
use crate::time::TimeError;

/// Stream of batches produced for one partition.
pub type BatchIter = Box<dyn Iterator<Item = Result<RecordBatch, OperatorError>> + Send>;

/// An upstream stage producing partitioned `RecordBatch` streams.
///
/// Implementations must be restartable if callers iterate a partition more than
/// once; the watermark operator adds no buffering of its own.
pub trait BatchSource: Send + Sync + fmt::Debug {
    /// Schema shared by every batch of every partition.
    fn schema(&self) -> SchemaRef;

    /// Number of partitions.
    fn partitions(&self) -> usize;

    /// Starts producing the batches of one partition.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorError::PartitionOutOfRange`] for an unknown partition.
    fn execute(&self, partition: usize) -> Result<BatchIter, OperatorError>;
}

/// In-memory [`BatchSource`] holding pre-built batches per partition.
#[derive(Debug, Clone)]
pub struct MemorySource {
    schema: SchemaRef,
    partitions: Arc<Vec<Vec<RecordBatch>>>,
}

impl MemorySource {
    /// Creates a source serving `partitions[i]` for partition `i`.
    #[must_use]
    pub fn new(schema: SchemaRef, partitions: Vec<Vec<RecordBatch>>) -> Self {
        Self {
            schema,
            partitions: Arc::new(partitions),
        }
    }
}

impl BatchSource for MemorySource {
    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn partitions(&self) -> usize {
        self.partitions.len()
    }

    fn execute(&self, partition: usize) -> Result<BatchIter, OperatorError> {
        let batches = self
            .partitions
            .get(partition)
            .ok_or(OperatorError::PartitionOutOfRange {
                partition,
                partitions: self.partitions.len(),
            })?
            .clone();
        Ok(Box::new(batches.into_iter().map(Ok)))
    }
}

/// Errors that can occur in operators
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// Event-time column not present in the input schema
    #[error("Event-time column '{column}' not found (available: {available:?})")]
    ColumnNotFound {
        /// Configured column reference
        column: String,
        /// Columns of the input schema
        available: Vec<String>,
    },

    /// Event times could not be read from a batch
    #[error("Event time extraction failed: {0}")]
    EventTime(#[from] TimeError),

    /// Requested partition does not exist
    #[error("Partition {partition} out of range (source has {partitions} partitions)")]
    PartitionOutOfRange {
        /// Requested partition
        partition: usize,
        /// Number of partitions
        partitions: usize,
    },

    /// Upstream stage failed
    #[error("Source failed: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::Int64Array;
    use arrow_schema::{DataType, Field, Schema};

    #[test]
    fn test_memory_source_partitions() {
        let schema = Arc::new(Schema::new(vec![Field::new("ts", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![Arc::new(Int64Array::from(vec![1, 2, 3]))],
        )
        .unwrap();
        let source = MemorySource::new(schema, vec![vec![batch.clone()], vec![]]);

        assert_eq!(source.partitions(), 2);
        let first: Vec<_> = source.execute(0).unwrap().map(Result::unwrap).collect();
        assert_eq!(first, vec![batch]);
        assert_eq!(source.execute(1).unwrap().count(), 0);
        assert!(matches!(
            source.execute(2),
            Err(OperatorError::PartitionOutOfRange {
                partition: 2,
                partitions: 2
            })
        ));
    }
}
