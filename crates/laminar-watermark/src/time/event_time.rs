//! Event Time Extraction
//!
//! [`EventTimeColumn`] reads per-row event times out of an Arrow `RecordBatch`
//! column and normalises them to milliseconds since the Unix epoch.
//!
//! Plain `Int64` columns are treated as microsecond ordinals. Arrow `Timestamp`
//! columns are converted according to their declared unit.

use std::fmt;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    ArrowPrimitiveType, Int64Type, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, TimeUnit};

use super::TimeError;

/// Physical encoding of an event-time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `Int64` microsecond ordinals, divided by 1000
    UnixMicros,
    /// Arrow `Timestamp` with the given unit
    Arrow(TimeUnit),
}

impl TimestampFormat {
    /// Determines the format for a column type.
    ///
    /// Returns `None` for types that cannot hold event times.
    #[must_use]
    pub fn for_data_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int64 => Some(Self::UnixMicros),
            DataType::Timestamp(unit, _) => Some(Self::Arrow(*unit)),
            _ => None,
        }
    }

    /// Converts a raw column value into milliseconds.
    ///
    /// Division truncates toward zero; second-scale values saturate.
    #[inline]
    #[must_use]
    pub fn to_millis(self, raw: i64) -> i64 {
        match self {
            Self::UnixMicros | Self::Arrow(TimeUnit::Microsecond) => raw / 1_000,
            Self::Arrow(TimeUnit::Second) => raw.saturating_mul(1_000),
            Self::Arrow(TimeUnit::Millisecond) => raw,
            Self::Arrow(TimeUnit::Nanosecond) => raw / 1_000_000,
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::UnixMicros => write!(f, "UnixMicros"),
            TimestampFormat::Arrow(unit) => write!(f, "Timestamp({unit:?})"),
        }
    }
}

/// A resolved event-time column: its position in the batch and its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimeColumn {
    index: usize,
    format: TimestampFormat,
}

impl EventTimeColumn {
    /// Resolves an event-time column from its index and declared type.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::IncompatibleType`] if the type cannot hold event times.
    pub fn try_new(index: usize, data_type: &DataType) -> Result<Self, TimeError> {
        let format =
            TimestampFormat::for_data_type(data_type).ok_or_else(|| TimeError::IncompatibleType {
                index,
                expected: "Int64 or Timestamp".to_string(),
                found: format!("{data_type:?}"),
            })?;
        Ok(Self { index, format })
    }

    /// Column position within the batch.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Column encoding.
    #[must_use]
    pub fn format(&self) -> TimestampFormat {
        self.format
    }

    /// Calls `f` with every non-null event time of `batch`, in row order, in
    /// milliseconds.
    ///
    /// Returns the number of values passed to `f`. Null rows are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch has no column at the resolved index or the
    /// column is not of the resolved type.
    pub fn for_each_millis<F>(&self, batch: &RecordBatch, f: F) -> Result<usize, TimeError>
    where
        F: FnMut(i64),
    {
        if self.index >= batch.num_columns() {
            return Err(TimeError::IndexOutOfBounds {
                index: self.index,
                num_columns: batch.num_columns(),
            });
        }
        let column = batch.column(self.index).as_ref();

        match self.format {
            TimestampFormat::UnixMicros => self.visit::<Int64Type, F>(column, f),
            TimestampFormat::Arrow(TimeUnit::Second) => {
                self.visit::<TimestampSecondType, F>(column, f)
            }
            TimestampFormat::Arrow(TimeUnit::Millisecond) => {
                self.visit::<TimestampMillisecondType, F>(column, f)
            }
            TimestampFormat::Arrow(TimeUnit::Microsecond) => {
                self.visit::<TimestampMicrosecondType, F>(column, f)
            }
            TimestampFormat::Arrow(TimeUnit::Nanosecond) => {
                self.visit::<TimestampNanosecondType, F>(column, f)
            }
        }
    }

    fn visit<T, F>(&self, column: &dyn Array, mut f: F) -> Result<usize, TimeError>
    where
        T: ArrowPrimitiveType<Native = i64>,
        F: FnMut(i64),
    {
        let array = column
            .as_primitive_opt::<T>()
            .ok_or_else(|| TimeError::IncompatibleType {
                index: self.index,
                expected: self.format.to_string(),
                found: format!("{:?}", column.data_type()),
            })?;

        let mut observed = 0;
        for value in array.iter().flatten() {
            f(self.format.to_millis(value));
            observed += 1;
        }
        Ok(observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Int64Array, StringArray, TimestampMicrosecondArray, TimestampSecondArray};
    use arrow_schema::{Field, Schema};
    use std::sync::Arc;

    fn single_column_batch(field: Field, array: Arc<dyn Array>) -> RecordBatch {
        RecordBatch::try_new(Arc::new(Schema::new(vec![field])), vec![array]).unwrap()
    }

    fn collect(column: &EventTimeColumn, batch: &RecordBatch) -> Vec<i64> {
        let mut seen = Vec::new();
        column.for_each_millis(batch, |ts| seen.push(ts)).unwrap();
        seen
    }

    #[test]
    fn test_int64_is_microseconds() {
        let batch = single_column_batch(
            Field::new("ts", DataType::Int64, false),
            Arc::new(Int64Array::from(vec![5_000, 1_999, -1_500])),
        );
        let column = EventTimeColumn::try_new(0, &DataType::Int64).unwrap();

        // truncating division, toward zero for negatives
        assert_eq!(collect(&column, &batch), vec![5, 1, -1]);
    }

    #[test]
    fn test_timestamp_units() {
        let micros = single_column_batch(
            Field::new("ts", DataType::Timestamp(TimeUnit::Microsecond, None), false),
            Arc::new(TimestampMicrosecondArray::from(vec![7_000_000])),
        );
        let column = EventTimeColumn::try_new(
            0,
            &DataType::Timestamp(TimeUnit::Microsecond, None),
        )
        .unwrap();
        assert_eq!(collect(&column, &micros), vec![7_000]);

        let seconds = single_column_batch(
            Field::new("ts", DataType::Timestamp(TimeUnit::Second, None), false),
            Arc::new(TimestampSecondArray::from(vec![7])),
        );
        let column =
            EventTimeColumn::try_new(0, &DataType::Timestamp(TimeUnit::Second, None)).unwrap();
        assert_eq!(collect(&column, &seconds), vec![7_000]);
    }

    #[test]
    fn test_nulls_are_skipped() {
        let batch = single_column_batch(
            Field::new("ts", DataType::Int64, true),
            Arc::new(Int64Array::from(vec![Some(3_000), None, Some(4_000)])),
        );
        let column = EventTimeColumn::try_new(0, &DataType::Int64).unwrap();

        let mut seen = Vec::new();
        let observed = column.for_each_millis(&batch, |ts| seen.push(ts)).unwrap();
        assert_eq!(observed, 2);
        assert_eq!(seen, vec![3, 4]);
    }

    #[test]
    fn test_incompatible_declared_type() {
        let err = EventTimeColumn::try_new(0, &DataType::Utf8).unwrap_err();
        assert!(matches!(err, TimeError::IncompatibleType { index: 0, .. }));
    }

    #[test]
    fn test_batch_type_mismatch() {
        let batch = single_column_batch(
            Field::new("ts", DataType::Utf8, false),
            Arc::new(StringArray::from(vec!["2024-01-01"])),
        );
        let column = EventTimeColumn::try_new(0, &DataType::Int64).unwrap();

        let err = column.for_each_millis(&batch, |_| {}).unwrap_err();
        assert!(matches!(err, TimeError::IncompatibleType { .. }));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let batch = single_column_batch(
            Field::new("ts", DataType::Int64, false),
            Arc::new(Int64Array::from(vec![1])),
        );
        let column = EventTimeColumn::try_new(3, &DataType::Int64).unwrap();

        let err = column.for_each_millis(&batch, |_| {}).unwrap_err();
        assert!(matches!(
            err,
            TimeError::IndexOutOfBounds {
                index: 3,
                num_columns: 1
            }
        ));
    }
}
