//! Event-time column identity and allowed-lateness schema annotation.
//!
//! Arrow stores field metadata as a string map. The helpers here are the only
//! place that reads or writes the watermark keys, so every consumer sees typed
//! values:
//!
//! - [`ALLOWED_LATENESS_KEY`]: the delay in milliseconds (`i64`)
//! - [`COLUMN_ID_KEY`]: the logical column id (`u64`) assigned by the planner
//!
//! Writing a key overwrites its previous value and preserves every other key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arrow_schema::{Field, Schema, SchemaRef};

/// Field metadata key holding the allowed lateness in milliseconds.
pub const ALLOWED_LATENESS_KEY: &str = "allowedLateness";

/// Field metadata key holding the logical column id.
pub const COLUMN_ID_KEY: &str = "laminar.column_id";

/// Logical identity of a column, stable across renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u64);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference to the event-time column.
///
/// A reference carrying a [`ColumnId`] matches the field with the same id
/// regardless of its name, and never a field carrying a different id. Fields
/// without an id are matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    name: String,
    id: Option<ColumnId>,
}

impl ColumnRef {
    /// References a column by name only.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// References a column by name and logical id.
    #[must_use]
    pub fn with_id(name: impl Into<String>, id: ColumnId) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
        }
    }

    /// Name the column had when the reference was made.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical id, if known.
    #[must_use]
    pub fn id(&self) -> Option<ColumnId> {
        self.id
    }

    /// Returns true if `field` is the referenced column.
    #[must_use]
    pub fn matches(&self, field: &Field) -> bool {
        match (self.id, column_id(field)) {
            (Some(wanted), Some(found)) => wanted == found,
            _ => field.name() == &self.name,
        }
    }

    /// Position of the referenced column in `schema`, if present.
    ///
    /// A field carrying the reference's id wins over any field matched by name,
    /// wherever it sits in the schema.
    #[must_use]
    pub fn resolve(&self, schema: &Schema) -> Option<usize> {
        let fields = schema.fields();
        if let Some(id) = self.id {
            if let Some(index) = fields.iter().position(|f| column_id(f) == Some(id)) {
                return Some(index);
            }
        }
        fields.iter().position(|f| self.matches(f))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}{id}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Reads the logical column id of a field.
#[must_use]
pub fn column_id(field: &Field) -> Option<ColumnId> {
    field
        .metadata()
        .get(COLUMN_ID_KEY)
        .and_then(|v| v.parse().ok())
        .map(ColumnId)
}

/// Reads the allowed lateness (milliseconds) attached to a field.
#[must_use]
pub fn allowed_lateness_ms(field: &Field) -> Option<i64> {
    field
        .metadata()
        .get(ALLOWED_LATENESS_KEY)
        .and_then(|v| v.parse().ok())
}

fn with_metadata_entry(field: &Field, key: &str, value: String) -> Field {
    let mut metadata: HashMap<String, String> = field.metadata().clone();
    metadata.insert(key.to_string(), value);
    field.clone().with_metadata(metadata)
}

/// Returns a copy of `field` carrying `id` as its logical column id.
#[must_use]
pub fn with_column_id(field: &Field, id: ColumnId) -> Field {
    with_metadata_entry(field, COLUMN_ID_KEY, id.0.to_string())
}

/// Returns a copy of `field` carrying `delay_ms` as its allowed lateness.
#[must_use]
pub fn with_allowed_lateness(field: &Field, delay_ms: i64) -> Field {
    with_metadata_entry(field, ALLOWED_LATENESS_KEY, delay_ms.to_string())
}

/// Tags the column referenced by `column` with `delay_ms`.
///
/// Returns the new schema and the position of the tagged column. Column order,
/// other columns, and schema-level metadata are preserved. If no column matches,
/// the schema is returned unchanged with `None`.
#[must_use]
pub fn tag_event_time_column(
    schema: &Schema,
    column: &ColumnRef,
    delay_ms: i64,
) -> (SchemaRef, Option<usize>) {
    let Some(index) = column.resolve(schema) else {
        return (Arc::new(schema.clone()), None);
    };

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == index {
                with_allowed_lateness(f, delay_ms)
            } else {
                f.as_ref().clone()
            }
        })
        .collect();

    let tagged = Schema::new_with_metadata(fields, schema.metadata().clone());
    (Arc::new(tagged), Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, TimeUnit};

    fn ts_field() -> Field {
        Field::new("ts", DataType::Timestamp(TimeUnit::Microsecond, None), false)
    }

    #[test]
    fn test_tag_by_name() {
        let schema = Schema::new(vec![ts_field(), Field::new("value", DataType::Int32, true)]);

        let (tagged, index) = tag_event_time_column(&schema, &ColumnRef::named("ts"), 600_000);

        assert_eq!(index, Some(0));
        assert_eq!(allowed_lateness_ms(tagged.field(0)), Some(600_000));
        assert_eq!(tagged.field(1), schema.field(1));
        assert!(tagged.field(1).metadata().is_empty());
    }

    #[test]
    fn test_existing_metadata_preserved_and_key_overwritten() {
        let mut metadata = HashMap::new();
        metadata.insert("comment".to_string(), "event time".to_string());
        metadata.insert(ALLOWED_LATENESS_KEY.to_string(), "1".to_string());
        let schema = Schema::new(vec![ts_field().with_metadata(metadata)]);

        let (tagged, _) = tag_event_time_column(&schema, &ColumnRef::named("ts"), 5_000);
        let field = tagged.field(0);

        assert_eq!(allowed_lateness_ms(field), Some(5_000));
        assert_eq!(
            field.metadata().get("comment").map(String::as_str),
            Some("event time")
        );
        assert_eq!(field.metadata().len(), 2);
    }

    #[test]
    fn test_schema_metadata_preserved() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "orders".to_string());
        let schema = Schema::new_with_metadata(vec![ts_field()], metadata.clone());

        let (tagged, _) = tag_event_time_column(&schema, &ColumnRef::named("ts"), 1);
        assert_eq!(tagged.metadata(), &metadata);
    }

    #[test]
    fn test_renamed_column_matched_by_id() {
        let renamed = with_column_id(
            &Field::new("event_ts", DataType::Int64, false),
            ColumnId(7),
        );
        let decoy = Field::new("ts", DataType::Int64, false);
        let schema = Schema::new(vec![decoy, renamed]);

        let column = ColumnRef::with_id("ts", ColumnId(7));
        let (tagged, index) = tag_event_time_column(&schema, &column, 1_000);

        assert_eq!(index, Some(1));
        assert_eq!(allowed_lateness_ms(tagged.field(1)), Some(1_000));
        assert_eq!(allowed_lateness_ms(tagged.field(0)), None);
    }

    #[test]
    fn test_id_wins_over_earlier_same_name_field() {
        let schema = Schema::new(vec![
            Field::new("ts", DataType::Int64, false),
            Field::new("value", DataType::Int64, false),
            with_column_id(&Field::new("ts_renamed", DataType::Int64, false), ColumnId(9)),
        ]);

        let column = ColumnRef::with_id("ts", ColumnId(9));
        assert_eq!(column.resolve(&schema), Some(2));
        assert_eq!(ColumnRef::named("ts").resolve(&schema), Some(0));
    }

    #[test]
    fn test_id_falls_back_to_name_among_fields_without_id() {
        let schema = Schema::new(vec![
            with_column_id(&Field::new("ts", DataType::Int64, false), ColumnId(1)),
            Field::new("ts", DataType::Int64, false),
        ]);

        let column = ColumnRef::with_id("ts", ColumnId(2));
        assert_eq!(column.resolve(&schema), Some(1));
    }

    #[test]
    fn test_different_id_does_not_match_same_name() {
        let field = with_column_id(&Field::new("ts", DataType::Int64, false), ColumnId(1));
        assert!(!ColumnRef::with_id("ts", ColumnId(2)).matches(&field));
        assert!(ColumnRef::named("ts").matches(&field));
    }

    #[test]
    fn test_missing_column_leaves_schema_untouched() {
        let schema = Schema::new(vec![ts_field()]);
        let (tagged, index) = tag_event_time_column(&schema, &ColumnRef::named("nope"), 10);

        assert_eq!(index, None);
        assert_eq!(tagged.as_ref(), &schema);
    }

    #[test]
    fn test_typed_accessors_ignore_garbage() {
        let mut metadata = HashMap::new();
        metadata.insert(ALLOWED_LATENESS_KEY.to_string(), "ten".to_string());
        metadata.insert(COLUMN_ID_KEY.to_string(), "-3".to_string());
        let field = ts_field().with_metadata(metadata);

        assert_eq!(allowed_lateness_ms(&field), None);
        assert_eq!(column_id(&field), None);
    }

    #[test]
    fn test_column_ref_display() {
        assert_eq!(ColumnRef::named("ts").to_string(), "ts");
        assert_eq!(ColumnRef::with_id("ts", ColumnId(4)).to_string(), "ts#4");
    }
}
