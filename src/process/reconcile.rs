// src/process/reconcile.rs

use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::raw_table::RawTable;
use crate::schema::arrow::OUTPUT_TZ;
use crate::schema::{resolve_alias, CanonicalField, FieldSource, CANONICAL_FIELDS};
use crate::window::FetchUnit;

/// A canonical column and the source column it was taken from.
#[derive(Debug, Clone)]
pub struct CanonicalColumn {
    pub field: &'static CanonicalField,
    /// Source column name, or `None` for stamped fields.
    pub source: Option<&'static str>,
    pub array: ArrayRef,
}

/// A unit's table under canonical names only. Fields the source file does not
/// carry are simply missing here; projection fills them with nulls.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    pub unit: FetchUnit,
    pub num_rows: usize,
    /// In canonical order.
    pub columns: Vec<CanonicalColumn>,
}

impl CanonicalTable {
    pub fn column(&self, name: &str) -> Option<&CanonicalColumn> {
        self.columns.iter().find(|c| c.field.name == name)
    }

    pub fn array(&self, name: &str) -> Option<&ArrayRef> {
        self.column(name).map(|c| &c.array)
    }
}

/// Rename a raw table onto canonical fields via the alias table, and stamp
/// the variant plus the run's extraction instant onto every row.
pub fn reconcile(raw: &RawTable, extracted_at: DateTime<Utc>) -> CanonicalTable {
    let num_rows = raw.num_rows();
    let mut columns = Vec::with_capacity(CANONICAL_FIELDS.len());
    let mut missing = Vec::new();

    for field in CANONICAL_FIELDS.iter() {
        let column = match field.source {
            FieldSource::Aliases(_) => resolve_alias(field, |name| raw.has_column(name))
                .and_then(|alias| {
                    raw.column(alias).map(|array| CanonicalColumn {
                        field,
                        source: Some(alias),
                        array: array.clone(),
                    })
                }),
            FieldSource::Variant => Some(CanonicalColumn {
                field,
                source: None,
                array: variant_column(&raw.unit.variant, num_rows),
            }),
            FieldSource::ExtractedAt => Some(CanonicalColumn {
                field,
                source: None,
                array: instant_column(extracted_at, num_rows),
            }),
        };

        match column {
            Some(c) => columns.push(c),
            None => missing.push(field.name),
        }
    }

    debug!(
        unit = %raw.unit,
        rows = num_rows,
        mapped = columns.len(),
        missing = ?missing,
        "reconciled columns"
    );

    CanonicalTable {
        unit: raw.unit.clone(),
        num_rows,
        columns,
    }
}

fn variant_column(variant: &str, len: usize) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(std::iter::repeat(variant).take(len)))
}

fn instant_column(at: DateTime<Utc>, len: usize) -> ArrayRef {
    Arc::new(TimestampMicrosecondArray::from_value(at.timestamp_micros(), len).with_timezone(OUTPUT_TZ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::raw_table;
    use arrow::array::{Array, Float64Array, Int64Array};
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn picks_variant_specific_alias() {
        let raw = raw_table(
            "green",
            vec![
                ("lpep_pickup_datetime", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
                ("PULocationID", Arc::new(Int64Array::from(vec![7, 8])) as ArrayRef),
            ],
        );
        let table = reconcile(&raw, instant());

        assert_eq!(
            table.column("pickup_datetime").unwrap().source,
            Some("lpep_pickup_datetime")
        );
        assert_eq!(table.column("pu_location_id").unwrap().source, Some("PULocationID"));
        assert!(table.column("dropoff_datetime").is_none());
        assert!(table.column("fare_amount").is_none());
    }

    #[test]
    fn earlier_alias_wins_when_both_present() {
        let raw = raw_table(
            "yellow",
            vec![
                ("tpep_pickup_datetime", Arc::new(Int64Array::from(vec![2])) as ArrayRef),
                ("pickup_datetime", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
            ],
        );
        for _ in 0..3 {
            let table = reconcile(&raw, instant());
            let col = table.column("pickup_datetime").unwrap();
            assert_eq!(col.source, Some("pickup_datetime"));
            let values = col.array.as_any().downcast_ref::<Int64Array>().unwrap();
            assert_eq!(values.value(0), 1);
        }
    }

    #[test]
    fn stamps_variant_and_instant_on_every_row() {
        let raw = raw_table(
            "fhv",
            vec![
                ("fare_amount", Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])) as ArrayRef),
                // a source column named like a stamped field is ignored
                ("taxi_type", Arc::new(StringArray::from(vec!["x", "y", "z"])) as ArrayRef),
            ],
        );
        let table = reconcile(&raw, instant());
        assert_eq!(table.num_rows, 3);

        let types = table.array("taxi_type").unwrap();
        let types = types.as_any().downcast_ref::<StringArray>().unwrap();
        assert!(types.iter().all(|v| v == Some("fhv")));

        let at = table.array("extracted_at").unwrap();
        let at = at.as_any().downcast_ref::<TimestampMicrosecondArray>().unwrap();
        assert_eq!(at.len(), 3);
        assert!(at.iter().all(|v| v == Some(instant().timestamp_micros())));
    }

    #[test]
    fn columns_follow_canonical_order() {
        let raw = raw_table(
            "yellow",
            vec![
                ("VendorID", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
                ("fare_amount", Arc::new(Float64Array::from(vec![1.0])) as ArrayRef),
                ("something_else", Arc::new(Int64Array::from(vec![9])) as ArrayRef),
            ],
        );
        let names: Vec<&str> = reconcile(&raw, instant())
            .columns
            .iter()
            .map(|c| c.field.name)
            .collect();
        assert_eq!(names, vec!["taxi_type", "fare_amount", "vendor_id", "extracted_at"]);
    }
}
