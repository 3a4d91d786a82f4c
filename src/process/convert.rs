// src/process/convert.rs

use arrow::array::{new_null_array, Array, ArrayRef, StringArray};
use arrow::compute::kernels::cast::{cast_with_options, CastOptions};
use arrow::compute::kernels::zip::zip;
use arrow::compute::is_not_null;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use std::sync::Arc;
use tracing::warn;

use super::reconcile::{CanonicalColumn, CanonicalTable};
use super::utils::{clean_str, is_string_type};
use crate::schema::{map_to_arrow_type, SemanticType};

/// Cast every column of a canonical table to its declared type.
///
/// Values that do not parse become null; a column whose source type cannot
/// be cast at all becomes all-null. Rows are never dropped.
pub fn coerce(table: CanonicalTable) -> CanonicalTable {
    let CanonicalTable {
        unit,
        num_rows,
        columns,
    } = table;

    let columns = columns
        .into_iter()
        .map(|col| {
            let array = match coerce_array(&col.array, col.field.ty) {
                Ok(array) => array,
                Err(e) => {
                    warn!(
                        unit = %unit,
                        column = col.field.name,
                        source = ?col.source,
                        from = %col.array.data_type(),
                        error = %e,
                        "cannot cast column; nulling it"
                    );
                    new_null_array(&map_to_arrow_type(col.field.ty), col.array.len())
                }
            };
            CanonicalColumn { array, ..col }
        })
        .collect();

    CanonicalTable {
        unit,
        num_rows,
        columns,
    }
}

/// Cast one array to the Arrow type of `ty` with null-on-failure semantics.
pub fn coerce_array(array: &ArrayRef, ty: SemanticType) -> Result<ArrayRef, ArrowError> {
    let target = map_to_arrow_type(ty);
    if array.data_type() == &target {
        return Ok(array.clone());
    }

    let opts = CastOptions {
        safe: true,
        ..Default::default()
    };

    if ty == SemanticType::String {
        return cast_with_options(array, &target, &opts);
    }

    if !is_string_type(array.data_type()) {
        return cast_with_options(array, &target, &opts);
    }

    let cleaned = clean_strings(array)?;
    match ty {
        SemanticType::Integer => {
            let direct = cast_with_options(&cleaned, &target, &opts)?;
            if direct.null_count() == cleaned.null_count() {
                return Ok(direct);
            }
            // "2.0" must land as 2, which the direct cast rejects; only the
            // values it rejected go through Float64
            let floats = cast_with_options(&cleaned, &DataType::Float64, &opts)?;
            let truncated = cast_with_options(&floats, &target, &opts)?;
            zip(&is_not_null(&direct)?, &direct, &truncated)
        }
        _ => cast_with_options(&cleaned, &target, &opts),
    }
}

/// Any string encoding → Utf8 with values trimmed/unquoted; blanks become null.
fn clean_strings(array: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    let utf8 = cast_with_options(array, &DataType::Utf8, &CastOptions::default())?;
    let strings = utf8
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ArrowError::CastError("expected Utf8 after cast".into()))?;

    let cleaned: StringArray = strings
        .iter()
        .map(|opt| opt.map(clean_str).filter(|s| !s.is_empty()))
        .collect();
    Ok(Arc::new(cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::reconcile::reconcile;
    use crate::test_util::raw_table;
    use arrow::array::{
        BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
        StructArray, TimestampMicrosecondArray, TimestampNanosecondArray,
    };
    use arrow::datatypes::Field;
    use chrono::{TimeZone, Utc};

    fn strings(values: Vec<Option<&str>>) -> ArrayRef {
        Arc::new(StringArray::from(values))
    }

    #[test]
    fn float_from_strings_nulls_garbage() {
        let out = coerce_array(
            &strings(vec![Some("12.5"), Some("abc"), Some(" 7 "), None, Some("")]),
            SemanticType::Float,
        )
        .unwrap();
        let out = out.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out.value(0), 12.5);
        assert!(out.is_null(1));
        assert_eq!(out.value(2), 7.0);
        assert!(out.is_null(3));
        assert!(out.is_null(4));
    }

    #[test]
    fn integer_from_strings_and_floats_truncates() {
        let out = coerce_array(
            &strings(vec![Some("2"), Some("2.0"), Some("3.9"), Some("x")]),
            SemanticType::Integer,
        )
        .unwrap();
        let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(out.value(0), 2);
        assert_eq!(out.value(1), 2);
        assert_eq!(out.value(2), 3);
        assert!(out.is_null(3));

        let floats: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None, Some(f64::NAN)]));
        let out = coerce_array(&floats, SemanticType::Integer).unwrap();
        let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(out.value(0), 1);
        assert!(out.is_null(1));
        assert!(out.is_null(2));
    }

    #[test]
    fn large_integers_keep_full_precision() {
        let out = coerce_array(
            &strings(vec![Some("9007199254740993"), Some("4.0"), Some("-9007199254740993")]),
            SemanticType::Integer,
        )
        .unwrap();
        let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(out.value(0), 9_007_199_254_740_993);
        assert_eq!(out.value(1), 4);
        assert_eq!(out.value(2), -9_007_199_254_740_993);
    }

    #[test]
    fn integer_widening_and_float_widening() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(5), None]));
        let out = coerce_array(&ints, SemanticType::Integer).unwrap();
        assert_eq!(out.data_type(), &DataType::Int64);
        assert_eq!(out.null_count(), 1);

        let f32s: ArrayRef = Arc::new(Float32Array::from(vec![1.5]));
        let out = coerce_array(&f32s, SemanticType::Float).unwrap();
        let out = out.as_any().downcast_ref::<Float64Array>().unwrap();
        assert_eq!(out.value(0), 1.5);

        let bools: ArrayRef = Arc::new(BooleanArray::from(vec![true, false]));
        let out = coerce_array(&bools, SemanticType::Integer).unwrap();
        let out = out.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(out.values().to_vec(), vec![1, 0]);
    }

    #[test]
    fn timestamps_from_naive_and_strings() {
        let want = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap()
            .timestamp_micros();

        let nanos: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![Some(want * 1000), None]));
        let out = coerce_array(&nanos, SemanticType::Timestamp).unwrap();
        assert_eq!(out.data_type(), &map_to_arrow_type(SemanticType::Timestamp));
        let out = out.as_any().downcast_ref::<TimestampMicrosecondArray>().unwrap();
        assert_eq!(out.value(0), want);
        assert!(out.is_null(1));

        let text = strings(vec![
            Some("2024-01-02 03:04:05"),
            Some("\"2024-01-02T03:04:05Z\""),
            Some("yesterday"),
        ]);
        let out = coerce_array(&text, SemanticType::Timestamp).unwrap();
        let out = out.as_any().downcast_ref::<TimestampMicrosecondArray>().unwrap();
        assert_eq!(out.value(0), want);
        assert_eq!(out.value(1), want);
        assert!(out.is_null(2));
    }

    #[test]
    fn strings_pass_through() {
        let large: ArrayRef = Arc::new(LargeStringArray::from(vec![" keep me "]));
        let out = coerce_array(&large, SemanticType::String).unwrap();
        let out = out.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(out.value(0), " keep me ");
    }

    #[test]
    fn uncastable_column_becomes_null_without_dropping_rows() {
        let inner: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
        let nested: ArrayRef = Arc::new(StructArray::from(vec![(
            Arc::new(Field::new("a", DataType::Int64, false)),
            inner,
        )]));
        let raw = raw_table(
            "yellow",
            vec![
                ("fare_amount", nested),
                ("tip_amount", Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef),
            ],
        );
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = coerce(reconcile(&raw, at));

        assert_eq!(table.num_rows, 2);
        let fare = table.array("fare_amount").unwrap();
        assert_eq!(fare.data_type(), &DataType::Float64);
        assert_eq!(fare.null_count(), 2);
        assert_eq!(table.array("tip_amount").unwrap().null_count(), 0);
        assert_eq!(
            table.array("extracted_at").unwrap().data_type(),
            &map_to_arrow_type(SemanticType::Timestamp)
        );
    }
}
