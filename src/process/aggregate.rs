// src/process/aggregate.rs

use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::reconcile::CanonicalTable;
use crate::schema::{canonical_schema, map_to_arrow_type, CANONICAL_FIELDS};

/// Lay a coerced table out on the full canonical schema. Fields the unit did
/// not provide become all-null columns of the declared type.
pub fn project(table: &CanonicalTable, schema: &SchemaRef) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = CANONICAL_FIELDS
        .iter()
        .map(|field| match table.array(field.name) {
            Some(array) => array.clone(),
            None => new_null_array(&map_to_arrow_type(field.ty), table.num_rows),
        })
        .collect();

    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows));
    RecordBatch::try_new_with_options(schema.clone(), columns, &options)
}

/// Concatenate coerced tables, in the order given, into one canonical table.
/// No tables yields an empty batch that still carries the canonical schema.
pub fn aggregate(tables: &[CanonicalTable]) -> Result<RecordBatch, ArrowError> {
    let schema = canonical_schema();
    if tables.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let batches = tables
        .iter()
        .map(|t| project(t, &schema))
        .collect::<Result<Vec<_>, _>>()?;
    concat_batches(&schema, &batches)
}
