// src/process/decode.rs

use anyhow::{Context, Result};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use crate::config::SourceFormat;

const BATCH_SIZE: usize = 64 * 1024;

/// Decode a whole monthly file into a single batch with trimmed column names.
pub fn decode_table(bytes: Bytes, format: SourceFormat) -> Result<RecordBatch> {
    let batch = match format {
        SourceFormat::Parquet => decode_parquet(bytes)?,
        SourceFormat::Csv => decode_csv(bytes)?,
    };
    trim_column_names(batch)
}

pub fn decode_parquet(bytes: Bytes) -> Result<RecordBatch> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(bytes).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder
        .with_batch_size(BATCH_SIZE)
        .build()
        .context("creating parquet reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("decoding parquet row groups")?;
    debug!(batches = batches.len(), "parquet decoded");

    concat_batches(&schema, &batches).context("concatenating parquet batches")
}

/// Every CSV column is read as Utf8; typing happens later in coercion.
pub fn decode_csv(bytes: Bytes) -> Result<RecordBatch> {
    let format = Format::default().with_header(true);
    let (inferred, _) = format
        .infer_schema(Cursor::new(&bytes[..]), Some(1))
        .context("reading CSV header")?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(Cursor::new(bytes))
        .context("creating CSV reader")?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("parsing CSV records")?;

    concat_batches(&schema, &batches).context("concatenating CSV batches")
}

/// Strip surrounding whitespace from column names.
fn trim_column_names(batch: RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    if schema.fields().iter().all(|f| f.name().trim() == f.name()) {
        return Ok(batch);
    }

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(f.name().trim()))
        .collect();
    let renamed = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));

    RecordBatch::try_new(renamed, batch.columns().to_vec()).context("renaming trimmed columns")
}
