// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, SchemaRef, TimeUnit};
use std::collections::HashMap;
use std::sync::Arc;

use super::aliases::CANONICAL_FIELDS;
use super::types::SemanticType;

/// Timezone attached to every timestamp column we emit. Offset form, so it
/// resolves without a timezone database.
pub const OUTPUT_TZ: &str = "+00:00";

/// Field metadata key holding the column's documentation.
pub const DESCRIPTION_KEY: &str = "description";

/// Map a semantic type onto the Arrow type used in the output table.
///
/// Covers:
/// - timestamp → Timestamp(µs, +00:00)
/// - string    → Utf8
/// - integer   → Int64
/// - float     → Float64
pub fn map_to_arrow_type(ty: SemanticType) -> DataType {
    match ty {
        SemanticType::Timestamp => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from(OUTPUT_TZ)))
        }
        SemanticType::String => DataType::Utf8,
        SemanticType::Integer => DataType::Int64,
        SemanticType::Float => DataType::Float64,
    }
}

/// Build the canonical output schema. Every column is nullable and carries
/// its description under [`DESCRIPTION_KEY`].
pub fn canonical_schema() -> SchemaRef {
    let fields: Vec<ArrowField> = CANONICAL_FIELDS
        .iter()
        .map(|f| {
            ArrowField::new(f.name, map_to_arrow_type(f.ty), /* nullable = */ true).with_metadata(
                HashMap::from([(DESCRIPTION_KEY.to_string(), f.description.to_string())]),
            )
        })
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_matches_canonical_fields() {
        let schema = canonical_schema();
        assert_eq!(schema.fields().len(), 16);
        for (arrow_field, field) in schema.fields().iter().zip(CANONICAL_FIELDS.iter()) {
            assert_eq!(arrow_field.name(), field.name);
            assert_eq!(arrow_field.data_type(), &map_to_arrow_type(field.ty));
            assert!(arrow_field.is_nullable());
            assert_eq!(
                arrow_field.metadata().get(DESCRIPTION_KEY).map(String::as_str),
                Some(field.description)
            );
        }
        assert_eq!(
            schema.field_with_name("extracted_at").unwrap().data_type(),
            &DataType::Timestamp(TimeUnit::Microsecond, Some("+00:00".into()))
        );
    }
}
