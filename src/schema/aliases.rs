// src/schema/aliases.rs
//! The canonical trip schema and the alias priority table that feeds it.
//!
//! Each field lists the source column names it accepts, generic name first,
//! then the variant-specific spellings (`tpep_*` for yellow, `lpep_*` for
//! green, the mixed-case `*locationID` forms for fhv). The reconciler takes
//! the first alias a file actually carries, so order here is precedence.

use super::types::{CanonicalField, FieldSource, SemanticType};

pub const TAXI_TYPE: &str = "taxi_type";
pub const EXTRACTED_AT: &str = "extracted_at";

/// All canonical columns, in output order.
pub static CANONICAL_FIELDS: [CanonicalField; 16] = [
    CanonicalField {
        name: "pickup_datetime",
        ty: SemanticType::Timestamp,
        source: FieldSource::Aliases(&[
            "pickup_datetime",
            "tpep_pickup_datetime",
            "lpep_pickup_datetime",
        ]),
        description: "When the meter was engaged",
    },
    CanonicalField {
        name: "dropoff_datetime",
        ty: SemanticType::Timestamp,
        source: FieldSource::Aliases(&[
            "dropoff_datetime",
            "tpep_dropoff_datetime",
            "lpep_dropoff_datetime",
            "dropOff_datetime",
        ]),
        description: "When the meter was disengaged",
    },
    CanonicalField {
        name: TAXI_TYPE,
        ty: SemanticType::String,
        source: FieldSource::Variant,
        description: "Source variant the row was fetched from",
    },
    CanonicalField {
        name: "passenger_count",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["passenger_count"]),
        description: "Number of passengers",
    },
    CanonicalField {
        name: "trip_distance",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["trip_distance", "trip_miles"]),
        description: "Trip distance in miles",
    },
    CanonicalField {
        name: "payment_type",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["payment_type"]),
        description: "Payment type code",
    },
    CanonicalField {
        name: "fare_amount",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["fare_amount", "base_passenger_fare"]),
        description: "Meter fare amount",
    },
    CanonicalField {
        name: "tip_amount",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["tip_amount", "tips"]),
        description: "Tip amount",
    },
    CanonicalField {
        name: "tolls_amount",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["tolls_amount", "tolls"]),
        description: "Tolls amount",
    },
    CanonicalField {
        name: "total_amount",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["total_amount"]),
        description: "Total charged to passenger",
    },
    CanonicalField {
        name: "pu_location_id",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["pu_location_id", "PULocationID", "PUlocationID"]),
        description: "TLC pickup zone ID",
    },
    CanonicalField {
        name: "do_location_id",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["do_location_id", "DOLocationID", "DOlocationID"]),
        description: "TLC dropoff zone ID",
    },
    CanonicalField {
        name: "rate_code_id",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["rate_code_id", "RatecodeID"]),
        description: "Rate code (1=standard, 2=JFK, etc.)",
    },
    CanonicalField {
        name: "congestion_surcharge",
        ty: SemanticType::Float,
        source: FieldSource::Aliases(&["congestion_surcharge"]),
        description: "NYC congestion surcharge",
    },
    CanonicalField {
        name: "vendor_id",
        ty: SemanticType::Integer,
        source: FieldSource::Aliases(&["vendor_id", "VendorID"]),
        description: "TPEP provider code",
    },
    CanonicalField {
        name: EXTRACTED_AT,
        ty: SemanticType::Timestamp,
        source: FieldSource::ExtractedAt,
        description: "When this record was extracted",
    },
];

/// Look up a canonical field by its output name.
pub fn canonical_field(name: &str) -> Option<&'static CanonicalField> {
    CANONICAL_FIELDS.iter().find(|f| f.name == name)
}

/// Pick the first alias of `field` that `has_column` accepts.
pub fn resolve_alias(
    field: &CanonicalField,
    has_column: impl Fn(&str) -> bool,
) -> Option<&'static str> {
    field.aliases().iter().copied().find(|alias| has_column(alias))
}
