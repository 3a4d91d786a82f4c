pub mod aliases;
pub mod arrow;
pub mod types;

pub use aliases::{canonical_field, resolve_alias, CANONICAL_FIELDS, EXTRACTED_AT, TAXI_TYPE};
pub use self::arrow::{canonical_schema, map_to_arrow_type, DESCRIPTION_KEY};
pub use types::{CanonicalField, FieldSource, SemanticType};
