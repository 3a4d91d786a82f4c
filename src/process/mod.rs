// src/process/mod.rs
//! Turning fetched files into the canonical table:
//! decode → reconcile → coerce → aggregate.

pub mod aggregate;
pub mod convert;
pub mod decode;
pub mod raw_table;
pub mod reconcile;
pub mod utils;

pub use aggregate::{aggregate, project};
pub use convert::{coerce, coerce_array};
pub use raw_table::RawTable;
pub use reconcile::{reconcile, CanonicalColumn, CanonicalTable};
