use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

use crate::window::FetchUnit;

/// One decoded monthly file, column names as the file spells them.
#[derive(Debug)]
pub struct RawTable {
    /// The unit this file was fetched for.
    pub unit: FetchUnit,
    /// All rows of the file, in file order.
    pub batch: RecordBatch,
}

impl RawTable {
    pub fn new(unit: FetchUnit, batch: RecordBatch) -> Self {
        Self { unit, batch }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// First column called `name`, if any.
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }
}
