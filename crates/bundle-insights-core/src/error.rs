//! Row- and column-level classification failures.
//!
//! These never abort a table: the classifier records them, logs them, and
//! moves on to the next unit.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// A data row ended before a required column.
    #[error("row {row}: missing value for column '{column}'")]
    ShortRow { row: usize, column: String },

    /// A column selected for frequency counting held no non-empty values.
    #[error("column '{column}' has no non-empty values")]
    EmptyColumn { column: String },
}
