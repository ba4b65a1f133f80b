//! Data structures for compositional tables.

mod composition_table;
pub mod formatting;

pub use composition_table::{delimiter_for_path, CompositionTable, DEFAULT_INDEX_LABEL};
pub use formatting::{tidy_columns, to_chem_case};
