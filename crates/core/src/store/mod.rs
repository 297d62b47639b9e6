//! Tabular output store.

mod records;
mod writer;

pub use records::*;
pub use writer::{append_rows, write_all, IncrementalWriter, WriteMode, WriterError};
