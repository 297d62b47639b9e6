//! Query input: types and CSV readers.

mod reader;
mod types;

pub use reader::{
    brand_name_queries, brand_queries, detail_queries, invalid_brand_queries, keyword_queries,
    read_column, read_map_rows, InputError, MapRow,
};
pub use types::*;
