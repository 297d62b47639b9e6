//! Candidate matching against a target brand.

mod brand_matcher;
mod types;

pub use brand_matcher::{match_candidates, score_one};
pub use types::*;
