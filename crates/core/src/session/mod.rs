//! Automation session abstraction.
//!
//! The pipeline never touches pages directly. It talks to an
//! `AutomationSession`, which searches the retail site and loads product
//! pages, and treats every call as a fallible remote operation.

mod http;
mod selectors;
mod types;

pub use http::{random_user_agent, HttpSession};
pub use selectors::{parse_product_detail, parse_search_results};
pub use types::*;
