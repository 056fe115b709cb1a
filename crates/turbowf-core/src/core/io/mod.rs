//! Line tokenizing and keyword-based section location.

pub mod locator;
pub mod tokens;
