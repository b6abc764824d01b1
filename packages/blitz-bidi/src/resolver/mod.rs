//! Paragraph resolution
//!
//! - `parser`: the two-pass stack resolver driving the scanner
//! - `levels`: the resolved scrap tree handed back to callers

pub mod levels;
pub(crate) mod parser;

pub use levels::ResolvedLevels;
