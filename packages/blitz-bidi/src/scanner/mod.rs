//! Input scanning
//!
//! - `decoder`: forward-only UTF-8 decoding from any reader
//! - `classify`: Unicode bidi classes and the ASCII test alphabet
//! - `core`: the scrap-producing iterator

pub mod classify;
pub mod core;
pub mod decoder;

pub use self::core::{Scanner, MAX_ISOLATE_DEPTH};
pub use classify::unicode_class;
pub use decoder::{Decoded, Rune, RuneReader};
