//! Paired bracket support
//!
//! This module provides the data and bookkeeping behind rule N0:
//! - `pairs`: the static BidiBrackets table with canonical equivalents
//! - `handler`: per-sequence bracket stack and pairing list

pub mod handler;
pub mod pairs;

pub use handler::{BracketPairHandler, BracketStackEntry, Pairing, MAX_BRACKET_DEPTH};
pub use pairs::{canonical_bracket, BracketKind, BracketPair};
