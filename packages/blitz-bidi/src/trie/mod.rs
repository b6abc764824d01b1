//! Rule dictionary trie
//!
//! Maps short sequences of bidi classes to positions usable as rule-table
//! indices. Built once, frozen, then walked with zero allocation:
//! - `core`: the packed hash trie and its construction
//! - `iterator`: one-symbol-at-a-time prefix walking

pub mod core;
pub mod iterator;

pub use self::core::{HashTrie, MAX_CATEGORIES};
pub use iterator::TrieIterator;
