//! Streaming Unicode bidirectional resolution for Blitz
//!
//! Resolves the display order of a paragraph of mixed-direction text per
//! UAX#9, reading the input exactly once:
//! - `scanner`: decodes and classifies input into scraps (W1-W3 inline)
//! - `rules` and `trie`: the weak and neutral rewrite rules and their index
//! - `brackets`: paired bracket tracking for N0
//! - `resolver`: the two-pass resolver over isolating run sequences
//! - `reorder`: visual runs from resolved levels (L2)
//!
//! Only isolate controls (LRI, RLI, FSI, PDI) are supported; the legacy
//! embedding and override controls are ignored.

use std::io::Read;

pub mod brackets;
pub mod error;
pub mod markup;
pub mod options;
pub mod reorder;
pub mod resolver;
pub mod rules;
pub mod scanner;
pub mod scrap;
pub mod trie;
pub mod types;

pub use error::{BidiError, TrieError};
pub use markup::{IsolateControl, MarkupMap, OutOfLineMarkup};
pub use options::ResolverOptions;
pub use reorder::{Ordering, Run};
pub use resolver::ResolvedLevels;
pub use scrap::{DirectionalContext, Scrap};
pub use types::{BidiClass, Direction};

use resolver::parser::Parser;
use scanner::Scanner;

/// Resolve one paragraph read from `input`
///
/// `markup` injects isolates that are not spelled out in the text.
pub fn resolve_paragraph(
    input: impl Read,
    markup: Option<&dyn OutOfLineMarkup>,
    options: &ResolverOptions,
) -> Result<ResolvedLevels, BidiError> {
    let rules = rules::rules()?;
    let scanner = Scanner::new(input, markup, options.test_mode);
    Parser::new(scanner, rules, *options).parse()
}

/// Resolve a paragraph held in memory
pub fn resolve_str(text: &str, options: &ResolverOptions) -> Result<ResolvedLevels, BidiError> {
    resolve_paragraph(text.as_bytes(), None, options)
}

/// Display string of a paragraph held in memory
pub fn reorder_str(text: &str, options: &ResolverOptions) -> Result<String, BidiError> {
    Ok(resolve_str(text, options)?.reorder().apply(text))
}
