//! Error handling for bidi resolution

/// Failures while building the rule trie
///
/// These signal a static misconfiguration of the rule set and can only occur
/// during construction, never after the trie is frozen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    #[error("Too many categories: {count} exceeds the limit of {max}")]
    TooManyCategories { count: usize, max: usize },

    #[error("Symbol {symbol} outside of category range 1..={max}")]
    InvalidSymbol { symbol: u8, max: usize },

    #[error("No free family base after {attempts} attempts at depth {depth}")]
    Exhausted { depth: usize, attempts: usize },

    #[error("Rule pattern conflict: {0}")]
    PatternConflict(String),
}

/// Errors surfaced to callers of the resolver
#[derive(Debug, thiserror::Error)]
pub enum BidiError {
    #[error("Rule trie construction failed: {0}")]
    RuleTrie(#[from] TrieError),

    #[error("Reading input failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid text direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid position: {position} in text of length {length}")]
    InvalidPosition { position: usize, length: usize },
}
