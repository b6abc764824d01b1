//! Resolver configuration

use crate::types::Direction;

/// Options for resolving a paragraph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ResolverOptions {
    /// Paragraph direction used when no strong type precedes the first break
    pub default_direction: Direction,
    /// Treat ASCII uppercase as strong RTL and `>`, `<`, `=` as LRI, RLI, PDI
    pub test_mode: bool,
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback paragraph direction
    #[inline]
    pub fn with_default_direction(mut self, direction: Direction) -> Self {
        self.default_direction = direction;
        self
    }

    /// Enable or disable the ASCII test alphabet
    #[inline]
    pub fn with_test_mode(mut self, enable: bool) -> Self {
        self.test_mode = enable;
        self
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            default_direction: Direction::LeftToRight,
            test_mode: false,
        }
    }
}
