//! Scraps: labelled text intervals the resolver works on

use std::fmt;

use crate::brackets::BracketPair;
use crate::types::{BidiClass, Direction};

/// Directional snapshot taken by the scanner when a scrap starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionalContext {
    /// Direction of the enclosing isolating run sequence, when known
    pub embedding_direction: Option<Direction>,
    /// Nearest preceding strong type in the same sequence (`None` is sos)
    pub most_recent_strong: Option<Direction>,
    /// First strong type of the sequence seen so far
    pub first_strong: Option<Direction>,
}

/// A half-open interval `[left, right)` of input sharing one bidi class
///
/// `children` holds the resolved sub-sequences of isolates this scrap
/// summarizes, in text order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scrap {
    pub class: BidiClass,
    pub left: usize,
    pub right: usize,
    pub context: DirectionalContext,
    pub children: Vec<Vec<Scrap>>,
    pub(crate) runes: usize,
    pub(crate) bracket: Option<BracketPair>,
    /// The scrap starts with an absorbed European terminator
    pub(crate) leading_terminator: bool,
    /// The scrap ends with an absorbed European terminator
    pub(crate) trailing_terminator: bool,
}

impl Scrap {
    pub fn new(class: BidiClass, left: usize, right: usize, context: DirectionalContext) -> Self {
        Self {
            class,
            left,
            right,
            context,
            children: Vec::new(),
            runes: 0,
            bracket: None,
            leading_terminator: false,
            trailing_terminator: false,
        }
    }

    /// Zero-length boundary marker
    pub fn marker(class: BidiClass, position: usize, context: DirectionalContext) -> Self {
        Self::new(class, position, position, context)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right == self.left
    }

    /// Synthetic scraps cover no input
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.is_empty()
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of code points covered
    #[inline]
    pub fn rune_count(&self) -> usize {
        self.runes
    }

    #[inline]
    pub(crate) fn starts_with_terminator(&self) -> bool {
        self.class == BidiClass::ET || self.leading_terminator
    }

    #[inline]
    pub(crate) fn ends_with_terminator(&self) -> bool {
        self.class == BidiClass::ET || self.trailing_terminator
    }

    /// Embedding direction of an isolate sub-sequence, read from its initiator
    pub(crate) fn sequence_direction(sequence: &[Scrap]) -> Option<Direction> {
        sequence.first().and_then(|first| first.context.embedding_direction)
    }

    /// Take over the interval and children of the scrap to the right
    pub(crate) fn absorb(&mut self, other: &mut Scrap) {
        debug_assert!(other.left >= self.left);
        self.right = other.right;
        self.runes += other.runes;
        self.children.append(&mut other.children);
    }
}

impl fmt::Display for Scrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.class, self.left, self.right)?;
        if self.has_children() {
            write!(f, "+{}", self.children.len())?;
        }
        Ok(())
    }
}

/// Collapse `len` scraps starting at `at` into one scrap of class `class`
///
/// Children of all merged scraps are re-parented to the survivor. The
/// survivor remembers whether its edges came from European terminators.
pub(crate) fn squash(stack: &mut Vec<Scrap>, at: usize, len: usize, class: BidiClass) {
    debug_assert!(len >= 1 && at + len <= stack.len());
    let (head, tail) = stack.split_at_mut(at + 1);
    let target = &mut head[at];
    let leading = target.starts_with_terminator();
    let mut trailing = target.ends_with_terminator();
    for absorbed in &mut tail[..len - 1] {
        trailing = absorbed.ends_with_terminator();
        target.absorb(absorbed);
    }
    target.class = class;
    target.leading_terminator = leading;
    target.trailing_terminator = trailing;
    stack.drain(at + 1..at + len);
}
