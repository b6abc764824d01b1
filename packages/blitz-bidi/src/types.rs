//! Directions and the bidi class alphabet used by the resolver
//!
//! The scanner folds the full set of Unicode bidi classes into the small
//! alphabet below. Its discriminants double as trie symbols, so they start
//! at 1 and stay dense.

use std::fmt;
use std::str::FromStr;

use crate::error::BidiError;

/// Text direction of an embedding, a run or a paragraph
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    Default,
)]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl Direction {
    /// Check for right-to-left
    #[inline]
    pub const fn is_rtl(self) -> bool {
        matches!(self, Direction::RightToLeft)
    }

    /// The other direction
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::LeftToRight => Direction::RightToLeft,
            Direction::RightToLeft => Direction::LeftToRight,
        }
    }

    /// Strong class carrying this direction
    #[inline]
    pub const fn strong_class(self) -> BidiClass {
        match self {
            Direction::LeftToRight => BidiClass::L,
            Direction::RightToLeft => BidiClass::R,
        }
    }

    /// Direction of an embedding level (odd levels are RTL)
    #[inline]
    pub const fn from_level(level: u8) -> Self {
        if level % 2 == 1 {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::LeftToRight => f.write_str("ltr"),
            Direction::RightToLeft => f.write_str("rtl"),
        }
    }
}

impl FromStr for Direction {
    type Err = BidiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltr" | "left-to-right" | "lefttoright" => Ok(Direction::LeftToRight),
            "rtl" | "right-to-left" | "righttoleft" => Ok(Direction::RightToLeft),
            _ => Err(BidiError::InvalidDirection(s.to_string())),
        }
    }
}

/// Bidi classes as seen by the rule engine
///
/// `NI` collects every neutral and isolate-neutral (B, S, WS, ON and
/// collapsed isolates). `BRO`/`BRC` are pseudo-classes for opening and
/// closing paired brackets found by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BidiClass {
    L = 1,    // Left-to-right
    R = 2,    // Right-to-left (including Arabic letters after W3)
    EN = 3,   // European number
    AN = 4,   // Arabic number
    ES = 5,   // European separator
    ET = 6,   // European terminator
    CS = 7,   // Common separator
    NI = 8,   // Neutral or isolate
    LRI = 9,  // Left-to-right isolate
    RLI = 10, // Right-to-left isolate
    FSI = 11, // First strong isolate
    PDI = 12, // Pop directional isolate
    BRO = 13, // Opening paired bracket
    BRC = 14, // Closing paired bracket
}

impl BidiClass {
    /// Number of symbols in the alphabet
    pub const COUNT: usize = 14;

    /// Trie symbol for this class
    #[inline]
    pub const fn symbol(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_isolate_initiator(self) -> bool {
        matches!(self, BidiClass::LRI | BidiClass::RLI | BidiClass::FSI)
    }

    /// Isolate initiators and PDI delimit isolating run sequences
    #[inline]
    pub const fn is_sequence_boundary(self) -> bool {
        matches!(
            self,
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI | BidiClass::PDI
        )
    }

    #[inline]
    pub const fn is_bracket(self) -> bool {
        matches!(self, BidiClass::BRO | BidiClass::BRC)
    }

    /// Direction a class exerts on neighbouring neutrals (N0/N1)
    ///
    /// European and Arabic numbers count as R here.
    #[inline]
    pub const fn neutral_influence(self) -> Option<Direction> {
        match self {
            BidiClass::L => Some(Direction::LeftToRight),
            BidiClass::R | BidiClass::EN | BidiClass::AN => Some(Direction::RightToLeft),
            _ => None,
        }
    }

    /// Embedding direction fixed by an isolate initiator, if any
    #[inline]
    pub const fn isolate_direction(self) -> Option<Direction> {
        match self {
            BidiClass::LRI => Some(Direction::LeftToRight),
            BidiClass::RLI => Some(Direction::RightToLeft),
            _ => None,
        }
    }
}

impl fmt::Display for BidiClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
