//! Character classification into scanner categories

use unicode_bidi::BidiClass as UnicodeClass;

use crate::brackets::{BracketKind, BracketPair};
use crate::types::BidiClass;

/// Strong types before W3 folds AL into R
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StrongType {
    L,
    R,
    AL,
}

/// What the scanner does with a code point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    Strong(StrongType),
    /// EN, AN, ES, ET, CS or NI, taken as is
    Plain(BidiClass),
    /// NSM, BN and the unsupported embedding controls
    Inherit,
    Bracket(BracketPair, BracketKind),
    Initiator(BidiClass),
    Pop,
}

/// Unicode bidi class of `ch`, honouring the ASCII test alphabet
pub fn unicode_class(ch: char, test_mode: bool) -> UnicodeClass {
    if test_mode {
        match ch {
            'A'..='Z' => return UnicodeClass::R,
            '>' => return UnicodeClass::LRI,
            '<' => return UnicodeClass::RLI,
            '=' => return UnicodeClass::PDI,
            _ => {}
        }
    }
    unicode_bidi::bidi_class(ch)
}

pub(crate) fn categorize(ch: char, test_mode: bool) -> Category {
    match unicode_class(ch, test_mode) {
        UnicodeClass::L => Category::Strong(StrongType::L),
        UnicodeClass::R => Category::Strong(StrongType::R),
        UnicodeClass::AL => Category::Strong(StrongType::AL),
        UnicodeClass::EN => Category::Plain(BidiClass::EN),
        UnicodeClass::AN => Category::Plain(BidiClass::AN),
        UnicodeClass::ES => Category::Plain(BidiClass::ES),
        UnicodeClass::ET => Category::Plain(BidiClass::ET),
        UnicodeClass::CS => Category::Plain(BidiClass::CS),
        UnicodeClass::ON => match BracketPair::lookup(ch) {
            Some((pair, kind)) => Category::Bracket(pair, kind),
            None => Category::Plain(BidiClass::NI),
        },
        UnicodeClass::B | UnicodeClass::S | UnicodeClass::WS => Category::Plain(BidiClass::NI),
        UnicodeClass::LRI => Category::Initiator(BidiClass::LRI),
        UnicodeClass::RLI => Category::Initiator(BidiClass::RLI),
        UnicodeClass::FSI => Category::Initiator(BidiClass::FSI),
        UnicodeClass::PDI => Category::Pop,
        UnicodeClass::NSM
        | UnicodeClass::BN
        | UnicodeClass::LRE
        | UnicodeClass::LRO
        | UnicodeClass::RLE
        | UnicodeClass::RLO
        | UnicodeClass::PDF => Category::Inherit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_alphabet() {
        assert_eq!(categorize('Q', true), Category::Strong(StrongType::R));
        assert_eq!(categorize('Q', false), Category::Strong(StrongType::L));
        assert_eq!(categorize('<', true), Category::Initiator(BidiClass::RLI));
        assert_eq!(categorize('>', true), Category::Initiator(BidiClass::LRI));
        assert_eq!(categorize('=', true), Category::Pop);
        assert_eq!(categorize('=', false), Category::Plain(BidiClass::NI));
    }

    #[test]
    fn test_unicode_classes() {
        assert_eq!(categorize('\u{0627}', false), Category::Strong(StrongType::AL));
        assert_eq!(categorize('\u{0661}', false), Category::Plain(BidiClass::AN));
        assert_eq!(categorize('7', false), Category::Plain(BidiClass::EN));
        assert_eq!(categorize('\u{0301}', false), Category::Inherit);
        assert_eq!(categorize('\u{202B}', false), Category::Inherit);
        assert_eq!(categorize('\u{2067}', false), Category::Initiator(BidiClass::RLI));
        assert!(matches!(
            categorize('(', false),
            Category::Bracket(_, BracketKind::Open)
        ));
        assert_eq!(categorize('“', false), Category::Plain(BidiClass::NI));
    }
}
