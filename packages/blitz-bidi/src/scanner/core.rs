//! Streaming scanner producing scraps
//!
//! Reads the input once, classifies each code point, applies the rules that
//! only need left context (W1, W2, W3) and groups consecutive tokens of the
//! same class. Isolate controls, whether in the text or injected through
//! out-of-line markup, open and close per-sequence contexts so every scrap
//! carries the directional state of the isolating run sequence it belongs to.

use std::collections::VecDeque;
use std::io::{self, Read};

use super::classify::{categorize, Category, StrongType};
use super::decoder::{Decoded, Rune, RuneReader};
use crate::brackets::BracketKind;
use crate::markup::OutOfLineMarkup;
use crate::scrap::{DirectionalContext, Scrap};
use crate::types::{BidiClass, Direction};

/// Deepest isolate nesting honoured; deeper initiators become neutrals
pub const MAX_ISOLATE_DEPTH: usize = 125;

/// Directional state of one open isolating run sequence
#[derive(Debug, Clone, Copy, Default)]
struct SequenceState {
    embedding: Option<Direction>,
    last_strong: Option<StrongType>,
    first_strong: Option<Direction>,
}

impl SequenceState {
    fn snapshot(&self) -> DirectionalContext {
        DirectionalContext {
            embedding_direction: self.embedding,
            most_recent_strong: self.last_strong.map(strong_direction),
            first_strong: self.first_strong,
        }
    }
}

#[inline]
fn strong_direction(strong: StrongType) -> Direction {
    match strong {
        StrongType::L => Direction::LeftToRight,
        StrongType::R | StrongType::AL => Direction::RightToLeft,
    }
}

/// A classified code point or injected control
#[derive(Debug)]
struct Token {
    scrap: Scrap,
    /// W1: continues whatever scrap precedes it
    inherited: bool,
}

/// Pull iterator of scraps over a UTF-8 byte stream
///
/// The last scrap is always a zero-length PDI at the end of input, closing
/// the paragraph's implicit isolate.
pub struct Scanner<'m, R: Read> {
    reader: RuneReader<R>,
    markup: Option<&'m dyn OutOfLineMarkup>,
    test_mode: bool,
    /// Open sequences, the paragraph first
    sequences: Vec<SequenceState>,
    overflow_isolates: usize,
    /// Class given to the previous token, for W1
    previous: Option<BidiClass>,
    injected: VecDeque<Token>,
    markup_checked: Option<usize>,
    pending: Option<Scrap>,
    end_of_input: bool,
    terminated: bool,
    error: Option<io::Error>,
}

impl<'m, R: Read> Scanner<'m, R> {
    pub fn new(input: R, markup: Option<&'m dyn OutOfLineMarkup>, test_mode: bool) -> Self {
        Self {
            reader: RuneReader::new(input),
            markup,
            test_mode,
            sequences: vec![SequenceState::default()],
            overflow_isolates: 0,
            previous: None,
            injected: VecDeque::new(),
            markup_checked: None,
            pending: None,
            end_of_input: false,
            terminated: false,
            error: None,
        }
    }

    /// Whether the terminal PDI has been handed out
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.terminated
    }

    /// Bytes consumed so far
    #[inline]
    pub fn offset(&self) -> usize {
        self.reader.offset()
    }

    /// The I/O error that cut the stream short, if any
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn current(&self) -> &SequenceState {
        // The paragraph sequence is never popped.
        &self.sequences[self.sequences.len() - 1]
    }

    fn current_mut(&mut self) -> &mut SequenceState {
        let last = self.sequences.len() - 1;
        &mut self.sequences[last]
    }

    fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.injected.pop_front() {
            return Some(token);
        }
        if self.end_of_input {
            return None;
        }

        let position = self.reader.offset();
        if self.markup_checked != Some(position) {
            self.markup_checked = Some(position);
            if let Some(markup) = self.markup {
                for control in markup.controls_at(position) {
                    let token = self.control_token(control.class(), position, position, 0);
                    self.injected.push_back(token);
                }
                if let Some(token) = self.injected.pop_front() {
                    return Some(token);
                }
            }
        }

        match self.reader.next_rune() {
            Ok(Some(decoded)) => Some(self.rune_token(decoded)),
            Ok(None) => {
                self.end_of_input = true;
                None
            }
            Err(e) => {
                log::debug!("input ended by I/O error at byte {}: {}", position, e);
                self.error = Some(e);
                self.end_of_input = true;
                None
            }
        }
    }

    fn rune_token(&mut self, decoded: Decoded) -> Token {
        let Decoded { rune, left, right } = decoded;
        let ch = match rune {
            Rune::Char(ch) => ch,
            Rune::Invalid => return self.inherit(left, right, 0),
        };

        match categorize(ch, self.test_mode) {
            Category::Initiator(class) => self.control_token(class, left, right, 1),
            Category::Pop => self.control_token(BidiClass::PDI, left, right, 1),
            Category::Inherit => self.inherit(left, right, 1),
            Category::Strong(strong) => {
                let context = self.current().snapshot();
                let state = self.current_mut();
                state.first_strong.get_or_insert(strong_direction(strong));
                state.last_strong = Some(strong);
                // W3
                let class = strong_direction(strong).strong_class();
                self.plain(class, left, right, context)
            }
            Category::Plain(class) => {
                let context = self.current().snapshot();
                // W2
                let class = if class == BidiClass::EN
                    && self.current().last_strong == Some(StrongType::AL)
                {
                    BidiClass::AN
                } else {
                    class
                };
                self.plain(class, left, right, context)
            }
            Category::Bracket(pair, kind) => {
                let context = self.current().snapshot();
                let class = match kind {
                    BracketKind::Open => BidiClass::BRO,
                    BracketKind::Close => BidiClass::BRC,
                };
                let mut token = self.plain(class, left, right, context);
                token.scrap.bracket = Some(pair);
                token
            }
        }
    }

    fn plain(
        &mut self,
        class: BidiClass,
        left: usize,
        right: usize,
        context: DirectionalContext,
    ) -> Token {
        self.previous = Some(class);
        let mut scrap = Scrap::new(class, left, right, context);
        scrap.runes = 1;
        Token {
            scrap,
            inherited: false,
        }
    }

    /// W1 for NSM-like input
    fn inherit(&mut self, left: usize, right: usize, runes: usize) -> Token {
        let context = self.current().snapshot();
        let (class, inherited) = match self.previous {
            Some(class) if !class.is_sequence_boundary() => (class, true),
            _ => (BidiClass::NI, false),
        };
        if !inherited {
            self.previous = Some(BidiClass::NI);
        }
        let mut scrap = Scrap::new(class, left, right, context);
        scrap.runes = runes;
        Token { scrap, inherited }
    }

    /// Isolate initiators and PDIs, from text or markup
    fn control_token(&mut self, class: BidiClass, left: usize, right: usize, runes: usize) -> Token {
        let effective = if class == BidiClass::PDI {
            self.close_isolate(left)
        } else {
            self.open_isolate(class, left)
        };

        let (class, context) = match effective {
            Some(context) => (class, context),
            None => (BidiClass::NI, self.current().snapshot()),
        };
        self.previous = Some(class);
        let mut scrap = Scrap::new(class, left, right, context);
        scrap.runes = runes;
        Token {
            scrap,
            inherited: false,
        }
    }

    /// Push a sequence; returns the context the initiator carries
    fn open_isolate(&mut self, class: BidiClass, position: usize) -> Option<DirectionalContext> {
        if self.overflow_isolates > 0 || self.sequences.len() > MAX_ISOLATE_DEPTH {
            self.overflow_isolates += 1;
            log::debug!(
                "isolate at {} exceeds depth {}, treated as neutral",
                position,
                MAX_ISOLATE_DEPTH
            );
            return None;
        }
        let state = SequenceState {
            embedding: class.isolate_direction(),
            ..SequenceState::default()
        };
        self.sequences.push(state);
        Some(state.snapshot())
    }

    /// Pop a sequence; returns the closed sequence's context
    fn close_isolate(&mut self, position: usize) -> Option<DirectionalContext> {
        if self.overflow_isolates > 0 {
            self.overflow_isolates -= 1;
            return None;
        }
        if self.sequences.len() > 1 {
            return self.sequences.pop().map(|state| state.snapshot());
        }
        log::trace!("PDI at {} has no open isolate", position);
        None
    }

    /// Group `token` into the pending scrap, or emit the pending scrap
    fn push_token(&mut self, token: Token) -> Option<Scrap> {
        if let Some(pending) = self.pending.as_mut() {
            let joins = !pending.class.is_sequence_boundary()
                && (token.inherited
                    || (token.scrap.class == pending.class && !pending.class.is_bracket()));
            if joins {
                pending.right = token.scrap.right;
                pending.runes += token.scrap.runes;
                return None;
            }
        }
        self.pending.replace(token.scrap)
    }

    fn terminal_pdi(&self) -> Scrap {
        let end = self.reader.offset();
        if self.sequences.len() > 1 {
            log::debug!(
                "{} isolate(s) still open at end of input",
                self.sequences.len() - 1
            );
        }
        Scrap::marker(BidiClass::PDI, end, self.sequences[0].snapshot())
    }
}

impl<R: Read> Iterator for Scanner<'_, R> {
    type Item = Scrap;

    fn next(&mut self) -> Option<Scrap> {
        loop {
            match self.next_token() {
                Some(token) => {
                    if let Some(scrap) = self.push_token(token) {
                        return Some(scrap);
                    }
                }
                None => {
                    if let Some(scrap) = self.pending.take() {
                        return Some(scrap);
                    }
                    if self.terminated {
                        return None;
                    }
                    self.terminated = true;
                    return Some(self.terminal_pdi());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{IsolateControl, MarkupMap};

    fn scan(text: &str, test_mode: bool) -> Vec<Scrap> {
        Scanner::new(text.as_bytes(), None, test_mode).collect()
    }

    fn summary(scraps: &[Scrap]) -> Vec<(BidiClass, usize, usize)> {
        scraps.iter().map(|s| (s.class, s.left, s.right)).collect()
    }

    #[test]
    fn test_groups_and_terminates() {
        let scraps = scan("car means CAR.", true);
        assert_eq!(
            summary(&scraps),
            vec![
                (BidiClass::L, 0, 3),
                (BidiClass::NI, 3, 4),
                (BidiClass::L, 4, 9),
                (BidiClass::NI, 9, 10),
                (BidiClass::R, 10, 13),
                (BidiClass::CS, 13, 14),
                (BidiClass::PDI, 14, 14),
            ]
        );
        assert_eq!(scraps[1].rune_count(), 1);
    }

    #[test]
    fn test_empty_input_yields_terminal_pdi() {
        let scraps = scan("", false);
        assert_eq!(summary(&scraps), vec![(BidiClass::PDI, 0, 0)]);
    }

    #[test]
    fn test_arabic_letter_turns_numbers_arabic() {
        // AL, space, EN EN
        let scraps = scan("\u{0627} 12", false);
        assert_eq!(scraps[0].class, BidiClass::R);
        assert_eq!(scraps[2].class, BidiClass::AN);
        assert_eq!(
            scraps[2].context.most_recent_strong,
            Some(Direction::RightToLeft)
        );
    }

    #[test]
    fn test_nsm_inherits_and_isolates_reset() {
        // a + combining acute, then RLI + combining acute
        let scraps = scan("a\u{0301}<\u{0301}=", true);
        assert_eq!(
            summary(&scraps),
            vec![
                (BidiClass::L, 0, 3),
                (BidiClass::RLI, 3, 4),
                (BidiClass::NI, 4, 6),
                (BidiClass::PDI, 6, 7),
                (BidiClass::PDI, 7, 7),
            ]
        );
        assert_eq!(scraps[0].rune_count(), 2);
    }

    #[test]
    fn test_brackets_are_never_grouped() {
        let scraps = scan("((x))", false);
        let classes: Vec<_> = scraps.iter().map(|s| s.class).collect();
        assert_eq!(
            classes,
            vec![
                BidiClass::BRO,
                BidiClass::BRO,
                BidiClass::L,
                BidiClass::BRC,
                BidiClass::BRC,
                BidiClass::PDI,
            ]
        );
        assert!(scraps[0].bracket.is_some());
    }

    #[test]
    fn test_pdi_carries_closed_sequence_state() {
        let scraps = scan("a<B c=d", true);
        let pdi = scraps
            .iter()
            .find(|s| s.class == BidiClass::PDI && !s.is_empty())
            .unwrap();
        assert_eq!(pdi.context.first_strong, Some(Direction::RightToLeft));
        assert_eq!(pdi.context.embedding_direction, Some(Direction::RightToLeft));

        // The paragraph never saw the isolate's content.
        let terminal = scraps.last().unwrap();
        assert_eq!(terminal.context.first_strong, Some(Direction::LeftToRight));
        assert_eq!(
            terminal.context.most_recent_strong,
            Some(Direction::LeftToRight)
        );
    }

    #[test]
    fn test_stray_pdi_is_neutral() {
        let scraps = scan("a= b", true);
        assert_eq!(scraps[1].class, BidiClass::NI);
        assert_eq!((scraps[1].left, scraps[1].right), (1, 3));
    }

    #[test]
    fn test_isolate_overflow_demotes_to_neutral() {
        let text = format!("{}x{}", ">".repeat(130), "=".repeat(130));
        let scraps = scan(&text, true);
        let initiators = scraps.iter().filter(|s| s.class == BidiClass::LRI).count();
        let pdis = scraps
            .iter()
            .filter(|s| s.class == BidiClass::PDI && !s.is_empty())
            .count();
        assert_eq!(initiators, MAX_ISOLATE_DEPTH);
        assert_eq!(pdis, MAX_ISOLATE_DEPTH);
    }

    #[test]
    fn test_markup_injects_zero_width_controls() {
        let mut markup = MarkupMap::new();
        markup.isolate(2, 5, IsolateControl::RightToLeft);
        let scraps: Vec<_> = Scanner::new("ab cd".as_bytes(), Some(&markup), false).collect();
        assert_eq!(
            summary(&scraps),
            vec![
                (BidiClass::L, 0, 2),
                (BidiClass::RLI, 2, 2),
                (BidiClass::NI, 2, 3),
                (BidiClass::L, 3, 5),
                (BidiClass::PDI, 5, 5),
                (BidiClass::PDI, 5, 5),
            ]
        );
    }

    #[test]
    fn test_invalid_bytes_stay_covered() {
        let bytes = [b'a', 0xFF, b'b'];
        let scraps: Vec<_> = Scanner::new(&bytes[..], None, false).collect();
        assert_eq!(summary(&scraps), vec![(BidiClass::L, 0, 3), (BidiClass::PDI, 3, 3)]);
        assert_eq!(scraps[0].rune_count(), 2);
    }
}
