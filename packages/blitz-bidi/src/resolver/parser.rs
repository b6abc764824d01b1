//! Two-pass stack resolver over isolating run sequences
//!
//! All sequences share one scrap stack. A sequence starts at its initiator
//! (the implicit paragraph FSI at index 0, or an LRI/RLI/FSI scrap) and ends
//! at its PDI. Pass 1 pulls scraps from the scanner and applies the weak
//! rules, recursing into nested isolates. Once the sequence is complete its
//! embedding direction is known and pass 2 resolves brackets (N0) and
//! neutrals (N1/N2). A resolved nested sequence leaves the stack as the only
//! child of a single neutral scrap in its parent.

use std::io::Read;

use arrayvec::ArrayVec;

use super::levels::ResolvedLevels;
use crate::brackets::BracketPairHandler;
use crate::error::BidiError;
use crate::options::ResolverOptions;
use crate::rules::{Pass, RuleEnv, RuleSet};
use crate::scanner::Scanner;
use crate::scrap::{DirectionalContext, Scrap};
use crate::types::{BidiClass, Direction};

/// How a sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceEnd {
    /// Index of the matching PDI
    Closed(usize),
    /// Input ended before a matching PDI
    Unclosed,
}

pub(crate) struct Parser<'m, R: Read> {
    scanner: Scanner<'m, R>,
    rules: &'static RuleSet,
    options: ResolverOptions,
    stack: Vec<Scrap>,
}

impl<'m, R: Read> Parser<'m, R> {
    pub(crate) fn new(
        scanner: Scanner<'m, R>,
        rules: &'static RuleSet,
        options: ResolverOptions,
    ) -> Self {
        Self {
            scanner,
            rules,
            options,
            stack: Vec::new(),
        }
    }

    /// Resolve the whole paragraph
    pub(crate) fn parse(mut self) -> Result<ResolvedLevels, BidiError> {
        self.stack
            .push(Scrap::marker(BidiClass::FSI, 0, DirectionalContext::default()));
        let end = self.resolve_sequence(0, 0);
        debug_assert!(matches!(end, SequenceEnd::Closed(_)));

        if let Some(error) = self.scanner.take_error() {
            return Err(BidiError::Io(error));
        }

        let direction = self.stack[0]
            .context
            .embedding_direction
            .unwrap_or(self.options.default_direction);
        let length = self.scanner.offset();
        log::debug!(
            "paragraph of {} bytes resolved {} into {} scraps",
            length,
            direction,
            self.stack.len()
        );
        Ok(ResolvedLevels::new(self.stack, direction, 0, length))
    }

    /// Resolve the sequence whose initiator sits at `start`
    fn resolve_sequence(&mut self, start: usize, depth: usize) -> SequenceEnd {
        let initiator = self.stack[start].class;
        let mut env = RuleEnv {
            embedding: initiator.isolate_direction(),
        };
        let mut brackets = BracketPairHandler::new();

        let end = self.weak_pass(start, depth, &env, &mut brackets);
        let SequenceEnd::Closed(pdi) = end else {
            return end;
        };

        let embedding = match initiator.isolate_direction() {
            Some(direction) => direction,
            None => {
                let fallback = if depth == 0 {
                    self.options.default_direction
                } else {
                    Direction::LeftToRight
                };
                self.stack[pdi].context.first_strong.unwrap_or(fallback)
            }
        };
        self.stack[start].context.embedding_direction = Some(embedding);
        if env.embedding.is_none() {
            env.embedding = Some(embedding);
            self.finish_weak(start, &env);
        }

        SequenceEnd::Closed(self.neutral_pass(start, &env, &brackets))
    }

    /// Pass 1: weak rules, nested isolates and bracket collection
    fn weak_pass(
        &mut self,
        start: usize,
        depth: usize,
        env: &RuleEnv,
        brackets: &mut BracketPairHandler,
    ) -> SequenceEnd {
        let mut i = start + 1;
        loop {
            self.fill(i + 3);
            let Some(scrap) = self.stack.get(i) else {
                // The scanner always ends with a PDI, so this is unreachable.
                return SequenceEnd::Unclosed;
            };
            let class = scrap.class;

            if class == BidiClass::PDI {
                if depth > 0 && self.is_terminal(i) {
                    return SequenceEnd::Unclosed;
                }
                return SequenceEnd::Closed(i);
            }

            if class.is_isolate_initiator() {
                match self.resolve_sequence(i, depth + 1) {
                    SequenceEnd::Closed(pdi) => {
                        self.collapse(i, pdi);
                        i = clamp(i, -1, start);
                    }
                    SequenceEnd::Unclosed => {
                        log::debug!(
                            "isolate at {} is never closed, treated as neutral",
                            self.stack[i].left
                        );
                        self.stack[i].class = BidiClass::NI;
                    }
                }
                continue;
            }

            if let Some(jump) = self.apply_rules(i, Pass::Weak, env) {
                i = clamp(i, jump, start);
                continue;
            }
            brackets.register(&self.stack[i]);
            i += 1;
        }
    }

    /// Weak rules left pending on the embedding direction (W7 at sos)
    fn finish_weak(&mut self, start: usize, env: &RuleEnv) {
        let mut i = start + 1;
        while let Some(scrap) = self.stack.get(i) {
            if scrap.class == BidiClass::PDI {
                return;
            }
            match self.apply_rules(i, Pass::Weak, env) {
                Some(jump) => i = clamp(i, jump, start),
                None => i += 1,
            }
        }
    }

    /// Pass 2: brackets and neutrals; returns the index of the closing PDI
    fn neutral_pass(&mut self, start: usize, env: &RuleEnv, brackets: &BracketPairHandler) -> usize {
        let mut i = start + 1;
        while let Some(scrap) = self.stack.get(i) {
            let class = scrap.class;
            let jump = match class {
                BidiClass::PDI => return i,
                BidiClass::BRO => Some(self.resolve_bracket_pair(i, start, env, brackets)),
                BidiClass::BRC => {
                    // Paired closers are resolved with their opener.
                    self.stack[i].class = BidiClass::NI;
                    Some(-1)
                }
                _ => self.apply_rules(i, Pass::Neutral, env),
            };
            match jump {
                Some(jump) => i = clamp(i, jump, start),
                None => i += 1,
            }
        }
        self.stack.len() - 1
    }

    /// N0 for the opening bracket at `at`
    fn resolve_bracket_pair(
        &mut self,
        at: usize,
        start: usize,
        env: &RuleEnv,
        brackets: &BracketPairHandler,
    ) -> isize {
        let embedding = env.embedding.unwrap_or_default();
        let closer = brackets
            .find_bracket_pairing(&self.stack[at])
            .and_then(|pairing| self.closer_index(at, pairing.closing));
        let Some(close) = closer else {
            self.stack[at].class = BidiClass::NI;
            return -1;
        };

        let mut found_embedding = false;
        let mut found_opposite = false;
        for scrap in &self.stack[at + 1..close] {
            match scrap.class.neutral_influence() {
                Some(direction) if direction == embedding => found_embedding = true,
                Some(_) => found_opposite = true,
                None => {}
            }
        }

        let direction = if found_embedding {
            Some(embedding)
        } else if found_opposite {
            // Nearest strong type before the opener, sos when none
            let preceding = self.stack[start + 1..at]
                .iter()
                .rev()
                .find_map(|scrap| scrap.class.neutral_influence())
                .unwrap_or(embedding);
            Some(preceding)
        } else {
            None
        };

        match direction {
            Some(direction) => {
                let class = direction.strong_class();
                log::trace!(
                    "bracket pair {}..{} resolved {}",
                    self.stack[at].left,
                    self.stack[close].left,
                    direction
                );
                self.stack[at].class = class;
                self.stack[close].class = class;
                -2
            }
            None => {
                self.stack[at].class = BidiClass::NI;
                self.stack[close].class = BidiClass::NI;
                -1
            }
        }
    }

    /// Stack index of the closing bracket starting at `position`
    ///
    /// Scraps after the opener are in text order, so the search is binary.
    fn closer_index(&self, opener: usize, position: usize) -> Option<usize> {
        let base = opener + 1;
        let first = base + self.stack[base..].partition_point(|s| s.left < position);
        self.stack[first..]
            .iter()
            .take_while(|s| s.left == position)
            .position(|s| s.class == BidiClass::BRC)
            .map(|offset| first + offset)
    }

    /// Try the rules matching the window at `at`, long candidate first
    fn apply_rules(&mut self, at: usize, pass: Pass, env: &RuleEnv) -> Option<isize> {
        let window: ArrayVec<BidiClass, 3> =
            self.stack[at..].iter().take(3).map(|s| s.class).collect();
        for rule in self.rules.lookup(&window, pass) {
            if let Some(jump) = rule.apply(&mut self.stack, at, env) {
                log::trace!("{} applied at index {}", rule.name, at);
                return Some(jump);
            }
        }
        None
    }

    /// Replace the resolved sequence `stack[start..=pdi]` by one neutral scrap
    fn collapse(&mut self, start: usize, pdi: usize) {
        let sequence: Vec<Scrap> = self.stack.drain(start..=pdi).collect();
        let left = sequence[0].left;
        let right = sequence[sequence.len() - 1].right;
        let mut scrap = Scrap::new(BidiClass::NI, left, right, DirectionalContext::default());
        scrap.runes = sequence.iter().map(Scrap::rune_count).sum();
        scrap.children.push(sequence);
        self.stack.insert(start, scrap);
    }

    fn fill(&mut self, len: usize) {
        while self.stack.len() < len {
            match self.scanner.next() {
                Some(scrap) => self.stack.push(scrap),
                None => break,
            }
        }
    }

    /// The synthetic PDI closing the paragraph
    fn is_terminal(&self, i: usize) -> bool {
        i + 1 == self.stack.len() && self.scanner.is_finished()
    }
}

#[inline]
fn clamp(i: usize, jump: isize, start: usize) -> usize {
    (i as isize + jump).max(start as isize + 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::rules;

    fn parse(text: &str, options: ResolverOptions) -> ResolvedLevels {
        let scanner = Scanner::new(text.as_bytes(), None, options.test_mode);
        Parser::new(scanner, rules().unwrap(), options).parse().unwrap()
    }

    fn classes(scraps: &[Scrap]) -> Vec<BidiClass> {
        scraps.iter().map(|s| s.class).collect()
    }

    fn test_options() -> ResolverOptions {
        ResolverOptions::new().with_test_mode(true)
    }

    #[test]
    fn test_weak_rules_on_numbers() {
        // "1.5" is one European number; after L, W7 makes it L.
        let levels = parse("a 1.5", ResolverOptions::new());
        assert_eq!(
            classes(levels.scraps()),
            vec![BidiClass::FSI, BidiClass::L, BidiClass::PDI]
        );
    }

    #[test]
    fn test_numbers_after_rtl_stay_numbers() {
        let levels = parse("AB 12", test_options());
        assert_eq!(
            classes(levels.scraps()),
            vec![BidiClass::FSI, BidiClass::R, BidiClass::EN, BidiClass::PDI]
        );
        assert_eq!(levels.embedding_direction(), Direction::RightToLeft);
    }

    #[test]
    fn test_double_separator_is_neutral() {
        let levels = parse("AB 1,,2", test_options());
        let scraps = levels.scraps();
        assert_eq!(
            classes(scraps),
            vec![
                BidiClass::FSI,
                BidiClass::R,
                BidiClass::EN,
                BidiClass::R,
                BidiClass::EN,
                BidiClass::PDI,
            ]
        );
        assert_eq!((scraps[3].left, scraps[3].right), (4, 6));
    }

    #[test]
    fn test_terminators_join_numbers() {
        let levels = parse("AB $12%", test_options());
        let scraps = levels.scraps();
        assert_eq!(scraps[2].class, BidiClass::EN);
        assert_eq!((scraps[2].left, scraps[2].right), (3, 7));
    }

    #[test]
    fn test_brackets_take_embedding_direction() {
        // RTL paragraph, pair contains an R
        let levels = parse("AB (CD) ef", test_options());
        let scraps = levels.scraps();
        let bracket = scraps
            .iter()
            .find(|s| s.left <= 3 && s.right > 3)
            .unwrap();
        assert_eq!(bracket.class, BidiClass::R);
    }

    #[test]
    fn test_brackets_follow_opposite_context() {
        // LTR paragraph, R before the pair and only R inside
        let levels = parse("ab CD(EF) gh", test_options());
        let scraps = levels.scraps();
        let opener = scraps.iter().find(|s| s.left <= 5 && s.right > 5).unwrap();
        let closer = scraps.iter().find(|s| s.left <= 8 && s.right > 8).unwrap();
        assert_eq!(opener.class, BidiClass::R);
        assert_eq!(closer.class, BidiClass::R);
    }

    #[test]
    fn test_unclosed_isolate_is_spliced() {
        let levels = parse("ab <CD", test_options());
        let scraps = levels.scraps();
        assert!(scraps.iter().all(|s| !s.has_children()));
        assert_eq!(scraps.last().unwrap().class, BidiClass::PDI);
        let covered: usize = scraps.iter().map(Scrap::len).sum();
        assert_eq!(covered, 6);
    }

    #[test]
    fn test_fsi_takes_first_strong() {
        let options = ResolverOptions::new().with_test_mode(false);
        let levels = parse("ab \u{2068}\u{05D0}b\u{2069}", options);
        let isolate = levels
            .scraps()
            .iter()
            .find(|s| s.has_children())
            .unwrap();
        assert_eq!(
            Scrap::sequence_direction(&isolate.children[0]),
            Some(Direction::RightToLeft)
        );
    }

    #[test]
    fn test_leading_numbers_follow_late_paragraph_direction() {
        for text in ["10 -> 20 items", "1. 2. item"] {
            let levels = parse(text, ResolverOptions::new());
            assert_eq!(
                classes(levels.scraps()),
                vec![BidiClass::FSI, BidiClass::L, BidiClass::PDI],
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_separator_after_terminator_stays_neutral() {
        let levels = parse("\u{05D0} 1%+2", ResolverOptions::new());
        assert_eq!(
            classes(levels.scraps()),
            vec![
                BidiClass::FSI,
                BidiClass::R,
                BidiClass::EN,
                BidiClass::R,
                BidiClass::EN,
                BidiClass::PDI,
            ]
        );
        assert_eq!((levels.scraps()[2].left, levels.scraps()[2].right), (3, 5));
    }

    #[test]
    fn test_later_pairs_find_their_closers() {
        // Two settled pairs sit between the last opener and its closer's search.
        let levels = parse("ab (cd) (ef) GH(IJ) kl", test_options());
        let scraps = levels.scraps();
        let class_at = |at: usize| {
            scraps
                .iter()
                .find(|s| s.left <= at && s.right > at)
                .map(|s| s.class)
        };
        assert_eq!(class_at(3), Some(BidiClass::L));
        assert_eq!(class_at(11), Some(BidiClass::L));
        assert_eq!(class_at(15), Some(BidiClass::R));
        assert_eq!(class_at(18), Some(BidiClass::R));
    }

    #[test]
    fn test_neutral_pass_is_idempotent() {
        let levels = parse("car (MEANS) 12 CAR, <x Y=.", test_options());
        let settled = levels.scraps().to_vec();

        let scanner = Scanner::new(&b""[..], None, true);
        let mut parser = Parser::new(scanner, rules().unwrap(), test_options());
        parser.stack = settled.clone();
        let env = RuleEnv {
            embedding: Some(levels.embedding_direction()),
        };
        let pdi = parser.neutral_pass(0, &env, &BracketPairHandler::new());

        assert_eq!(pdi, settled.len() - 1);
        assert_eq!(parser.stack, settled);
    }
}
