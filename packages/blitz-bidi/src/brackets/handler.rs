//! BD16 bracket pairing for one isolating run sequence

use arrayvec::ArrayVec;

use super::pairs::BracketPair;
use crate::scrap::Scrap;
use crate::types::BidiClass;

/// Maximum number of open brackets tracked per isolating run sequence
pub const MAX_BRACKET_DEPTH: usize = 63;

/// An opening bracket waiting for its closer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketStackEntry {
    pub opening: usize,
    pub pair: BracketPair,
}

/// A matched bracket pair, identified by text positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub opening: usize,
    pub pair: BracketPair,
    pub closing: usize,
}

/// Correlates opening and closing brackets of one isolating run sequence
#[derive(Debug, Default)]
pub struct BracketPairHandler {
    stack: ArrayVec<BracketStackEntry, MAX_BRACKET_DEPTH>,
    /// Sorted by opening position
    pairings: Vec<Pairing>,
    /// Position of the last bracket fed in through `register`
    last_registered: Option<usize>,
}

impl BracketPairHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an opening bracket; refused once the stack holds 63 entries
    pub fn push_opening(&mut self, position: usize, pair: BracketPair) -> bool {
        match self.stack.try_push(BracketStackEntry {
            opening: position,
            pair,
        }) {
            Ok(()) => true,
            Err(_) => {
                log::debug!(
                    "bracket stack full, opening bracket at {} stays unpaired",
                    position
                );
                false
            }
        }
    }

    /// Match a closing bracket against the open brackets
    ///
    /// Searches from the top of the stack down, skipping unmatched openers.
    /// On success the opener and everything above it are popped.
    pub fn find_pair(&mut self, position: usize, closer: BracketPair) -> Option<&Pairing> {
        let depth = self
            .stack
            .iter()
            .rposition(|entry| entry.pair.is_closed_by(&closer))?;
        let entry = self.stack[depth];
        self.stack.truncate(depth);

        let pairing = Pairing {
            opening: entry.opening,
            pair: entry.pair,
            closing: position,
        };
        let idx = self
            .pairings
            .partition_point(|p| p.opening < pairing.opening);
        self.pairings.insert(idx, pairing);
        self.pairings.get(idx)
    }

    /// Pairing whose opening bracket is `scrap`
    pub fn find_bracket_pairing(&self, scrap: &Scrap) -> Option<&Pairing> {
        self.pairings
            .binary_search_by_key(&scrap.left, |p| p.opening)
            .ok()
            .map(|idx| &self.pairings[idx])
    }

    /// Feed a bracket scrap the parser walks over
    ///
    /// Brackets already seen are ignored, so revisiting positions after a
    /// backward jump is harmless.
    pub fn register(&mut self, scrap: &Scrap) {
        if !scrap.class.is_bracket() {
            return;
        }
        if self.last_registered.is_some_and(|last| scrap.left <= last) {
            return;
        }
        self.last_registered = Some(scrap.left);

        let Some(pair) = scrap.bracket else {
            return;
        };
        match scrap.class {
            BidiClass::BRO => {
                self.push_opening(scrap.left, pair);
            }
            BidiClass::BRC => {
                if self.find_pair(scrap.left, pair).is_none() {
                    log::trace!("closing bracket at {} has no opener", scrap.left);
                }
            }
            _ => {}
        }
    }

    #[inline]
    pub fn open_count(&self) -> usize {
        self.stack.len()
    }

    #[inline]
    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }
}
