//! Packed multi-family hash trie
//!
//! Every family (the children of one node) owns a unique base. The child with
//! symbol `c` lives at slot `base + c`, and `check[slot] == c` confirms that
//! the slot belongs to the family. Bases of new families are probed starting
//! at a multiplicative hash of the depth. When a new child collides with a
//! slot held by another family, the inserting family moves to a fresh base and
//! its parent link is rewritten.

use super::iterator::TrieIterator;
use crate::error::TrieError;

/// Upper bound on the alphabet size
pub const MAX_CATEGORIES: usize = 50;

/// Knuth's golden-ratio multiplier
const HASH_MULTIPLIER: u64 = 0x9E37_79B9;

/// Compact trie over small byte alphabets
#[derive(Debug, Clone)]
pub struct HashTrie {
    category_count: usize,
    capacity: usize,
    /// Symbol occupying a slot, 0 when free
    check: Vec<u8>,
    /// Base of the child family of a slot, 0 when it has no children
    link: Vec<u32>,
    /// Family bases in use; dropped on freeze
    taken: Vec<bool>,
    frozen: bool,
}

impl HashTrie {
    /// Root family base; its slots `1..=category_count` are reserved
    pub(crate) const ROOT: usize = 0;

    /// Create a trie for symbols `1..=category_count`
    pub fn new(category_count: usize, capacity: usize) -> Result<Self, TrieError> {
        if category_count == 0 || category_count > MAX_CATEGORIES {
            return Err(TrieError::TooManyCategories {
                count: category_count,
                max: MAX_CATEGORIES,
            });
        }
        let capacity = capacity.max(2 * (category_count + 1));
        let mut taken = vec![false; capacity];
        taken[Self::ROOT] = true;

        Ok(Self {
            category_count,
            capacity,
            check: vec![0; capacity],
            link: vec![0; capacity],
            taken,
            frozen: false,
        })
    }

    #[inline]
    pub fn category_count(&self) -> usize {
        self.category_count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Insert `pattern`, or look it up once frozen
    ///
    /// Returns the slot of the pattern's last symbol. A frozen trie answers 0
    /// for patterns it does not contain. Slots may move while building, so
    /// positions are only stable after [`HashTrie::freeze`].
    pub fn alloc_position(&mut self, pattern: &[u8]) -> Result<usize, TrieError> {
        for &symbol in pattern {
            self.validate(symbol)?;
        }
        if self.frozen {
            return Ok(self.lookup(pattern));
        }
        if pattern.is_empty() {
            return Ok(0);
        }

        let mut base = Self::ROOT;
        let mut parent: Option<usize> = None;
        let mut slot = 0;

        for (depth, &symbol) in pattern.iter().enumerate() {
            slot = base + symbol as usize;
            if self.check[slot] != symbol {
                if self.check[slot] != 0 {
                    let parent_slot = parent.ok_or_else(|| {
                        TrieError::PatternConflict("root family collision".to_string())
                    })?;
                    base = self.relocate(parent_slot, base, symbol, depth)?;
                    slot = base + symbol as usize;
                }
                self.check[slot] = symbol;
                self.link[slot] = 0;
            }

            if let Some(&next) = pattern.get(depth + 1) {
                if self.link[slot] == 0 {
                    let child_base = self.find_base(&[next], depth + 1)?;
                    self.taken[child_base] = true;
                    self.link[slot] = child_base as u32;
                }
                parent = Some(slot);
                base = self.link[slot] as usize;
            }
        }

        Ok(slot)
    }

    /// Make the trie read-only and release insertion bookkeeping
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        self.taken = Vec::new();
        log::debug!(
            "rule trie frozen: {} of {} slots used",
            self.check.iter().filter(|&&c| c != 0).count(),
            self.capacity
        );
    }

    /// Walker starting at the root
    #[inline]
    pub fn iter(&self) -> TrieIterator<'_> {
        TrieIterator::new(self)
    }

    /// Slot of a complete pattern, 0 if absent
    pub fn lookup(&self, pattern: &[u8]) -> usize {
        let mut it = self.iter();
        let mut position = 0;
        for &symbol in pattern {
            position = it.next(symbol);
            if position == 0 {
                return 0;
            }
        }
        position
    }

    /// Child slot of family `base` for `symbol`, 0 if absent
    #[inline]
    pub(crate) fn child(&self, base: usize, symbol: u8) -> usize {
        if symbol == 0 || symbol as usize > self.category_count {
            return 0;
        }
        let slot = base + symbol as usize;
        if self.check[slot] == symbol {
            slot
        } else {
            0
        }
    }

    /// Base of the family below `slot`, if any
    #[inline]
    pub(crate) fn link(&self, slot: usize) -> Option<usize> {
        match self.link[slot] {
            0 => None,
            base => Some(base as usize),
        }
    }

    fn validate(&self, symbol: u8) -> Result<(), TrieError> {
        if symbol == 0 || symbol as usize > self.category_count {
            return Err(TrieError::InvalidSymbol {
                symbol,
                max: self.category_count,
            });
        }
        Ok(())
    }

    /// Find a free base able to host all `members`
    fn find_base(&self, members: &[u8], depth: usize) -> Result<usize, TrieError> {
        // Non-root bases start above the root slots so families never overlap them.
        let low = self.category_count + 1;
        let span = self.capacity - low - self.category_count;
        let start = ((depth as u64 + 1).wrapping_mul(HASH_MULTIPLIER) % span as u64) as usize;

        for attempt in 0..span {
            let base = low + (start + attempt) % span;
            if self.taken[base] {
                continue;
            }
            if members
                .iter()
                .all(|&m| self.check[base + m as usize] == 0)
            {
                return Ok(base);
            }
        }

        Err(TrieError::Exhausted {
            depth,
            attempts: span,
        })
    }

    /// Move the family at `old_base` (plus a new `symbol`) to a fresh base
    fn relocate(
        &mut self,
        parent_slot: usize,
        old_base: usize,
        symbol: u8,
        depth: usize,
    ) -> Result<usize, TrieError> {
        let mut members: Vec<u8> = (1..=self.category_count as u8)
            .filter(|&m| self.check[old_base + m as usize] == m)
            .collect();
        let moved = members.len();
        members.push(symbol);

        let new_base = self.find_base(&members, depth)?;
        for &m in &members[..moved] {
            let from = old_base + m as usize;
            let to = new_base + m as usize;
            self.check[to] = m;
            self.link[to] = self.link[from];
            self.check[from] = 0;
            self.link[from] = 0;
        }
        self.taken[old_base] = false;
        self.taken[new_base] = true;
        self.link[parent_slot] = new_base as u32;

        log::trace!(
            "trie family at depth {} moved from {} to {}",
            depth,
            old_base,
            new_base
        );
        Ok(new_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_too_many_categories() {
        assert!(matches!(
            HashTrie::new(51, 256),
            Err(TrieError::TooManyCategories { count: 51, .. })
        ));
    }

    #[test]
    fn test_insert_then_lookup_after_freeze() {
        let mut trie = HashTrie::new(8, 128).unwrap();
        let patterns: [&[u8]; 6] = [&[1, 2, 1], &[1, 1], &[2, 8, 2], &[3], &[3, 4, 3], &[8, 8]];
        for pattern in patterns {
            assert_ne!(trie.alloc_position(pattern).unwrap(), 0);
        }
        trie.freeze();

        let mut seen = Vec::new();
        for pattern in patterns {
            let position = trie.alloc_position(pattern).unwrap();
            assert_ne!(position, 0, "{:?} lost", pattern);
            assert!(!seen.contains(&position));
            seen.push(position);
        }
        assert_eq!(trie.alloc_position(&[2, 2]).unwrap(), 0);
        assert_eq!(trie.lookup(&[4]), 0);
    }

    #[test]
    fn test_relocation_keeps_all_patterns() {
        // A tiny trie forces families to collide and move.
        let mut trie = HashTrie::new(6, 40).unwrap();
        let mut patterns = Vec::new();
        for a in 1..=3u8 {
            for b in 1..=6u8 {
                patterns.push(vec![a, b]);
            }
        }
        for pattern in &patterns {
            trie.alloc_position(pattern).unwrap();
        }
        trie.freeze();
        for pattern in &patterns {
            assert_ne!(trie.lookup(pattern), 0, "{:?} lost", pattern);
        }
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut trie = HashTrie::new(4, 12).unwrap();
        let mut result = Ok(0);
        'outer: for a in 1..=4u8 {
            for b in 1..=4u8 {
                for c in 1..=4u8 {
                    result = trie.alloc_position(&[a, b, c]);
                    if result.is_err() {
                        break 'outer;
                    }
                }
            }
        }
        assert!(matches!(result, Err(TrieError::Exhausted { .. })));
    }

    #[test]
    fn test_invalid_symbol() {
        let mut trie = HashTrie::new(4, 64).unwrap();
        assert!(matches!(
            trie.alloc_position(&[0]),
            Err(TrieError::InvalidSymbol { symbol: 0, .. })
        ));
        assert!(trie.alloc_position(&[5]).is_err());
    }
}
