//! Prefix walker over a [`HashTrie`]

use super::core::HashTrie;

/// Walks a trie one symbol at a time
///
/// Once a step misses, every further step answers 0.
#[derive(Debug, Clone)]
pub struct TrieIterator<'a> {
    trie: &'a HashTrie,
    base: Option<usize>,
}

impl<'a> TrieIterator<'a> {
    pub(crate) fn new(trie: &'a HashTrie) -> Self {
        Self {
            trie,
            base: Some(HashTrie::ROOT),
        }
    }

    /// Advance by `symbol`; returns the slot reached, or 0 for no match
    #[inline]
    pub fn next(&mut self, symbol: u8) -> usize {
        let Some(base) = self.base else {
            return 0;
        };
        let slot = self.trie.child(base, symbol);
        self.base = if slot == 0 {
            None
        } else {
            self.trie.link(slot)
        };
        slot
    }

    /// Whether further steps can still match
    #[inline]
    pub fn is_live(&self) -> bool {
        self.base.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_reports_prefixes_and_dead_ends() {
        let mut trie = HashTrie::new(5, 64).unwrap();
        trie.alloc_position(&[1, 2, 3]).unwrap();
        trie.alloc_position(&[1]).unwrap();
        trie.freeze();

        let mut it = trie.iter();
        let first = it.next(1);
        assert_ne!(first, 0);
        assert_eq!(first, trie.lookup(&[1]));
        assert_ne!(it.next(2), 0);
        assert_eq!(it.next(3), trie.lookup(&[1, 2, 3]));
        assert!(!it.is_live());
        assert_eq!(it.next(1), 0);

        let mut it = trie.iter();
        assert_eq!(it.next(4), 0);
        assert_eq!(it.next(1), 0);
    }
}
