//! The UAX#9 rule dictionary and its trie index

use arrayvec::ArrayVec;
use once_cell::sync::Lazy;

use super::types::{ContextRule, Pass, Rule, RuleAction};
use crate::error::{BidiError, TrieError};
use crate::trie::HashTrie;
use crate::types::BidiClass;
use crate::types::BidiClass::*;

/// Slots reserved for the rule trie
const TRIE_CAPACITY: usize = 512;

const fn rule(
    name: &'static str,
    lhs: &'static [BidiClass],
    pass: Pass,
    action: RuleAction,
    jump: isize,
) -> Rule {
    Rule {
        name,
        lhs,
        pass,
        action,
        jump,
    }
}

/// Every rule, weak rules first
pub static RULE_DEFINITIONS: &[Rule] = &[
    // W4
    rule("W4", &[EN, ES, EN], Pass::Weak, RuleAction::Context(ContextRule::SingleSeparator(EN)), 0),
    rule("W4", &[EN, CS, EN], Pass::Weak, RuleAction::Context(ContextRule::SingleSeparator(EN)), 0),
    rule("W4", &[AN, CS, AN], Pass::Weak, RuleAction::Context(ContextRule::SingleSeparator(AN)), 0),
    // W5
    rule("W5", &[ET, EN], Pass::Weak, RuleAction::Squash(EN), -1),
    rule("W5", &[EN, ET], Pass::Weak, RuleAction::Squash(EN), 0),
    // W6
    rule("W6", &[ES], Pass::Weak, RuleAction::Relabel(NI), -1),
    rule("W6", &[ET], Pass::Weak, RuleAction::Relabel(NI), -1),
    rule("W6", &[CS], Pass::Weak, RuleAction::Relabel(NI), -1),
    // W7
    rule("W7", &[EN], Pass::Weak, RuleAction::Context(ContextRule::EuropeanNumber), -1),
    // Merges
    rule("merge", &[L, L], Pass::Weak, RuleAction::Squash(L), 0),
    rule("merge", &[R, R], Pass::Weak, RuleAction::Squash(R), 0),
    rule("merge", &[EN, EN], Pass::Weak, RuleAction::Squash(EN), 0),
    rule("merge", &[AN, AN], Pass::Weak, RuleAction::Squash(AN), 0),
    rule("merge", &[NI, NI], Pass::Weak, RuleAction::Squash(NI), 0),
    // N1
    rule("N1", &[L, NI, L], Pass::Neutral, RuleAction::Squash(L), 0),
    rule("N1", &[R, NI, R], Pass::Neutral, RuleAction::Squash(R), 0),
    rule("N1", &[R, NI, EN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[R, NI, AN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[EN, NI, R], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[AN, NI, R], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[EN, NI, EN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[AN, NI, AN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[EN, NI, AN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    rule("N1", &[AN, NI, EN], Pass::Neutral, RuleAction::MidSwap(R), 0),
    // N1/N2
    rule("N1/N2", &[NI], Pass::Neutral, RuleAction::Context(ContextRule::Neutral), -1),
];

/// Up to two rules matching a window: the long candidate first
pub type Candidates = ArrayVec<&'static Rule, 2>;

/// Rules indexed by the trie position of their left-hand side
#[derive(Debug)]
pub struct RuleSet {
    trie: HashTrie,
    table: Vec<Option<&'static Rule>>,
}

impl RuleSet {
    /// Build the trie over `rules` and index every rule by its position
    pub fn build(rules: &'static [Rule]) -> Result<Self, TrieError> {
        let mut trie = HashTrie::new(BidiClass::COUNT, TRIE_CAPACITY)?;
        check_prefixes(rules)?;

        let mut symbols: Vec<ArrayVec<u8, 3>> = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = lhs_symbols(rule)?;
            trie.alloc_position(&pattern)?;
            symbols.push(pattern);
        }
        trie.freeze();

        let mut table: Vec<Option<&'static Rule>> = vec![None; trie.capacity()];
        for (rule, pattern) in rules.iter().zip(&symbols) {
            let position = trie.lookup(pattern);
            if position == 0 {
                return Err(TrieError::PatternConflict(format!(
                    "{} {:?} lost after freeze",
                    rule.name, rule.lhs
                )));
            }
            if let Some(existing) = table[position] {
                return Err(TrieError::PatternConflict(format!(
                    "{} {:?} duplicates {}",
                    rule.name, rule.lhs, existing.name
                )));
            }
            table[position] = Some(rule);
        }

        log::debug!("rule set built with {} rules", rules.len());
        Ok(Self { trie, table })
    }

    /// Rules whose left-hand side starts `window`, longest first
    pub fn candidates(&self, window: &[BidiClass]) -> Candidates {
        let mut found = Candidates::new();
        let mut it = self.trie.iter();
        let mut positions = [0usize; 3];
        for (depth, class) in window.iter().take(3).enumerate() {
            let position = it.next(class.symbol());
            if position == 0 {
                break;
            }
            positions[depth] = position;
        }

        let long = [positions[2], positions[1]]
            .into_iter()
            .filter(|&p| p != 0)
            .find_map(|p| self.table[p]);
        if let Some(rule) = long {
            found.push(rule);
        }
        if positions[0] != 0 {
            if let Some(rule) = self.table[positions[0]] {
                found.push(rule);
            }
        }
        found
    }

    /// Rules usable in `pass`, longest first
    pub fn lookup(&self, window: &[BidiClass], pass: Pass) -> Candidates {
        let mut candidates = self.candidates(window);
        candidates.retain(|rule| rule.pass <= pass);
        candidates
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.iter().filter(|slot| slot.is_some()).count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lhs_symbols(rule: &Rule) -> Result<ArrayVec<u8, 3>, TrieError> {
    if rule.lhs.is_empty() || rule.lhs.len() > 3 {
        return Err(TrieError::PatternConflict(format!(
            "{} has a left-hand side of {} classes",
            rule.name,
            rule.lhs.len()
        )));
    }
    Ok(rule.lhs.iter().map(|class| class.symbol()).collect())
}

/// A 3-symbol walk must yield at most one long candidate
fn check_prefixes(rules: &[Rule]) -> Result<(), TrieError> {
    for short in rules.iter().filter(|r| r.lhs.len() == 2) {
        if let Some(long) = rules
            .iter()
            .find(|r| r.lhs.len() == 3 && r.lhs.starts_with(short.lhs))
        {
            return Err(TrieError::PatternConflict(format!(
                "{} {:?} is a prefix of {} {:?}",
                short.name, short.lhs, long.name, long.lhs
            )));
        }
    }
    Ok(())
}

static RULES: Lazy<Result<RuleSet, TrieError>> = Lazy::new(|| RuleSet::build(RULE_DEFINITIONS));

/// The process-wide rule set, built on first use
pub fn rules() -> Result<&'static RuleSet, BidiError> {
    RULES.as_ref().map_err(|e| BidiError::RuleTrie(e.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_rule_set_builds() {
        let set = rules().unwrap();
        assert_eq!(set.len(), RULE_DEFINITIONS.len());
    }

    #[test]
    fn test_long_candidate_precedes_short() {
        let set = rules().unwrap();
        let found = set.lookup(&[EN, CS, EN], Pass::Weak);
        let names: Vec<_> = found.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["W4", "W7"]);

        let found = set.lookup(&[EN, ET, L], Pass::Weak);
        assert_eq!(found[0].lhs, &[EN, ET]);
    }

    #[test]
    fn test_pass_filter() {
        let set = rules().unwrap();
        assert!(set.lookup(&[NI, L, L], Pass::Weak).is_empty());
        let found = set.lookup(&[NI, L, L], Pass::Neutral);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "N1/N2");

        let found = set.lookup(&[L, NI, L], Pass::Neutral);
        assert_eq!(found[0].action, RuleAction::Squash(L));
    }

    #[test]
    fn test_no_match() {
        let set = rules().unwrap();
        assert!(set.lookup(&[PDI, L], Pass::Neutral).is_empty());
        assert!(set.lookup(&[BRO], Pass::Neutral).is_empty());
    }

    #[test]
    fn test_prefix_conflict_is_rejected() {
        static CONFLICTING: &[Rule] = &[
            rule("a", &[L, NI], Pass::Weak, RuleAction::Squash(L), 0),
            rule("b", &[L, NI, L], Pass::Neutral, RuleAction::Squash(L), 0),
        ];
        assert!(matches!(
            RuleSet::build(CONFLICTING),
            Err(TrieError::PatternConflict(_))
        ));
    }
}
