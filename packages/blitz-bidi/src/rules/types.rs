//! Rule definitions and their actions

use crate::scrap::{squash, Scrap};
use crate::types::{BidiClass, Direction};

/// Parser pass a rule belongs to
///
/// Pass 2 applies every rule whose pass is at most `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Pass {
    Weak = 1,
    Neutral = 2,
}

/// Actions that inspect the surroundings before rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRule {
    /// W4: squash the triple into `class` when the separator is one code point
    SingleSeparator(BidiClass),
    /// W7: a European number after L (or an L sos) becomes L
    EuropeanNumber,
    /// N1/N2: resolve a neutral from its neighbours and the embedding
    Neutral,
}

/// What a matched rule does to the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// Collapse every matched scrap into one of the given class
    Squash(BidiClass),
    /// Relabel the middle scrap of a triple
    MidSwap(BidiClass),
    /// Relabel the single matched scrap
    Relabel(BidiClass),
    Context(ContextRule),
}

/// A rewrite rule over one to three adjacent scraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub lhs: &'static [BidiClass],
    pub pass: Pass,
    pub action: RuleAction,
    /// Cursor movement after a successful application
    pub jump: isize,
}

/// Facts about the sequence under resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEnv {
    /// Embedding direction of the sequence, once resolved
    pub embedding: Option<Direction>,
}

impl Rule {
    /// Apply at `at`; returns the cursor jump, or `None` when the rule declines
    pub fn apply(&self, stack: &mut Vec<Scrap>, at: usize, env: &RuleEnv) -> Option<isize> {
        if at + self.lhs.len() > stack.len() {
            return None;
        }
        match self.action {
            RuleAction::Squash(class) => {
                squash(stack, at, self.lhs.len(), class);
                Some(self.jump)
            }
            RuleAction::MidSwap(class) => {
                stack[at + 1].class = class;
                Some(self.jump)
            }
            RuleAction::Relabel(class) => {
                stack[at].class = class;
                Some(self.jump)
            }
            RuleAction::Context(rule) => self.apply_context(rule, stack, at, env),
        }
    }

    fn apply_context(
        &self,
        rule: ContextRule,
        stack: &mut Vec<Scrap>,
        at: usize,
        env: &RuleEnv,
    ) -> Option<isize> {
        match rule {
            ContextRule::SingleSeparator(class) => {
                if stack[at + 1].rune_count() != 1 {
                    return None;
                }
                // W4 runs before W5: terminators next to the separator block it.
                if stack[at].ends_with_terminator() || stack[at + 2].starts_with_terminator() {
                    return None;
                }
                squash(stack, at, 3, class);
                Some(self.jump)
            }
            ContextRule::EuropeanNumber => {
                let scrap = &mut stack[at];
                let preceding = scrap
                    .context
                    .most_recent_strong
                    .or(env.embedding)
                    .or(scrap.context.embedding_direction)?;
                if preceding != Direction::LeftToRight {
                    return None;
                }
                scrap.class = BidiClass::L;
                Some(self.jump)
            }
            ContextRule::Neutral => {
                let embedding = env.embedding?;
                let previous = neighbour_influence(stack.get(at.checked_sub(1)?)?, embedding)?;
                let next = neighbour_influence(stack.get(at + 1)?, embedding)?;
                let direction = if previous == next {
                    previous
                } else if previous == embedding || next == embedding {
                    embedding
                } else {
                    return None;
                };
                stack[at].class = direction.strong_class();
                Some(self.jump)
            }
        }
    }
}

/// Direction a neighbour exerts on a neutral; sequence boundaries act as sos/eos
fn neighbour_influence(scrap: &Scrap, embedding: Direction) -> Option<Direction> {
    if scrap.class.is_sequence_boundary() {
        return Some(embedding);
    }
    scrap.class.neutral_influence()
}
