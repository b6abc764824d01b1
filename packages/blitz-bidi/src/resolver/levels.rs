//! The resolved scrap tree of one paragraph

use crate::error::BidiError;
use crate::reorder::{self, Ordering};
use crate::scrap::Scrap;
use crate::types::{BidiClass, Direction};

/// Resolution result: the top-level sequence with isolates nested as children
///
/// Positions are byte offsets into the original input, also after a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLevels {
    scraps: Vec<Scrap>,
    direction: Direction,
    start: usize,
    end: usize,
}

impl ResolvedLevels {
    pub(crate) fn new(scraps: Vec<Scrap>, direction: Direction, start: usize, end: usize) -> Self {
        Self {
            scraps,
            direction,
            start,
            end,
        }
    }

    /// Top-level scraps, bounded by zero-length FSI and PDI markers
    #[inline]
    pub fn scraps(&self) -> &[Scrap] {
        &self.scraps
    }

    /// Paragraph direction
    #[inline]
    pub fn embedding_direction(&self) -> Direction {
        self.direction
    }

    /// Byte offset where this paragraph (or part of one) starts
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the end
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of input bytes covered
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Visual runs of this paragraph
    pub fn reorder(&self) -> Ordering {
        reorder::reorder(&self.scraps, self.direction)
    }

    /// Cut at byte position `at` into two halves that reorder independently
    ///
    /// Scraps straddling `at` are cut in two; isolates cut in two keep their
    /// direction on both sides.
    pub fn split(&self, at: usize) -> Result<(ResolvedLevels, ResolvedLevels), BidiError> {
        if at < self.start || at > self.end {
            return Err(BidiError::InvalidPosition {
                position: at,
                length: self.end,
            });
        }
        let (left, right) = split_sequence(&self.scraps, at);
        Ok((
            ResolvedLevels::new(left, self.direction, self.start, at),
            ResolvedLevels::new(right, self.direction, at, self.end),
        ))
    }
}

/// Which half a scrap lies in, if it is not cut
fn side(scrap: &Scrap, at: usize) -> Option<bool> {
    if scrap.is_empty() {
        // Zero-length scraps at the cut: PDIs close the right half.
        let goes_left = scrap.left < at || (scrap.left == at && scrap.class != BidiClass::PDI);
        return Some(goes_left);
    }
    if scrap.right <= at {
        Some(true)
    } else if scrap.left >= at {
        Some(false)
    } else {
        None
    }
}

fn split_sequence(sequence: &[Scrap], at: usize) -> (Vec<Scrap>, Vec<Scrap>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for scrap in sequence {
        match side(scrap, at) {
            Some(true) => left.push(scrap.clone()),
            Some(false) => right.push(scrap.clone()),
            None => {
                let (head, tail) = split_scrap(scrap, at);
                left.push(head);
                right.push(tail);
            }
        }
    }

    // The right half keeps a marker for the direction of its sequence.
    if let (Some(initiator), Some(first)) = (sequence.first(), right.first()) {
        if initiator.class.is_isolate_initiator() && first.class != initiator.class {
            right.insert(0, Scrap::marker(initiator.class, at, initiator.context));
        }
    }
    (left, right)
}

fn split_scrap(scrap: &Scrap, at: usize) -> (Scrap, Scrap) {
    let mut head = Scrap::new(scrap.class, scrap.left, at, scrap.context);
    let mut tail = Scrap::new(scrap.class, at, scrap.right, scrap.context);
    head.bracket = scrap.bracket;
    tail.bracket = scrap.bracket;

    for child in &scrap.children {
        let child_left = child.first().map_or(scrap.left, |s| s.left);
        let child_right = child.last().map_or(scrap.right, |s| s.right);
        if child_right <= at {
            head.children.push(child.clone());
        } else if child_left >= at {
            tail.children.push(child.clone());
        } else {
            let (l, r) = split_sequence(child, at);
            head.children.push(l);
            tail.children.push(r);
        }
    }
    (head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResolverOptions;

    fn resolve(text: &str) -> ResolvedLevels {
        crate::resolve_str(text, &ResolverOptions::new().with_test_mode(true)).unwrap()
    }

    #[test]
    fn test_split_out_of_range() {
        let levels = resolve("abc");
        assert!(matches!(
            levels.split(4),
            Err(BidiError::InvalidPosition { position: 4, .. })
        ));
    }

    #[test]
    fn test_split_halves_cover_input() {
        let levels = resolve("car means CAR.");
        let (left, right) = levels.split(11).unwrap();
        assert_eq!((left.start(), left.end()), (0, 11));
        assert_eq!((right.start(), right.end()), (11, 14));
        assert_eq!(left.scraps().last().unwrap().right, 11);
        assert_eq!(right.scraps()[0].left, 11);
        assert_eq!(right.scraps().last().unwrap().class, BidiClass::PDI);
    }

    #[test]
    fn test_split_isolate_keeps_direction() {
        let levels = resolve("<car MEANS CAR.=");
        let (_, right) = levels.split(8).unwrap();
        let isolate = right.scraps().iter().find(|s| s.has_children()).unwrap();
        let child = &isolate.children[0];
        assert_eq!(child[0].class, BidiClass::RLI);
        assert!(child[0].is_empty());
        assert_eq!(
            Scrap::sequence_direction(child),
            Some(Direction::RightToLeft)
        );
    }
}
