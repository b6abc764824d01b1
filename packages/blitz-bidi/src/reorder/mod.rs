//! Visual reordering of resolved scraps (I1, I2, L2)
//!
//! The scrap tree is flattened into level segments in logical order, the
//! segments are reversed level by level, and what remains is read off as
//! runs in visual order.

use crate::scrap::Scrap;
use crate::types::{BidiClass, Direction};

/// A contiguous piece of input displayed in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Run {
    pub direction: Direction,
    pub left: usize,
    pub right: usize,
}

impl Run {
    #[inline]
    pub fn len(&self) -> usize {
        self.right - self.left
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right == self.left
    }

    /// Append the run's text to `out`, reversed for RTL runs
    ///
    /// Runs that do not fall on character boundaries of `text` are skipped.
    pub fn apply(&self, text: &str, out: &mut String) {
        let Some(slice) = text.get(self.left..self.right) else {
            log::debug!(
                "run {}..{} does not fit text of {} bytes",
                self.left,
                self.right,
                text.len()
            );
            return;
        };
        match self.direction {
            Direction::LeftToRight => out.push_str(slice),
            Direction::RightToLeft => out.extend(slice.chars().rev()),
        }
    }
}

/// Runs of a paragraph in visual order
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ordering {
    pub runs: Vec<Run>,
}

impl Ordering {
    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// The display string for `text`
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for run in &self.runs {
            run.apply(text, &mut out);
        }
        out
    }
}

/// Level-tagged interval of the flattened tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    left: usize,
    right: usize,
    level: u8,
}

/// Reorder a resolved top-level sequence
pub(crate) fn reorder(scraps: &[Scrap], direction: Direction) -> Ordering {
    let base = match direction {
        Direction::LeftToRight => 0,
        Direction::RightToLeft => 1,
    };
    let mut segments = Vec::new();
    flatten(scraps, base, &mut segments);
    reverse_levels(&mut segments);

    let mut runs: Vec<Run> = Vec::with_capacity(segments.len());
    for segment in segments {
        let run = Run {
            direction: Direction::from_level(segment.level),
            left: segment.left,
            right: segment.right,
        };
        if let Some(last) = runs.last_mut() {
            if last.direction == run.direction {
                match run.direction {
                    Direction::LeftToRight if last.right == run.left => {
                        last.right = run.right;
                        continue;
                    }
                    Direction::RightToLeft if run.right == last.left => {
                        last.left = run.left;
                        continue;
                    }
                    _ => {}
                }
            }
        }
        runs.push(run);
    }
    Ordering { runs }
}

/// I1/I2; neutrals and boundaries take the sequence level
fn scrap_level(class: BidiClass, level: u8) -> u8 {
    match (Direction::from_level(level), class) {
        (Direction::LeftToRight, BidiClass::R) => level + 1,
        (Direction::LeftToRight, BidiClass::EN | BidiClass::AN) => level + 2,
        (Direction::RightToLeft, BidiClass::L | BidiClass::EN | BidiClass::AN) => level + 1,
        _ => level,
    }
}

/// Least level above `level` with the parity of `direction`
fn isolate_level(level: u8, direction: Direction) -> u8 {
    match direction {
        Direction::LeftToRight => (level + 2) & !1,
        Direction::RightToLeft => (level + 1) | 1,
    }
}

fn flatten(sequence: &[Scrap], level: u8, out: &mut Vec<Segment>) {
    for scrap in sequence {
        let own = scrap_level(scrap.class, level);
        let mut cursor = scrap.left;
        for child in &scrap.children {
            let (Some(first), Some(last)) = (child.first(), child.last()) else {
                continue;
            };
            push_segment(out, cursor, first.left, own);
            let direction = Scrap::sequence_direction(child).unwrap_or_default();
            flatten(child, isolate_level(level, direction), out);
            cursor = last.right;
        }
        push_segment(out, cursor, scrap.right, own);
    }
}

fn push_segment(out: &mut Vec<Segment>, left: usize, right: usize, level: u8) {
    if right <= left {
        return;
    }
    if let Some(last) = out.last_mut() {
        if last.level == level && last.right == left {
            last.right = right;
            return;
        }
    }
    out.push(Segment { left, right, level });
}

/// L2: reverse every maximal run at or above each level down to the lowest odd one
fn reverse_levels(segments: &mut [Segment]) {
    let Some(highest) = segments.iter().map(|s| s.level).max() else {
        return;
    };
    let Some(lowest_odd) = segments
        .iter()
        .map(|s| s.level | 1)
        .min()
    else {
        return;
    };

    let mut level = highest;
    while level >= lowest_odd {
        let mut i = 0;
        while i < segments.len() {
            if segments[i].level < level {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < segments.len() && segments[i].level >= level {
                i += 1;
            }
            segments[run_start..i].reverse();
        }
        level -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrap::DirectionalContext;

    fn scrap(class: BidiClass, left: usize, right: usize) -> Scrap {
        Scrap::new(class, left, right, DirectionalContext::default())
    }

    fn spans(ordering: &Ordering) -> Vec<(Direction, usize, usize)> {
        ordering
            .runs
            .iter()
            .map(|r| (r.direction, r.left, r.right))
            .collect()
    }

    #[test]
    fn test_isolate_levels() {
        assert_eq!(isolate_level(0, Direction::RightToLeft), 1);
        assert_eq!(isolate_level(0, Direction::LeftToRight), 2);
        assert_eq!(isolate_level(1, Direction::LeftToRight), 2);
        assert_eq!(isolate_level(1, Direction::RightToLeft), 3);
    }

    #[test]
    fn test_numbers_inside_rtl_keep_order() {
        // R EN R in an RTL paragraph: levels 1 2 1
        let scraps = vec![
            scrap(BidiClass::R, 0, 2),
            scrap(BidiClass::EN, 2, 4),
            scrap(BidiClass::R, 4, 6),
        ];
        let ordering = reorder(&scraps, Direction::RightToLeft);
        assert_eq!(
            spans(&ordering),
            vec![
                (Direction::RightToLeft, 4, 6),
                (Direction::LeftToRight, 2, 4),
                (Direction::RightToLeft, 0, 2),
            ]
        );
        assert_eq!(ordering.apply("ab12cd"), "dc12ba");
    }

    #[test]
    fn test_contiguous_rtl_segments_coalesce() {
        // An RTL isolate (level 3) right after R text (level 1) reads as one run.
        let mut initiator = scrap(BidiClass::RLI, 2, 3);
        initiator.context.embedding_direction = Some(Direction::RightToLeft);
        let mut isolate = scrap(BidiClass::NI, 2, 6);
        isolate.children.push(vec![
            initiator,
            scrap(BidiClass::R, 3, 5),
            scrap(BidiClass::PDI, 5, 6),
        ]);
        let scraps = vec![scrap(BidiClass::R, 0, 2), isolate];

        let ordering = reorder(&scraps, Direction::RightToLeft);
        assert_eq!(spans(&ordering), vec![(Direction::RightToLeft, 0, 6)]);
    }

    #[test]
    fn test_serde_round_trip() {
        let ordering = Ordering {
            runs: vec![Run {
                direction: Direction::RightToLeft,
                left: 0,
                right: 3,
            }],
        };
        let json = serde_json::to_string(&ordering).unwrap();
        let back: Ordering = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ordering);
    }
}
