//! Out-of-line isolate markup
//!
//! Callers whose isolates come from document structure rather than control
//! characters in the text attach them here. Controls are injected as
//! zero-width scraps before the code point starting at a byte position.

use std::collections::BTreeMap;

use crate::types::BidiClass;

/// An isolate control injected without occupying text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IsolateControl {
    /// LRI
    LeftToRight,
    /// RLI
    RightToLeft,
    /// FSI
    FirstStrong,
    /// PDI
    Pop,
}

impl IsolateControl {
    #[inline]
    pub const fn class(self) -> BidiClass {
        match self {
            IsolateControl::LeftToRight => BidiClass::LRI,
            IsolateControl::RightToLeft => BidiClass::RLI,
            IsolateControl::FirstStrong => BidiClass::FSI,
            IsolateControl::Pop => BidiClass::PDI,
        }
    }
}

/// Source of isolate controls keyed by byte position
pub trait OutOfLineMarkup {
    /// Controls to inject before the code point at `position`, in order
    fn controls_at(&self, position: usize) -> &[IsolateControl];
}

/// Ordered map of byte positions to controls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupMap {
    controls: BTreeMap<usize, Vec<IsolateControl>>,
}

impl MarkupMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a control at `position`
    pub fn insert(&mut self, position: usize, control: IsolateControl) -> &mut Self {
        self.controls.entry(position).or_default().push(control);
        self
    }

    /// Wrap `[left, right)` in an isolate opened by `opener`
    pub fn isolate(&mut self, left: usize, right: usize, opener: IsolateControl) -> &mut Self {
        self.insert(left, opener);
        self.insert(right, IsolateControl::Pop)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Positions carrying controls, ascending
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.controls.keys().copied()
    }
}

impl OutOfLineMarkup for MarkupMap {
    fn controls_at(&self, position: usize) -> &[IsolateControl] {
        self.controls
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
