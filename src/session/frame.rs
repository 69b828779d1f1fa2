//! Drill-down history.

use super::anchor::{CoarseAnchor, MediumAnchor};
use crate::report::{ChartPoint, Level};

/// Snapshot of a view taken just before drilling into it.
///
/// Restored verbatim by `back`, so no request is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillFrame {
    pub level: Level,
    pub records: Vec<ChartPoint>,
    pub coarse_anchor: Option<CoarseAnchor>,
    pub medium_anchor: Option<MediumAnchor>,
}

/// LIFO stack of [`DrillFrame`]s.
#[derive(Debug, Clone, Default)]
pub struct DrillStack {
    frames: Vec<DrillFrame>,
}

impl DrillStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: DrillFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DrillFrame> {
        self.frames.pop()
    }

    pub fn peek(&self) -> Option<&DrillFrame> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
