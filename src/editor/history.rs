// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Linear undo/redo history over annotation snapshots.
//!
//! The history is a list of immutable snapshots plus a cursor. The
//! snapshot under the cursor is the current annotation set; appending
//! discards everything after the cursor.

use crate::models::annotation::Annotation;
use std::sync::Arc;

/// An immutable copy of the full annotation set.
pub type Snapshot = Arc<[Annotation]>;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    /// Maximum number of snapshots kept (0 = unbounded)
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create a history holding a single empty snapshot.
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            snapshots: vec![Arc::from(Vec::new())],
            cursor: 0,
            limit,
        }
    }

    /// Record a new current set, dropping any redo branch.
    pub fn append(&mut self, annotations: &[Annotation]) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(Arc::from(annotations.to_vec()));
        if self.limit > 0 && self.snapshots.len() > self.limit {
            let excess = self.snapshots.len() - self.limit;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
        log::debug!(
            "History: appended snapshot {} ({} annotations)",
            self.cursor,
            annotations.len()
        );
    }

    /// Step back one snapshot. Returns false when already at the oldest.
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        log::debug!("History: undo to snapshot {}", self.cursor);
        true
    }

    /// Step forward one snapshot. Returns false when already at the newest.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 >= self.snapshots.len() {
            return false;
        }
        self.cursor += 1;
        log::debug!("History: redo to snapshot {}", self.cursor);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The current annotation set.
    pub fn current(&self) -> &[Annotation] {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Drop all history and start over from `base`.
    pub fn reset(&mut self, base: &[Annotation]) {
        self.snapshots = vec![Arc::from(base.to_vec())];
        self.cursor = 0;
        log::debug!("History: reset with {} annotations", base.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Point, Shape};

    fn point_at(x: f64) -> Annotation {
        Annotation::new(Point::new(x, 0.0), Shape::Point)
    }

    #[test]
    fn test_append_moves_cursor() {
        let mut history = History::new();
        assert!(history.current().is_empty());

        history.append(&[point_at(1.0)]);
        assert_eq!(history.cursor(), 1);
        assert_eq!(history.current().len(), 1);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_redo_are_clamped() {
        let mut history = History::new();
        assert!(!history.undo());
        history.append(&[point_at(1.0)]);
        assert!(!history.redo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(history.cursor(), 0);
        assert!(history.redo());
        assert_eq!(history.cursor(), 1);
    }

    #[test]
    fn test_append_truncates_redo_branch() {
        let mut history = History::new();
        let a = point_at(1.0);
        let b = point_at(2.0);
        let c = point_at(3.0);
        history.append(&[a.clone()]);
        history.append(&[a.clone(), b]);
        history.undo();
        history.append(&[a.clone(), c.clone()]);

        assert_eq!(history.len(), 3);
        assert!(!history.can_redo());
        assert_eq!(history.current(), &[a, c][..]);
    }

    #[test]
    fn test_undo_then_redo_restores_identical_sets() {
        let mut history = History::new();
        let mut set = Vec::new();
        let mut recorded = vec![Vec::new()];
        for i in 0..6 {
            set.push(point_at(i as f64));
            history.append(&set);
            recorded.push(set.clone());
        }

        for k in 1..=6 {
            for _ in 0..k {
                history.undo();
            }
            assert_eq!(history.current(), &recorded[6 - k][..]);
            for _ in 0..k {
                history.redo();
            }
            assert_eq!(history.current(), &recorded[6][..]);
        }
    }

    #[test]
    fn test_snapshots_are_copies() {
        let mut history = History::new();
        let mut set = vec![point_at(1.0)];
        history.append(&set);
        set[0].position.x = 99.0;
        assert_eq!(history.current()[0].position.x, 1.0);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(3);
        for i in 0..5 {
            history.append(&[point_at(i as f64)]);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current()[0].position.x, 4.0);
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(history.current()[0].position.x, 2.0);
    }

    #[test]
    fn test_reset() {
        let mut history = History::new();
        history.append(&[point_at(1.0)]);
        history.reset(&[point_at(7.0), point_at(8.0)]);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().len(), 2);
        assert!(!history.can_undo());
    }
}
