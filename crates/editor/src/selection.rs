//! Selection Management
//!
//! Selection ranges over the rich text tree, and the tracker that keeps the
//! user's range alive while focus wanders off to dialogs and pickers.

use prodoc_core::tree::Position;
use tracing::debug;

use crate::surface::EditingSurface;

/// A selection range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection started
    pub anchor: Position,
    /// Where the selection ends (the caret)
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// Collapsed selection at a position
    pub fn caret(pos: Position) -> Self {
        Self {
            anchor: pos.clone(),
            focus: pos,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Start and end in document order
    pub fn normalized(&self) -> (Position, Position) {
        if self.anchor <= self.focus {
            (self.anchor.clone(), self.focus.clone())
        } else {
            (self.focus.clone(), self.anchor.clone())
        }
    }

    pub fn min(&self) -> Position {
        self.normalized().0
    }

    pub fn max(&self) -> Position {
        self.normalized().1
    }

    pub fn contains(&self, pos: &Position) -> bool {
        let (start, end) = self.normalized();
        &start <= pos && pos <= &end
    }
}

/// Remembers the last user range across focus changes
#[derive(Debug, Default)]
pub struct SelectionTracker {
    mark: Option<Selection>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the surface's current range, or nothing if it has none
    pub fn capture(&mut self, surface: &impl EditingSurface) {
        self.mark = surface.selection();
        debug!("Captured selection: {:?}", self.mark);
    }

    /// Focus the surface and reinstate the remembered range.
    ///
    /// Without a remembered range the caret collapses at the document end.
    /// A range made stale by content changes is clamped to a valid spot.
    pub fn restore(&self, surface: &mut impl EditingSurface) {
        surface.focus();
        let selection = match &self.mark {
            Some(mark) => {
                let content = surface.content();
                Selection::new(content.clamp(&mark.anchor), content.clamp(&mark.focus))
            }
            None => Selection::caret(surface.content().end_position()),
        };
        surface.select(selection);
    }

    pub fn clear(&mut self) {
        self.mark = None;
    }

    pub fn mark(&self) -> Option<&Selection> {
        self.mark.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RichSurface;
    use prodoc_core::tree::{Block, Inline, RichTree};

    fn surface() -> RichSurface {
        RichSurface::new(RichTree::from_blocks(vec![
            Block::paragraph(vec![Inline::text("first")]),
            Block::paragraph(vec![Inline::text("second")]),
        ]))
    }

    #[test]
    fn test_normalized_orders_endpoints() {
        let sel = Selection::new(Position::new(vec![1], 2), Position::new(vec![0], 4));
        let (start, end) = sel.normalized();
        assert_eq!(start, Position::new(vec![0], 4));
        assert_eq!(end, Position::new(vec![1], 2));
        assert!(sel.contains(&Position::new(vec![0], 5)));
        assert!(!sel.is_collapsed());
    }

    #[test]
    fn test_capture_then_restore_after_blur() {
        let mut surface = surface();
        let range = Selection::new(Position::new(vec![0], 1), Position::new(vec![0], 3));
        surface.focus();
        surface.select(range.clone());

        let mut tracker = SelectionTracker::new();
        tracker.capture(&surface);
        surface.blur();
        assert!(surface.selection().is_none());

        tracker.restore(&mut surface);
        assert!(surface.has_focus());
        assert_eq!(surface.selection(), Some(range));
    }

    #[test]
    fn test_restore_without_mark_collapses_at_end() {
        let mut surface = surface();
        let tracker = SelectionTracker::new();
        tracker.restore(&mut surface);
        assert_eq!(
            surface.selection(),
            Some(Selection::caret(Position::new(vec![1], 6)))
        );
    }

    #[test]
    fn test_restore_clamps_stale_mark() {
        let mut surface = surface();
        surface.focus();
        surface.select(Selection::caret(Position::new(vec![1], 4)));

        let mut tracker = SelectionTracker::new();
        tracker.capture(&surface);
        surface.set_content(RichTree::from_blocks(vec![Block::paragraph(vec![
            Inline::text("only"),
        ])]));

        tracker.restore(&mut surface);
        assert_eq!(
            surface.selection(),
            Some(Selection::caret(Position::new(vec![0], 4)))
        );
    }

    #[test]
    fn test_clear_forgets_mark() {
        let mut surface = surface();
        surface.focus();
        let mut tracker = SelectionTracker::new();
        tracker.capture(&surface);
        assert!(tracker.mark().is_some());
        tracker.clear();
        assert!(tracker.mark().is_none());
    }
}
