use super::{CursorPointer, Selection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Canonical edit requests understood by the engine.
///
/// Hosts translate their own key and clipboard events into these before
/// calling [`TagEditor::apply`](super::TagEditor::apply). Positions use the
/// engine's (paragraph, run, offset) coordinates and are clamped on entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditIntent {
    /// Type one character, replacing the selected content.
    InsertChar { at: Selection, ch: char },

    /// Remove the single character next to a caret (Backspace / Delete).
    DeleteCollapsed {
        at: CursorPointer,
        direction: Direction,
    },

    /// Remove everything between two positions, in either order.
    DeleteRange {
        start: CursorPointer,
        end: CursorPointer,
    },

    /// Break the paragraph at the caret (Enter), replacing the selection.
    SplitParagraph { at: Selection },

    /// Insert text delivered by the host clipboard, replacing the selection.
    Paste { at: Selection, text: String },
}

impl EditIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertChar { .. } => "insert_char",
            Self::DeleteCollapsed {
                direction: Direction::Backward,
                ..
            } => "delete_backward",
            Self::DeleteCollapsed {
                direction: Direction::Forward,
                ..
            } => "delete_forward",
            Self::DeleteRange { .. } => "delete_range",
            Self::SplitParagraph { .. } => "split_paragraph",
            Self::Paste { .. } => "paste",
        }
    }
}
