use super::structure::Document;
use super::{Affinity, CursorPointer, Selection, TagEditor, TextPosition};

/// Turns a paragraph-relative offset into a run-relative pointer in the
/// current tree. Out-of-range positions land on the nearest valid one.
pub fn resolve(document: &Document, position: TextPosition, affinity: Affinity) -> CursorPointer {
    let Some(last) = document.paragraphs.len().checked_sub(1) else {
        return CursorPointer::default();
    };
    let paragraph_idx = position.paragraph.min(last);
    let paragraph = &document.paragraphs[paragraph_idx];
    match paragraph.locate(position.offset, affinity) {
        Some(found) => CursorPointer::new(paragraph_idx, found.run, found.offset),
        None => CursorPointer::new(paragraph_idx, 0, 0),
    }
}

impl Document {
    /// Paragraph-relative form of `pointer`, clamped to the document.
    pub fn text_position(&self, pointer: &CursorPointer) -> TextPosition {
        let Some(last) = self.paragraphs.len().checked_sub(1) else {
            return TextPosition::default();
        };
        if pointer.paragraph > last {
            tracing::debug!(
                target: "tagtext::cursor",
                paragraph = pointer.paragraph,
                last,
                "clamped pointer past the last paragraph"
            );
            return TextPosition::new(last, self.paragraphs[last].char_len());
        }

        let paragraph = &self.paragraphs[pointer.paragraph];
        let Some((start, end)) = paragraph.run_span(pointer.run) else {
            if !paragraph.runs.is_empty() || pointer.run > 0 || pointer.offset > 0 {
                tracing::debug!(
                    target: "tagtext::cursor",
                    paragraph = pointer.paragraph,
                    run = pointer.run,
                    "clamped pointer to the paragraph end"
                );
            }
            return TextPosition::new(pointer.paragraph, paragraph.char_len());
        };
        TextPosition::new(pointer.paragraph, (start + pointer.offset).min(end))
    }

    pub fn end_position(&self) -> TextPosition {
        match self.paragraphs.last() {
            Some(paragraph) => TextPosition::new(self.paragraphs.len() - 1, paragraph.char_len()),
            None => TextPosition::default(),
        }
    }

    /// Text between two positions, paragraphs joined by `\n`.
    pub fn text_between(&self, start: TextPosition, end: TextPosition) -> String {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let mut out = String::new();
        for index in start.paragraph..=end.paragraph {
            let Some(paragraph) = self.paragraphs.get(index) else {
                break;
            };
            let from = if index == start.paragraph { start.offset } else { 0 };
            let to = if index == end.paragraph {
                end.offset
            } else {
                paragraph.char_len()
            };
            if index > start.paragraph {
                out.push('\n');
            }
            out.push_str(&paragraph.slice(from, to));
        }
        out
    }
}

impl TagEditor {
    pub fn cursor_pointer(&self) -> CursorPointer {
        self.selection.head
    }

    pub fn cursor_position(&self) -> TextPosition {
        self.document.text_position(&self.selection.head)
    }

    pub fn selection_range(&self) -> (TextPosition, TextPosition) {
        let anchor = self.document.text_position(&self.selection.anchor);
        let head = self.document.text_position(&self.selection.head);
        if anchor <= head {
            (anchor, head)
        } else {
            (head, anchor)
        }
    }

    pub fn selected_text(&self) -> String {
        let (start, end) = self.selection_range();
        self.document.text_between(start, end)
    }

    pub fn select(&mut self, selection: Selection) {
        let anchor = self.document.text_position(&selection.anchor);
        let head = self.document.text_position(&selection.head);
        self.selection = Selection::new(
            resolve(&self.document, anchor, Affinity::Before),
            resolve(&self.document, head, Affinity::Before),
        );
    }

    pub fn set_cursor(&mut self, position: TextPosition) {
        let pointer = resolve(&self.document, position, Affinity::Before);
        self.selection = Selection::collapsed(pointer);
    }

    pub fn select_all(&mut self) {
        let end = self.document.end_position();
        self.selection = Selection::new(
            resolve(&self.document, TextPosition::default(), Affinity::Before),
            resolve(&self.document, end, Affinity::Before),
        );
    }

    pub fn move_left(&mut self, extend: bool) -> bool {
        let (start, _) = self.selection_range();
        if !extend && !self.selection.is_collapsed() {
            self.set_cursor(start);
            return true;
        }
        let head = self.cursor_position();
        let target = if head.offset > 0 {
            TextPosition::new(head.paragraph, head.offset - 1)
        } else if head.paragraph > 0 {
            let previous = head.paragraph - 1;
            TextPosition::new(previous, self.paragraph_len(previous))
        } else {
            return false;
        };
        self.move_head(target, extend);
        true
    }

    pub fn move_right(&mut self, extend: bool) -> bool {
        let (_, end) = self.selection_range();
        if !extend && !self.selection.is_collapsed() {
            self.set_cursor(end);
            return true;
        }
        let head = self.cursor_position();
        let target = if head.offset < self.paragraph_len(head.paragraph) {
            TextPosition::new(head.paragraph, head.offset + 1)
        } else if head.paragraph + 1 < self.document.paragraphs.len() {
            TextPosition::new(head.paragraph + 1, 0)
        } else {
            return false;
        };
        self.move_head(target, extend);
        true
    }

    pub fn move_up(&mut self, extend: bool) -> bool {
        let head = self.cursor_position();
        if head.paragraph == 0 {
            return false;
        }
        let previous = head.paragraph - 1;
        let offset = head.offset.min(self.paragraph_len(previous));
        self.move_head(TextPosition::new(previous, offset), extend);
        true
    }

    pub fn move_down(&mut self, extend: bool) -> bool {
        let head = self.cursor_position();
        let next = head.paragraph + 1;
        if next >= self.document.paragraphs.len() {
            return false;
        }
        let offset = head.offset.min(self.paragraph_len(next));
        self.move_head(TextPosition::new(next, offset), extend);
        true
    }

    pub fn move_to_paragraph_start(&mut self, extend: bool) -> bool {
        let head = self.cursor_position();
        self.move_head(TextPosition::new(head.paragraph, 0), extend);
        true
    }

    pub fn move_to_paragraph_end(&mut self, extend: bool) -> bool {
        let head = self.cursor_position();
        let len = self.paragraph_len(head.paragraph);
        self.move_head(TextPosition::new(head.paragraph, len), extend);
        true
    }

    fn move_head(&mut self, target: TextPosition, extend: bool) {
        let pointer = resolve(&self.document, target, Affinity::Before);
        if extend {
            self.selection.head = pointer;
        } else {
            self.selection = Selection::collapsed(pointer);
        }
    }

    fn paragraph_len(&self, index: usize) -> usize {
        self.document
            .paragraphs
            .get(index)
            .map_or(0, |paragraph| paragraph.char_len())
    }
}
