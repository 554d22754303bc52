
mod classify;
mod content;
mod cursor;
mod inspect;
mod intent;
mod structure;

pub use classify::{
    TagKind, TagMatch, TagPatterns, WordSpan, expand_to_words, first_non_word_index,
    is_word_char, last_non_word_index, word_boundaries, words,
};
pub use content::{
    FormatError, FormattedWord, InsertBias, UnformattedRun, format_word, format_words_in_range,
    insert_text_at, join_run_text_across_boundary, remove_range, split_runs, unformat_run,
};
pub use cursor::resolve;
pub use inspect::{dump_document, dump_paragraph};
pub use intent::{Direction, EditIntent};
pub use structure::{Document, Paragraph, Run, RunPosition, RunStyle, SiblingRuns, TagRef};

use classify::{char_slice, words_touching};

/// Run-relative caret location. For a placeholder paragraph `run` and
/// `offset` are both zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CursorPointer {
    pub paragraph: usize,
    pub run: usize,
    pub offset: usize,
}

impl CursorPointer {
    pub fn new(paragraph: usize, run: usize, offset: usize) -> Self {
        Self {
            paragraph,
            run,
            offset,
        }
    }
}

/// Paragraph-relative caret location. Formatting never moves text, so this
/// survives any run split or merge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    pub paragraph: usize,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(paragraph: usize, offset: usize) -> Self {
        Self { paragraph, offset }
    }
}

/// Which run owns an offset sitting exactly on a run boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Affinity {
    /// The run ending at the offset, so typing keeps extending it.
    #[default]
    Before,
    /// The run starting at the offset.
    After,
}

/// Anchor is where the selection started, head is where the caret is now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: CursorPointer,
    pub head: CursorPointer,
}

impl Selection {
    pub fn new(anchor: CursorPointer, head: CursorPointer) -> Self {
        Self { anchor, head }
    }

    pub fn collapsed(pointer: CursorPointer) -> Self {
        Self {
            anchor: pointer,
            head: pointer,
        }
    }

    pub fn start(&self) -> CursorPointer {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> CursorPointer {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }
}

/// Where the caret goes and which stretch of text `[start, end]` an edit
/// changed, both in post-edit positions.
struct EditOutcome {
    caret: TextPosition,
    start: TextPosition,
    end: TextPosition,
}

impl EditOutcome {
    fn at(caret: TextPosition) -> Self {
        Self::spanning(caret, caret, caret)
    }

    fn spanning(caret: TextPosition, start: TextPosition, end: TextPosition) -> Self {
        Self { caret, start, end }
    }
}

/// Owns a document and keeps its tag formatting consistent with the text
/// across every edit.
#[derive(Clone, Debug, Default)]
pub struct TagEditor {
    document: Document,
    selection: Selection,
    patterns: TagPatterns,
}

impl TagEditor {
    pub fn new(document: Document) -> Self {
        Self::with_patterns(document, TagPatterns::default())
    }

    pub fn with_patterns(document: Document, patterns: TagPatterns) -> Self {
        let mut editor = Self {
            document,
            selection: Selection::default(),
            patterns,
        };
        editor.reformat_all();
        editor
    }

    /// Editor holding `text` as if it had been pasted into an empty document.
    pub fn with_text(text: &str, patterns: TagPatterns) -> Self {
        let mut editor = Self::with_patterns(Document::new(), patterns);
        if !text.is_empty() {
            editor.paste(text);
        }
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn patterns(&self) -> TagPatterns {
        self.patterns
    }

    pub fn set_patterns(&mut self, patterns: TagPatterns) {
        self.patterns = patterns;
        self.reformat_all();
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty_state()
    }

    pub fn apply(&mut self, intent: EditIntent) -> Selection {
        tracing::debug!(target: "tagtext::engine", intent = intent.name(), "applying edit intent");
        let outcome = match intent {
            EditIntent::InsertChar { at, ch } => self.apply_insert_char(at, ch),
            EditIntent::DeleteCollapsed { at, direction } => {
                self.apply_delete_collapsed(at, direction)
            }
            EditIntent::DeleteRange { start, end } => self.apply_delete_range(start, end),
            EditIntent::SplitParagraph { at } => self.apply_split_paragraph(at),
            EditIntent::Paste { at, text } => self.apply_paste(at, &text),
        };
        self.finish(outcome)
    }

    pub fn insert_char(&mut self, ch: char) -> Selection {
        self.apply(EditIntent::InsertChar {
            at: self.selection,
            ch,
        })
    }

    pub fn insert_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.insert_paragraph_break();
            } else {
                self.insert_char(ch);
            }
        }
    }

    pub fn backspace(&mut self) -> Selection {
        self.delete_towards(Direction::Backward)
    }

    pub fn delete(&mut self) -> Selection {
        self.delete_towards(Direction::Forward)
    }

    fn delete_towards(&mut self, direction: Direction) -> Selection {
        let intent = if self.selection.is_collapsed() {
            EditIntent::DeleteCollapsed {
                at: self.selection.head,
                direction,
            }
        } else {
            EditIntent::DeleteRange {
                start: self.selection.anchor,
                end: self.selection.head,
            }
        };
        self.apply(intent)
    }

    pub fn insert_paragraph_break(&mut self) -> Selection {
        self.apply(EditIntent::SplitParagraph { at: self.selection })
    }

    pub fn paste(&mut self, text: &str) -> Selection {
        self.apply(EditIntent::Paste {
            at: self.selection,
            text: text.to_string(),
        })
    }

    /// Removes the selection and returns its text.
    pub fn cut(&mut self) -> String {
        let text = self.selected_text();
        if !self.selection.is_collapsed() {
            self.apply(EditIntent::DeleteRange {
                start: self.selection.anchor,
                end: self.selection.head,
            });
        }
        text
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    fn apply_insert_char(&mut self, at: Selection, ch: char) -> EditOutcome {
        let (start, end) = self.ordered(&at);
        let mut at = self.delete_between(start, end);
        if self.document.is_empty_state() {
            self.document.paragraphs.push(Paragraph::placeholder());
            at = TextPosition::default();
        }

        let boundary = !is_word_char(ch);
        let bias = if boundary {
            InsertBias::Boundary
        } else {
            InsertBias::Word
        };
        let mut buf = [0u8; 4];
        let paragraph = &mut self.document.paragraphs[at.paragraph];
        let inserted = insert_text_at(paragraph, at.offset, ch.encode_utf8(&mut buf), bias);

        if boundary && paragraph.runs[inserted.run].is_tagged() {
            // A boundary typed inside a tag cuts the tag right before it.
            let cut_at = inserted.offset - 1;
            if let Err(err) = unformat_run(paragraph, inserted.run, cut_at, inserted.offset) {
                report(err);
            }
        }

        self.retag_words(at.paragraph, at.offset, at.offset + 1);
        let caret = TextPosition::new(at.paragraph, at.offset + 1);
        EditOutcome::spanning(caret, at, caret)
    }

    fn apply_delete_collapsed(&mut self, at: CursorPointer, direction: Direction) -> EditOutcome {
        let pos = self.document.text_position(&at);
        if self.document.is_empty_state() {
            return EditOutcome::at(pos);
        }
        let len = self.document.paragraphs[pos.paragraph].char_len();

        let caret = match direction {
            Direction::Backward if pos.offset > 0 => {
                let paragraph = &mut self.document.paragraphs[pos.paragraph];
                remove_range(paragraph, pos.offset - 1, pos.offset);
                TextPosition::new(pos.paragraph, pos.offset - 1)
            }
            Direction::Backward if pos.paragraph > 0 => self.merge_with_next(pos.paragraph - 1),
            Direction::Forward if pos.offset < len => {
                let paragraph = &mut self.document.paragraphs[pos.paragraph];
                remove_range(paragraph, pos.offset, pos.offset + 1);
                pos
            }
            Direction::Forward if pos.paragraph + 1 < self.document.paragraphs.len() => {
                self.merge_with_next(pos.paragraph)
            }
            _ => return EditOutcome::at(pos),
        };

        self.rejoin_at(caret, true);
        self.retag_words(caret.paragraph, caret.offset, caret.offset);
        EditOutcome::at(caret)
    }

    fn apply_delete_range(&mut self, start: CursorPointer, end: CursorPointer) -> EditOutcome {
        let start = self.document.text_position(&start);
        let end = self.document.text_position(&end);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        EditOutcome::at(self.delete_between(start, end))
    }

    fn apply_split_paragraph(&mut self, at: Selection) -> EditOutcome {
        let (start, end) = self.ordered(&at);
        let at = self.delete_between(start, end);
        if self.document.is_empty_state() {
            self.document.paragraphs = vec![Paragraph::placeholder(), Paragraph::placeholder()];
            let caret = TextPosition::new(1, 0);
            return EditOutcome::spanning(caret, TextPosition::default(), caret);
        }

        let index = at.paragraph;
        let tail = split_runs(&mut self.document.paragraphs[index], at.offset);
        self.document
            .paragraphs
            .insert(index + 1, Paragraph { runs: tail });

        let left_len = self.document.paragraphs[index].char_len();
        self.retag_words(index, left_len, left_len);
        self.retag_words(index + 1, 0, 0);
        let caret = TextPosition::new(index + 1, 0);
        EditOutcome::spanning(caret, TextPosition::new(index, left_len), caret)
    }

    fn apply_paste(&mut self, at: Selection, text: &str) -> EditOutcome {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let (start, end) = self.ordered(&at);
        let at = self.delete_between(start, end);
        if text.is_empty() {
            return EditOutcome::at(at);
        }
        let at = if self.document.is_empty_state() {
            self.document.paragraphs.push(Paragraph::placeholder());
            TextPosition::default()
        } else {
            at
        };

        let mut caret = at;
        for (line_idx, line) in text.split('\n').enumerate() {
            if line_idx > 0 {
                let tail = split_runs(&mut self.document.paragraphs[caret.paragraph], caret.offset);
                self.document
                    .paragraphs
                    .insert(caret.paragraph + 1, Paragraph { runs: tail });
                caret = TextPosition::new(caret.paragraph + 1, 0);
            }
            let Some(first) = line.chars().next() else {
                continue;
            };
            let bias = if is_word_char(first) {
                InsertBias::Word
            } else {
                InsertBias::Boundary
            };
            let paragraph = &mut self.document.paragraphs[caret.paragraph];
            insert_text_at(paragraph, caret.offset, line, bias);
            caret.offset += line.chars().count();
        }

        let patterns = self.patterns;
        for index in at.paragraph..=caret.paragraph {
            let paragraph = &mut self.document.paragraphs[index];
            let from = if index == at.paragraph { at.offset } else { 0 };
            let to = if index == caret.paragraph {
                caret.offset
            } else {
                paragraph.char_len()
            };
            format_words_in_range(paragraph, from, to, &patterns);
        }
        EditOutcome::spanning(caret, at, caret)
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    fn ordered(&self, selection: &Selection) -> (TextPosition, TextPosition) {
        let anchor = self.document.text_position(&selection.anchor);
        let head = self.document.text_position(&selection.head);
        if anchor <= head {
            (anchor, head)
        } else {
            (head, anchor)
        }
    }

    /// Deletes `[start, end)` and reunites the word around the seam.
    fn delete_between(&mut self, start: TextPosition, end: TextPosition) -> TextPosition {
        if start == end || self.document.is_empty_state() {
            return start;
        }
        if start == TextPosition::default() && end == self.document.end_position() {
            tracing::debug!(target: "tagtext::engine", "selection covers the document; clearing");
            self.document.clear();
            return TextPosition::default();
        }

        if start.paragraph == end.paragraph {
            remove_range(
                &mut self.document.paragraphs[start.paragraph],
                start.offset,
                end.offset,
            );
        } else {
            let tail = split_runs(&mut self.document.paragraphs[end.paragraph], end.offset);
            split_runs(&mut self.document.paragraphs[start.paragraph], start.offset);
            self.document
                .paragraphs
                .drain(start.paragraph + 1..=end.paragraph);
            self.document.paragraphs[start.paragraph].runs.extend(tail);
        }

        self.rejoin_at(start, false);
        self.retag_words(start.paragraph, start.offset, start.offset);
        start
    }

    /// Appends paragraph `index + 1` to paragraph `index`; returns the seam.
    fn merge_with_next(&mut self, index: usize) -> TextPosition {
        let seam = TextPosition::new(index, self.document.paragraphs[index].char_len());
        let next = self.document.paragraphs.remove(index + 1);
        self.document.paragraphs[index].runs.extend(next.runs);
        seam
    }

    /// Re-merges a word that a structural edit left split over two runs.
    fn rejoin_at(&mut self, at: TextPosition, require_tagged: bool) {
        let patterns = self.patterns;
        let Some(paragraph) = self.document.paragraphs.get_mut(at.paragraph) else {
            return;
        };
        if !paragraph.is_run_boundary(at.offset)
            || !paragraph.char_before(at.offset).is_some_and(is_word_char)
            || !paragraph.char_at(at.offset).is_some_and(is_word_char)
        {
            return;
        }
        let Some(left) = paragraph.locate(at.offset, Affinity::Before) else {
            return;
        };
        let right = left.run + 1;
        let touches_tag = paragraph.runs[left.run].is_tagged()
            || paragraph.runs.get(right).is_some_and(Run::is_tagged);
        if require_tagged && !touches_tag {
            return;
        }
        if let Err(err) =
            join_run_text_across_boundary(paragraph, left.run, right, left.offset, &patterns)
        {
            report(err);
        }
    }

    fn retag_words(&mut self, paragraph: usize, from: usize, to: usize) {
        let Some(text) = self.document.paragraphs.get(paragraph).map(Paragraph::text) else {
            return;
        };
        for span in words_touching(&text, from, to) {
            self.retag_word(paragraph, &text, span);
        }
    }

    /// Makes the formatting of one word agree with the patterns: a matching
    /// word ends up as exactly one tagged run, anything else as plain text.
    fn retag_word(&mut self, index: usize, text: &str, span: WordSpan) {
        let patterns = self.patterns;
        let kind = patterns.classify_word(char_slice(text, span.start, span.end));
        let paragraph = &mut self.document.paragraphs[index];
        let overlapping = paragraph.tagged_runs_in(span.start, span.end);

        if let Some(kind) = kind
            && let [only] = overlapping.as_slice()
            && paragraph.run_span(*only) == Some((span.start, span.end))
        {
            paragraph.runs[*only].style = RunStyle::Tagged(kind);
            return;
        }

        for &run in &overlapping {
            if let Err(err) = unformat_run(paragraph, run, 0, 0) {
                report(err);
            }
        }
        if kind.is_none() {
            return;
        }

        paragraph.normalize();
        let Some(found) = paragraph.locate(span.start, Affinity::After) else {
            return;
        };
        let word_end = found.offset + span.len();
        if let Err(err) = format_word(
            paragraph,
            found.run,
            found.offset,
            word_end,
            found.offset,
            &patterns,
        ) {
            report(err);
        }
    }

    /// Unformats every tagged run overlapping or touching `[from, to]` that
    /// is not a whole, fully matching word. One walk over the runs.
    fn heal_paragraph(&mut self, index: usize, from: usize, to: usize) {
        let patterns = self.patterns;
        let Some(paragraph) = self.document.paragraphs.get_mut(index) else {
            return;
        };
        let mut start = 0;
        let mut previous: Option<char> = None;
        for run in 0..paragraph.runs.len() {
            let end = start + paragraph.runs[run].char_len();
            if let RunStyle::Tagged(kind) = paragraph.runs[run].style
                && WordSpan::new(start, end).touches(from, to)
            {
                let next = paragraph.runs[run + 1..]
                    .iter()
                    .find_map(|later| later.text.chars().next());
                let whole_word =
                    !previous.is_some_and(is_word_char) && !next.is_some_and(is_word_char);
                match patterns.classify_word(&paragraph.runs[run].text) {
                    Some(found) if whole_word => {
                        if found != kind {
                            paragraph.runs[run].style = RunStyle::Tagged(found);
                        }
                    }
                    _ => {
                        tracing::debug!(
                            target: "tagtext::engine",
                            paragraph = index,
                            run,
                            text = %paragraph.runs[run].text,
                            "healing tagged run"
                        );
                        if let Err(err) = unformat_run(paragraph, run, 0, 0) {
                            report(err);
                        }
                    }
                }
            }
            if let Some(last) = paragraph.runs[run].text.chars().next_back() {
                previous = Some(last);
            }
            start = end;
        }
    }

    fn finish(&mut self, outcome: EditOutcome) -> Selection {
        let EditOutcome { caret, start, end } = outcome;
        for index in start.paragraph..=end.paragraph {
            let from = if index == start.paragraph { start.offset } else { 0 };
            let to = if index == end.paragraph {
                end.offset
            } else {
                usize::MAX
            };
            self.heal_paragraph(index, from, to);
        }
        self.document.normalize();

        if self.document.paragraphs.len() <= 1 && !self.document.has_text() {
            if !self.document.is_empty_state() {
                tracing::debug!(target: "tagtext::engine", "document emptied");
            }
            self.document.clear();
        }

        let pointer = resolve(&self.document, caret, Affinity::Before);
        self.selection = Selection::collapsed(pointer);
        self.selection
    }

    fn reformat_all(&mut self) {
        let patterns = self.patterns;
        for index in 0..self.document.paragraphs.len() {
            let paragraph = &mut self.document.paragraphs[index];
            let len = paragraph.char_len();
            format_words_in_range(paragraph, 0, len, &patterns);
            self.heal_paragraph(index, 0, len);
        }
        self.document.normalize();
        let head = self.document.text_position(&self.selection.head);
        self.selection = Selection::collapsed(resolve(&self.document, head, Affinity::Before));
    }
}

fn report(err: FormatError) {
    debug_assert!(
        !matches!(err, FormatError::PatternMismatch { .. }),
        "formatter asked to tag a non-matching word: {err}"
    );
    tracing::warn!(target: "tagtext::engine", %err, "formatter rejected an edit step");
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
