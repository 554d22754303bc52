use std::ptr;

use super::classify::{TagKind, char_slice};
use super::{Affinity, CursorPointer};

// ============================================================================
// Runs
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunStyle {
    #[default]
    Plain,
    Tagged(TagKind),
}

impl RunStyle {
    pub fn is_tagged(self) -> bool {
        matches!(self, RunStyle::Tagged(_))
    }
}

/// A contiguous span of paragraph text with one formatting state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::Plain,
        }
    }

    pub fn tagged(text: impl Into<String>, kind: TagKind) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::Tagged(kind),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_tagged(&self) -> bool {
        self.style.is_tagged()
    }

    pub fn is_plain(&self) -> bool {
        !self.is_tagged()
    }
}

// ============================================================================
// Paragraphs
// ============================================================================

/// Position inside one run of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunPosition {
    pub run: usize,
    pub offset: usize,
}

impl RunPosition {
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SiblingRuns {
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

/// One block of text. A paragraph without runs is the empty placeholder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn placeholder() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn with_runs(runs: Vec<Run>) -> Self {
        let mut paragraph = Self { runs };
        paragraph.normalize();
        paragraph
    }

    pub fn is_placeholder(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(Run::char_len).sum()
    }

    /// Char offset where run `index` starts within the paragraph.
    pub fn run_start(&self, index: usize) -> Option<usize> {
        if index > self.runs.len() {
            return None;
        }
        Some(self.runs[..index].iter().map(Run::char_len).sum())
    }

    /// Half-open char range covered by run `index`.
    pub fn run_span(&self, index: usize) -> Option<(usize, usize)> {
        let run = self.runs.get(index)?;
        let start = self.run_start(index)?;
        Some((start, start + run.char_len()))
    }

    /// Structural index of `run`, matched by identity rather than content.
    pub fn run_offset_within_parent(&self, run: &Run) -> Option<usize> {
        self.runs.iter().position(|candidate| ptr::eq(candidate, run))
    }

    pub fn sibling_runs(&self, index: usize) -> SiblingRuns {
        if index >= self.runs.len() {
            return SiblingRuns::default();
        }
        SiblingRuns {
            previous: index.checked_sub(1),
            next: (index + 1 < self.runs.len()).then_some(index + 1),
        }
    }

    /// Maps a paragraph offset onto a run. At a boundary between two runs,
    /// `Before` picks the run ending there and `After` the run starting there.
    pub fn locate(&self, offset: usize, affinity: Affinity) -> Option<RunPosition> {
        if self.runs.is_empty() {
            return None;
        }
        let offset = offset.min(self.char_len());
        let mut start = 0;
        for (index, run) in self.runs.iter().enumerate() {
            let end = start + run.char_len();
            let inside = match affinity {
                Affinity::Before => offset <= end,
                Affinity::After => offset < end,
            };
            if inside {
                return Some(RunPosition::new(index, offset - start));
            }
            start = end;
        }
        let last = self.runs.len() - 1;
        Some(RunPosition::new(last, self.runs[last].char_len()))
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        let mut remaining = offset;
        for run in &self.runs {
            let len = run.char_len();
            if remaining < len {
                return run.text.chars().nth(remaining);
            }
            remaining -= len;
        }
        None
    }

    pub fn char_before(&self, offset: usize) -> Option<char> {
        offset.checked_sub(1).and_then(|idx| self.char_at(idx))
    }

    pub fn slice(&self, start: usize, end: usize) -> String {
        char_slice(&self.text(), start, end).to_string()
    }

    /// True when `offset` is exactly where one run ends and another begins.
    pub fn is_run_boundary(&self, offset: usize) -> bool {
        let mut start = 0;
        for run in self.runs.iter().take(self.runs.len().saturating_sub(1)) {
            start += run.char_len();
            if start == offset {
                return true;
            }
        }
        false
    }

    /// Tagged runs overlapping the half-open range `[start, end)`.
    pub fn tagged_runs_in(&self, start: usize, end: usize) -> Vec<usize> {
        let mut found = Vec::new();
        let mut run_start = 0;
        for (index, run) in self.runs.iter().enumerate() {
            let run_end = run_start + run.char_len();
            if run.is_tagged() && run_start < end && run_end > start {
                found.push(index);
            }
            run_start = run_end;
        }
        found
    }

    /// Removes empty runs and merges neighbouring plain runs.
    pub fn normalize(&mut self) {
        let settled = !self.runs.iter().any(Run::is_empty)
            && !self
                .runs
                .windows(2)
                .any(|pair| pair[0].is_plain() && pair[1].is_plain());
        if settled {
            return;
        }

        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.is_plain() && run.is_plain() => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A tag as it currently appears in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRef {
    pub paragraph: usize,
    pub start: usize,
    pub text: String,
    pub kind: TagKind,
}

/// Ordered paragraphs. Zero paragraphs is the explicit empty state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraphs(mut self, paragraphs: Vec<Paragraph>) -> Self {
        self.paragraphs = paragraphs;
        self
    }

    pub fn is_empty_state(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|paragraph| !paragraph.is_placeholder())
    }

    pub fn clear(&mut self) {
        self.paragraphs.clear();
    }

    /// Plain text of the document, paragraphs separated by `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn find_parent_paragraph(&self, pointer: &CursorPointer) -> Option<&Paragraph> {
        self.paragraphs.get(pointer.paragraph)
    }

    pub fn normalize(&mut self) {
        for paragraph in &mut self.paragraphs {
            paragraph.normalize();
        }
    }

    pub fn tags(&self) -> Vec<TagRef> {
        let mut tags = Vec::new();
        for (paragraph_idx, paragraph) in self.paragraphs.iter().enumerate() {
            let mut start = 0;
            for run in &paragraph.runs {
                if let RunStyle::Tagged(kind) = run.style {
                    tags.push(TagRef {
                        paragraph: paragraph_idx,
                        start,
                        text: run.text.clone(),
                        kind,
                    });
                }
                start += run.char_len();
            }
        }
        tags
    }
}
