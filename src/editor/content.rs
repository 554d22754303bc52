use thiserror::Error;

use super::Affinity;
use super::classify::{
    TagPatterns, char_slice, char_to_byte_idx, expand_to_words, first_non_word_index, is_word_char,
};
use super::structure::{Paragraph, Run, RunPosition, RunStyle};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("`{word}` does not fully match a tag pattern")]
    PatternMismatch { word: String },
    #[error("run {run} is not tagged")]
    NotTagged { run: usize },
    #[error("run {run} is already tagged")]
    AlreadyTagged { run: usize },
    #[error("run {run} is out of range for a paragraph with {len} runs")]
    RunOutOfRange { run: usize, len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormattedWord {
    pub tagged_run: usize,
    pub caret: RunPosition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnformattedRun {
    /// Run now holding the extracted text, if any text moved.
    pub plain_run: Option<usize>,
    pub caret: RunPosition,
}

/// Where inserted text should land relative to tagged runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertBias {
    /// Extend whatever run ends at the insertion point.
    Word,
    /// Prefer a plain run next to the insertion point.
    Boundary,
}

fn run_or_err(paragraph: &Paragraph, run: usize) -> Result<&Run, FormatError> {
    paragraph.runs.get(run).ok_or(FormatError::RunOutOfRange {
        run,
        len: paragraph.runs.len(),
    })
}

/// Wraps `[word_start, word_end)` of a plain run in a new tagged run,
/// keeping the text before and after it as plain runs.
pub fn format_word(
    paragraph: &mut Paragraph,
    run: usize,
    word_start: usize,
    word_end: usize,
    caret: usize,
    patterns: &TagPatterns,
) -> Result<FormattedWord, FormatError> {
    let original = run_or_err(paragraph, run)?;
    if original.is_tagged() {
        return Err(FormatError::AlreadyTagged { run });
    }

    let len = original.char_len();
    let word_end = word_end.min(len);
    let word_start = word_start.min(word_end);
    let caret = caret.clamp(word_start, word_end);

    let word = char_slice(&original.text, word_start, word_end);
    let Some(kind) = patterns.classify_word(word) else {
        return Err(FormatError::PatternMismatch {
            word: word.to_string(),
        });
    };

    let (before_end, tail) = split_text(&original.text, word_end);
    let (head, word) = split_text(&before_end, word_start);

    let mut replacements = Vec::with_capacity(3);
    if !head.is_empty() {
        replacements.push(Run::plain(head));
    }
    let tagged_run = run + replacements.len();
    replacements.push(Run::tagged(word, kind));
    if !tail.is_empty() {
        replacements.push(Run::plain(tail));
    }

    paragraph.runs.splice(run..=run, replacements);

    tracing::trace!(
        target: "tagtext::format",
        run = tagged_run,
        kind = kind.label(),
        "formatted word"
    );

    Ok(FormattedWord {
        tagged_run,
        caret: RunPosition::new(tagged_run, caret - word_start),
    })
}

/// Moves the text of a tagged run from `cut_at` to its end into a plain run.
/// With `cut_at == 0` the whole run becomes plain.
pub fn unformat_run(
    paragraph: &mut Paragraph,
    run: usize,
    cut_at: usize,
    caret: usize,
) -> Result<UnformattedRun, FormatError> {
    let original = run_or_err(paragraph, run)?;
    if !original.is_tagged() {
        return Err(FormatError::NotTagged { run });
    }
    let len = original.char_len();
    let cut_at = cut_at.min(len);
    let caret = caret.min(len);

    if cut_at == 0 {
        paragraph.runs[run].style = RunStyle::Plain;
        return Ok(UnformattedRun {
            plain_run: Some(run),
            caret: RunPosition::new(run, caret),
        });
    }
    if cut_at == len {
        return Ok(UnformattedRun {
            plain_run: None,
            caret: RunPosition::new(run, caret),
        });
    }

    let (kept, moved) = split_text(&paragraph.runs[run].text, cut_at);
    paragraph.runs[run].text = kept;

    let next = run + 1;
    match paragraph.runs.get_mut(next) {
        Some(neighbour) if neighbour.is_plain() => neighbour.text.insert_str(0, &moved),
        _ => paragraph.runs.insert(next, Run::plain(moved)),
    }

    let caret = if caret < cut_at {
        RunPosition::new(run, caret)
    } else {
        RunPosition::new(next, caret - cut_at)
    };
    Ok(UnformattedRun {
        plain_run: Some(next),
        caret,
    })
}

/// Pulls the leading word characters of `end_run` (or of the first non-empty
/// run after it) onto the end of `start_run`. A tagged `start_run` that no
/// longer matches afterwards is unformatted.
pub fn join_run_text_across_boundary(
    paragraph: &mut Paragraph,
    start_run: usize,
    end_run: usize,
    caret_in_start: usize,
    patterns: &TagPatterns,
) -> Result<RunPosition, FormatError> {
    run_or_err(paragraph, start_run)?;
    let join_point = RunPosition::new(start_run, caret_in_start);

    let mut source = end_run;
    while paragraph.runs.get(source).is_some_and(Run::is_empty) {
        source += 1;
    }
    if source <= start_run || source >= paragraph.runs.len() {
        return Ok(join_point);
    }

    let take = first_non_word_index(&paragraph.runs[source].text);
    if take == 0 {
        return Ok(join_point);
    }

    let (moved, rest) = split_text(&paragraph.runs[source].text, take);
    paragraph.runs[start_run].text.push_str(&moved);
    if rest.is_empty() {
        paragraph.runs.remove(source);
    } else {
        paragraph.runs[source].text = rest;
    }

    if let RunStyle::Tagged(kind) = paragraph.runs[start_run].style {
        match patterns.classify_word(&paragraph.runs[start_run].text) {
            Some(found) if found != kind => {
                paragraph.runs[start_run].style = RunStyle::Tagged(found);
            }
            Some(_) => {}
            None => {
                unformat_run(paragraph, start_run, 0, caret_in_start)?;
            }
        }
    }

    tracing::trace!(
        target: "tagtext::format",
        start_run,
        source,
        moved = take,
        "joined text across run boundary"
    );

    Ok(join_point)
}

/// Re-derives the runs covering every word that overlaps or touches
/// `[from, to]`: whole words that match become tagged runs, everything else
/// in the region becomes plain text. Runs outside the region are kept as
/// they are. Returns the number of tagged runs produced.
pub fn format_words_in_range(
    paragraph: &mut Paragraph,
    from: usize,
    to: usize,
    patterns: &TagPatterns,
) -> usize {
    let window = expand_to_words(&paragraph.text(), from, to);
    if window.is_empty() {
        return 0;
    }

    let tail = split_runs(paragraph, window.end);
    let region: String = split_runs(paragraph, window.start)
        .iter()
        .map(|run| run.text.as_str())
        .collect();
    let formatted = formatted_runs(&region, patterns);
    let tagged = formatted.iter().filter(|run| run.is_tagged()).count();

    paragraph.runs.extend(formatted);
    paragraph.runs.extend(tail);
    paragraph.normalize();

    tracing::trace!(
        target: "tagtext::format",
        start = window.start,
        end = window.end,
        tagged,
        "formatted words in range"
    );
    tagged
}

fn formatted_runs(text: &str, patterns: &TagPatterns) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut plain_start = 0;
    let mut word_start = None;
    let sentinel = std::iter::once((text.len(), ' '));
    for (byte_idx, ch) in text.char_indices().chain(sentinel) {
        match (is_word_char(ch), word_start) {
            (true, None) => word_start = Some(byte_idx),
            (false, Some(start)) => {
                word_start = None;
                let word = &text[start..byte_idx];
                if let Some(kind) = patterns.classify_word(word) {
                    if start > plain_start {
                        runs.push(Run::plain(&text[plain_start..start]));
                    }
                    runs.push(Run::tagged(word, kind));
                    plain_start = byte_idx;
                }
            }
            _ => {}
        }
    }
    if plain_start < text.len() {
        runs.push(Run::plain(&text[plain_start..]));
    }
    runs
}

/// Inserts `text` at a paragraph offset and returns the position right after it.
pub fn insert_text_at(
    paragraph: &mut Paragraph,
    offset: usize,
    text: &str,
    bias: InsertBias,
) -> RunPosition {
    let inserted = text.chars().count();
    let Some(found) = paragraph.locate(offset, Affinity::Before) else {
        paragraph.runs = vec![Run::plain(text)];
        return RunPosition::new(0, inserted);
    };

    let target = match bias {
        InsertBias::Word => found,
        InsertBias::Boundary => boundary_target(paragraph, found),
    };
    insert_into_run(&mut paragraph.runs[target.run], target.offset, text);
    RunPosition::new(target.run, target.offset + inserted)
}

// Tagged edges hand the insertion to a plain neighbour (created on demand).
// Inside a tagged run the text goes in as-is; the caller splits the run.
fn boundary_target(paragraph: &mut Paragraph, found: RunPosition) -> RunPosition {
    let run = &paragraph.runs[found.run];
    if run.is_plain() {
        return found;
    }
    let len = run.char_len();
    if found.offset == len {
        let next = found.run + 1;
        if paragraph.runs.get(next).is_none_or(Run::is_tagged) {
            paragraph.runs.insert(next, Run::plain(""));
        }
        return RunPosition::new(next, 0);
    }
    if found.offset == 0 {
        if let Some(previous) = found.run.checked_sub(1)
            && paragraph.runs[previous].is_plain()
        {
            return RunPosition::new(previous, paragraph.runs[previous].char_len());
        }
        paragraph.runs.insert(found.run, Run::plain(""));
        return RunPosition::new(found.run, 0);
    }
    found
}

fn insert_into_run(run: &mut Run, offset: usize, text: &str) {
    let byte_idx = char_to_byte_idx(&run.text, offset.min(run.char_len()));
    run.text.insert_str(byte_idx, text);
}

/// Removes the chars `[start, end)` of a paragraph, dropping runs left empty.
pub fn remove_range(paragraph: &mut Paragraph, start: usize, end: usize) {
    let end = end.min(paragraph.char_len());
    if start >= end {
        return;
    }
    let mut run_start = 0;
    for run in &mut paragraph.runs {
        let len = run.char_len();
        let run_end = run_start + len;
        let from = start.max(run_start);
        let to = end.min(run_end);
        if from < to {
            let byte_from = char_to_byte_idx(&run.text, from - run_start);
            let byte_to = char_to_byte_idx(&run.text, to - run_start);
            run.text.drain(byte_from..byte_to);
        }
        run_start = run_end;
    }
    paragraph.runs.retain(|run| !run.is_empty());
}

/// Cuts the paragraph at `offset` and returns the runs after it. A run
/// straddling the cut is divided and both halves keep its style.
pub fn split_runs(paragraph: &mut Paragraph, offset: usize) -> Vec<Run> {
    let Some(found) = paragraph.locate(offset, Affinity::After) else {
        return Vec::new();
    };

    let mut trailing = paragraph.runs.split_off(found.run);
    let first = &mut trailing[0];
    let (left, right) = split_text(&first.text, found.offset);
    if !left.is_empty() {
        paragraph.runs.push(Run {
            text: left,
            style: first.style,
        });
    }
    first.text = right;
    trailing.retain(|run| !run.is_empty());
    trailing
}

pub(crate) fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    let left = text[..byte_idx].to_string();
    let right = text[byte_idx..].to_string();
    (left, right)
}
