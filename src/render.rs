use ratatui::{
    style::Style,
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::editor::{Document, Paragraph, RunStyle, TextPosition};
use crate::theme::Theme;

const TAB_WIDTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

/// What the renderer needs from the editor besides the document.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderView {
    pub caret: TextPosition,
    pub selection: Option<(TextPosition, TextPosition)>,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
}

pub fn render_document(
    document: &Document,
    width: usize,
    view: RenderView,
    theme: &Theme,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), view, theme);
    renderer.render_document(document);
    renderer.finish()
}

struct Renderer<'a> {
    wrap_width: usize,
    view: RenderView,
    theme: &'a Theme,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
}

impl<'a> Renderer<'a> {
    fn new(wrap_width: usize, view: RenderView, theme: &'a Theme) -> Self {
        Self {
            wrap_width,
            view,
            theme,
            cursor: None,
            lines: Vec::new(),
            current_line_index: 0,
        }
    }

    fn render_document(&mut self, document: &Document) {
        if document.is_empty_state() {
            self.cursor = Some(CursorVisualPosition { line: 0, column: 0 });
            return;
        }
        for (idx, paragraph) in document.paragraphs.iter().enumerate() {
            self.render_paragraph(idx, paragraph);
        }
    }

    fn render_paragraph(&mut self, index: usize, paragraph: &Paragraph) {
        let caret = (self.view.caret.paragraph == index).then_some(self.view.caret.offset);
        let selected = self.selected_range(index, paragraph.char_len());
        let selection_style = self.theme.selection_style();

        let mut tokenizer = Tokenizer::default();
        let mut offset = 0;
        for run in &paragraph.runs {
            let base = match run.style {
                RunStyle::Plain => self.theme.text_style(),
                RunStyle::Tagged(kind) => self.theme.tag_style(kind),
            };
            for ch in run.text.chars() {
                if caret == Some(offset) {
                    tokenizer.mark_cursor();
                }
                let style = match selected {
                    Some((from, to)) if (from..to).contains(&offset) => base.patch(selection_style),
                    _ => base,
                };
                tokenizer.push_char(ch, style);
                offset += 1;
            }
        }
        if let Some(caret) = caret
            && caret >= offset
        {
            tokenizer.mark_cursor();
        }

        let lines = wrap_fragments(&tokenizer.finish(), self.wrap_width);
        self.consume_lines(lines);
    }

    fn selected_range(&self, index: usize, len: usize) -> Option<(usize, usize)> {
        let (start, end) = self.view.selection?;
        if index < start.paragraph || index > end.paragraph {
            return None;
        }
        let from = if index == start.paragraph { start.offset } else { 0 };
        let to = if index == end.paragraph { end.offset } else { len };
        (from < to).then_some((from, to))
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let mut spans: Vec<Span<'static>> = Vec::with_capacity(output.spans.len());
            for segment in output.spans {
                spans.push(Span::styled(segment.text, segment.style));
            }
            if let Some(column) = output.cursor {
                self.cursor = Some(CursorVisualPosition {
                    line: self.current_line_index,
                    column,
                });
            }
            self.lines.push(Line::from(spans));
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
        }
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    spans: Vec<LineSegment>,
    cursor: Option<u16>,
}

#[derive(Clone)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    /// Width before the caret, when the caret sits inside this fragment.
    cursor: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

/// Splits a paragraph into word and whitespace fragments. A fragment ends
/// wherever the kind or the style changes.
#[derive(Default)]
struct Tokenizer {
    builder: Option<Fragment>,
    pending_cursor: bool,
    fragments: Vec<Fragment>,
}

impl Tokenizer {
    fn mark_cursor(&mut self) {
        self.pending_cursor = true;
    }

    fn push_char(&mut self, ch: char, style: Style) {
        let kind = if ch.is_whitespace() {
            FragmentKind::Whitespace
        } else {
            FragmentKind::Word
        };
        let continues = self
            .builder
            .as_ref()
            .is_some_and(|current| current.kind == kind && current.style == style);
        if !continues && let Some(done) = self.builder.take() {
            self.fragments.push(done);
        }
        let current = self.builder.get_or_insert_with(|| Fragment {
            text: String::new(),
            style,
            kind,
            width: 0,
            cursor: None,
        });
        if std::mem::take(&mut self.pending_cursor) {
            current.cursor = Some(current.width);
        }
        if ch == '\t' {
            current.text.push_str(&" ".repeat(TAB_WIDTH));
            current.width += TAB_WIDTH;
        } else {
            current.text.push(ch);
            current.width += UnicodeWidthChar::width(ch).unwrap_or(0);
        }
    }

    fn finish(mut self) -> Vec<Fragment> {
        if let Some(done) = self.builder.take() {
            self.fragments.push(done);
        }
        if self.pending_cursor {
            self.fragments.push(Fragment {
                text: String::new(),
                style: Style::default(),
                kind: FragmentKind::Word,
                width: 0,
                cursor: Some(0),
            });
        }
        self.fragments
    }
}

fn wrap_fragments(fragments: &[Fragment], width: usize) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::default();
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment.kind {
            FragmentKind::Whitespace => pending_whitespace.push(fragment.clone()),
            FragmentKind::Word if fragment.width > width => {
                builder.consume_pending(&mut pending_whitespace);
                for piece in break_word(fragment, width) {
                    if builder.width > 0 && builder.width + piece.width > width {
                        outputs.push(builder.build_line());
                        builder = LineBuilder::default();
                    }
                    builder.append(piece);
                }
            }
            FragmentKind::Word => {
                let whitespace_width: usize =
                    pending_whitespace.iter().map(|item| item.width).sum();
                if builder.width > 0 && builder.width + whitespace_width + fragment.width > width {
                    builder.consume_pending(&mut pending_whitespace);
                    outputs.push(builder.build_line());
                    builder = LineBuilder::default();
                }
                builder.consume_pending(&mut pending_whitespace);
                builder.append(fragment.clone());
            }
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

/// Hard-breaks a word wider than the viewport into pieces of at most
/// `width` columns. A piece always holds at least one char.
fn break_word(fragment: &Fragment, width: usize) -> Vec<Fragment> {
    let empty = || Fragment {
        text: String::new(),
        style: fragment.style,
        kind: FragmentKind::Word,
        width: 0,
        cursor: None,
    };
    let mut pieces: Vec<Fragment> = Vec::new();
    let mut current = empty();
    let mut consumed = 0;
    for ch in fragment.text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if !current.text.is_empty() && current.width + ch_width > width {
            consumed += current.width;
            pieces.push(std::mem::replace(&mut current, empty()));
        }
        if fragment.cursor == Some(consumed + current.width) && current.cursor.is_none() {
            current.cursor = Some(current.width);
        }
        current.text.push(ch);
        current.width += ch_width;
    }
    if fragment.cursor == Some(consumed + current.width) && current.cursor.is_none() {
        current.cursor = Some(current.width);
    }
    pieces.push(current);
    pieces
}

#[derive(Default)]
struct LineBuilder {
    segments: Vec<LineSegment>,
    cursor: Option<u16>,
    width: usize,
}

impl LineBuilder {
    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append(fragment);
        }
    }

    fn append(&mut self, fragment: Fragment) {
        if let Some(offset) = fragment.cursor {
            self.cursor = Some((self.width + offset) as u16);
        }
        if !fragment.text.is_empty() {
            self.width += fragment.width;
            self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        LineOutput {
            spans: self.segments,
            cursor: self.cursor,
        }
    }
}
