use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use tracing_subscriber::EnvFilter;

use tagtext::{
    config::{Config, load_config},
    editor::{TagEditor, TagKind},
    render::{CursorVisualPosition, RenderResult, RenderView, render_document},
    theme::Theme,
};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const LOG_ENV: &str = "TAGTEXT_LOG";

#[derive(Parser, Debug)]
#[command(name = "tagtext")]
#[command(about = "A terminal text editor that formats hashtags and mentions as you type", long_about = None)]
struct Args {
    /// Configuration file (defaults to config.toml in the platform config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Initial text, pasted into the empty editor
    #[arg(value_name = "TEXT")]
    text: Option<String>,
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.log_file.as_deref())?;

    let config = load_config(args.config.as_deref());
    let mut app = App::new(config, args.text.as_deref().unwrap_or_default());

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

/// The terminal belongs to the UI, so events only go to `--log-file`.
fn setup_tracing(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))?;

    tracing::info!(path = %path.display(), "tracing initialized");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while !app.should_quit() {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

struct App {
    editor: TagEditor,
    theme: Theme,
    kill_buffer: String,
    scroll_top: usize,
    last_view_height: usize,
    should_quit: bool,
    status_message: Option<(String, Instant)>,
    last_cursor_visual: Option<CursorVisualPosition>,
}

impl App {
    fn new(config: Config, text: &str) -> Self {
        let editor = TagEditor::with_text(text, config.tags);
        let initial_status = match (config.tags.hashtags, config.tags.mentions) {
            (false, false) => Some("Tag formatting disabled in config".to_string()),
            _ => None,
        };

        Self {
            editor,
            theme: Theme::new(),
            kill_buffer: String::new(),
            scroll_top: 0,
            last_view_height: 1,
            should_quit: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            last_cursor_visual: None,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let status_height = if area.height > 1 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let text_area = vertical[0];
        let status_area = vertical[1];

        let render = self.render_document(text_area.width.max(1) as usize);
        let cursor_visual = render.cursor;
        self.last_cursor_visual = cursor_visual;

        let viewport_height = text_area.height as usize;
        self.last_view_height = viewport_height.max(1);
        self.adjust_scroll(&render, viewport_height);

        let paragraph = Paragraph::new(Text::from(render.lines))
            .style(self.theme.text_style())
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        if let Some(cursor) = cursor_visual
            && cursor.line >= self.scroll_top
            && cursor.line < self.scroll_top + viewport_height
        {
            let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
            let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        let status = Paragraph::new(self.status_line())
            .style(self.theme.status_bar_style())
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(status, status_area);
    }

    fn render_document(&self, width: usize) -> RenderResult {
        let view = RenderView {
            caret: self.editor.cursor_position(),
            selection: (!self.editor.selection().is_collapsed())
                .then(|| self.editor.selection_range()),
        };
        render_document(self.editor.document(), width, view, &self.theme)
    }

    fn status_line(&mut self) -> Line<'static> {
        self.prune_status_message();
        let mut spans = vec![Span::raw(self.cursor_status_text())];
        if let Some((message, _)) = &self.status_message {
            spans.push(Span::raw(format!(" | {message}")));
            return Line::from(spans);
        }

        let tags = self.editor.document().tags();
        if tags.is_empty() {
            spans.push(Span::raw(" | no tags"));
        } else {
            let hashtags = tags.iter().filter(|t| t.kind == TagKind::Hashtag).count();
            let mentions = tags.len() - hashtags;
            spans.push(Span::raw(format!(" | {hashtags}# {mentions}@ | ")));
            let labels: Vec<&str> = tags.iter().map(|t| t.text.as_str()).collect();
            spans.push(Span::styled(labels.join(" "), self.theme.tag_list_style()));
        }
        spans.push(Span::raw(" | Ctrl-K cut | Ctrl-V paste | Ctrl-Q quit"));
        Line::from(spans)
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render.total_lines.saturating_sub(viewport);
        if let Some(cursor) = &render.cursor {
            if cursor.line < self.scroll_top {
                self.scroll_top = cursor.line;
            } else if cursor.line >= self.scroll_top + viewport {
                self.scroll_top = (cursor.line + 1).saturating_sub(viewport);
            }
        }
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Paste(text) => {
                self.editor.paste(&text);
            }
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let extend = modifiers.contains(KeyModifiers::SHIFT);
        match (code, modifiers) {
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('a'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.editor.select_all();
            }
            (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => {
                let text = self.editor.selected_text();
                if !text.is_empty() {
                    self.kill_buffer = text;
                    self.set_status("Copied");
                }
            }
            (KeyCode::Char('k'), m) if m.contains(KeyModifiers::CONTROL) => {
                let text = self.editor.cut();
                if !text.is_empty() {
                    self.kill_buffer = text;
                    self.set_status("Cut");
                }
            }
            (KeyCode::Char('v'), m) if m.contains(KeyModifiers::CONTROL) => {
                if self.kill_buffer.is_empty() {
                    self.set_status("Nothing to paste");
                } else {
                    let text = self.kill_buffer.clone();
                    self.editor.paste(&text);
                }
            }
            (KeyCode::Left, _) => {
                self.editor.move_left(extend);
            }
            (KeyCode::Right, _) => {
                self.editor.move_right(extend);
            }
            (KeyCode::Up, _) => {
                self.editor.move_up(extend);
            }
            (KeyCode::Down, _) => {
                self.editor.move_down(extend);
            }
            (KeyCode::Home, _) => {
                self.editor.move_to_paragraph_start(extend);
            }
            (KeyCode::End, _) => {
                self.editor.move_to_paragraph_end(extend);
            }
            (KeyCode::Backspace, _) => {
                self.editor.backspace();
            }
            (KeyCode::Delete, _) => {
                self.editor.delete();
            }
            (KeyCode::Enter, _) => {
                self.editor.insert_paragraph_break();
            }
            (KeyCode::Tab, _) => {
                self.editor.insert_char('\t');
            }
            (KeyCode::Char(ch), m)
                if !m.contains(KeyModifiers::CONTROL) && !m.contains(KeyModifiers::ALT) =>
            {
                self.editor.insert_char(ch);
            }
            (KeyCode::PageUp, _) => {
                self.scroll_top = self.scroll_top.saturating_sub(self.last_view_height.max(1));
            }
            (KeyCode::PageDown, _) => {
                self.scroll_top += self.last_view_height.max(1);
            }
            _ => {}
        }
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn cursor_status_text(&self) -> String {
        let position = self.editor.cursor_position();
        let mut text = format!("[{},{}]", position.paragraph + 1, position.offset + 1);
        if let Some(visual) = self.last_cursor_visual {
            text.push_str(&format!(" line {}", visual.line + 1));
        }
        let selected = self.editor.selected_text().chars().count();
        if selected > 0 {
            text.push_str(&format!(" ({selected} selected)"));
        }
        text
    }
}
