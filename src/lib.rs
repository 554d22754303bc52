//! In-place hashtag and mention formatting for a paragraph/run text model.
//!
//! The engine lives in [`editor`]: [`TagEditor`] consumes [`EditIntent`]s and
//! keeps every whole word that matches a tag pattern in its own tagged run,
//! while the plain text stays exactly what was typed. [`render`], [`theme`]
//! and [`config`] serve the terminal host in `main.rs`.

pub mod config;
pub mod editor;
pub mod render;
pub mod theme;

pub use editor::{
    Affinity, CursorPointer, Direction, Document, EditIntent, FormatError, Paragraph, Run,
    RunStyle, Selection, TagEditor, TagKind, TagPatterns, TextPosition,
};
