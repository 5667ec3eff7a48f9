//! ProDoc - rich-text document editor engine
//! 
//! Edits a formatted document with undo/redo and converts it to and from
//! plain text, Markdown, HTML, JSON, `.docx` and PDF.
//! 
//! ## Architecture
//! 
//! - `prodoc-core`: document model, configuration, errors and events
//! - `prodoc-editor`: editing surface, selection tracking, history and commands
//! - `prodoc-markup`: import and export translators
//! 
//! This crate wires them into an [`EditorContext`](context::EditorContext)
//! with persistence and auto-save, and provides the CLI.

#![warn(clippy::all)]

pub mod autosave;
pub mod commands;
pub mod context;
pub mod storage;

// Re-export main components for library usage
pub use prodoc_core as core;
pub use prodoc_editor as editor;
pub use prodoc_markup as markup;

pub use prodoc_core::{APP_NAME, VERSION};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::autosave::{AutoSave, SaveTrigger};
    pub use crate::context::EditorContext;
    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
    pub use prodoc_core::config::AppConfig;
    pub use prodoc_core::{Document, Event, EventBus, ProDocError, RichTree};
    pub use prodoc_editor::{CommandExecutor, EditingSurface, RichSurface, Selection};
    pub use prodoc_markup::{ExportFormat, Exporter};
}
