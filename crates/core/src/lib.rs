//! ProDoc Core - document model and shared types
//! 
//! This crate provides the rich-text tree, the document entity with its
//! derived statistics, configuration, the error taxonomy and the event bus
//! shared by the editor and markup crates.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod text;
pub mod tree;
pub mod view;

pub use config::AppConfig;
pub use document::{Document, DocumentStats, OutlineEntry};
pub use error::{ProDocError, Result};
pub use events::{Event, EventBus, ToolbarState};
pub use tree::{Block, BlockPath, Inline, Position, RichTree};
pub use view::ViewScale;

/// ProDoc version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ProDoc";
