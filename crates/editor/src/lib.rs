//! ProDoc Editor
//! 
//! Editing engine for the document surface:
//! - Owned rich-text surface with named formatting primitives
//! - Selection tracking across dialogs
//! - Bounded snapshot undo history
//! - Command executor, insertion builders and keyboard handling

pub mod commands;
pub mod fragments;
pub mod history;
pub mod keys;
pub mod selection;
pub mod spans;
pub mod structure;
pub mod surface;

pub use commands::{CommandExecutor, CommandResult, FormatCommand, KeyResponse};
pub use fragments::{ImageRequest, LinkRequest, TableSizePicker, VideoRequest};
pub use history::History;
pub use keys::{KeyInput, Shortcut};
pub use selection::{Selection, SelectionTracker};
pub use surface::{EditingSurface, Fragment, RichSurface};
