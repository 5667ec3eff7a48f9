//! Keyboard Handling
//!
//! Key events as the editor sees them, the Ctrl/Cmd shortcut table and the
//! blockquote exit behaviour.

use crate::surface::{EditingSurface, SurfaceCommand};

/// Physical key of interest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Char(char),
    Other(String),
}

/// A key event with its modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl on most platforms, Cmd on macOS
    pub fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Editor keyboard shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Save,
    Undo,
    Redo,
    Bold,
    Italic,
    Underline,
}

/// Map a key-down to a shortcut
pub fn shortcut(input: &KeyInput) -> Option<Shortcut> {
    if !input.has_command_modifier() {
        return None;
    }
    let Key::Char(c) = input.key else {
        return None;
    };
    match c.to_ascii_lowercase() {
        's' => Some(Shortcut::Save),
        'z' if input.shift => Some(Shortcut::Redo),
        'z' => Some(Shortcut::Undo),
        'y' => Some(Shortcut::Redo),
        'b' => Some(Shortcut::Bold),
        'i' => Some(Shortcut::Italic),
        'u' => Some(Shortcut::Underline),
        _ => None,
    }
}

/// Leave a blockquote with Enter on an empty line or Backspace at the
/// start of a line. Returns `true` when the key was consumed.
pub fn blockquote_exit(surface: &mut impl EditingSurface, input: &KeyInput) -> bool {
    if !matches!(input.key, Key::Enter | Key::Backspace) {
        return false;
    }
    let Some(ctx) = surface.caret_context() else {
        return false;
    };
    if !ctx.collapsed || !ctx.in_blockquote {
        return false;
    }

    let exit = match input.key {
        Key::Enter => ctx.block_text.trim().is_empty(),
        Key::Backspace => ctx.text_before.is_empty(),
        _ => false,
    };
    if exit {
        surface.apply(&SurfaceCommand::Outdent);
    }
    exit
}
