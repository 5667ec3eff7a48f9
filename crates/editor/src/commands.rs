//! Editor Commands
//!
//! Named formatting commands and the executor that applies them to a
//! surface, refreshes the toolbar state and records history snapshots.

use prodoc_core::events::ToolbarState;
use prodoc_core::tree::{Alignment, RichTree};
use prodoc_core::{ProDocError, Result};
use tracing::{debug, info};

use crate::fragments::{self, ImageRequest, LinkRequest, VideoRequest};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::keys::{self, KeyInput, Shortcut};
use crate::selection::SelectionTracker;
use crate::structure::BlockFormat;
use crate::surface::{EditingSurface, LinkInfo, StateQuery, SurfaceCommand, ToggleStyle};

/// Size class the font-size primitive is driven with before pixel rewriting
const PIXEL_SIZE_CLASS: u8 = 7;

/// Formatting command invoked by name from the toolbar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    InsertOrderedList,
    InsertUnorderedList,
    FontName(String),
    /// Size class, or an explicit pixel size
    FontSize { class: u8, px: Option<u32> },
    ForeColor(String),
    BackColor(String),
    FormatBlock(BlockFormat),
    Outdent,
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProDocError::validation(format!("Command '{}' needs a value", name)))
}

impl FormatCommand {
    /// Resolve a command name with its primary and secondary values
    pub fn parse(name: &str, value: Option<&str>, arg: Option<&str>) -> Result<Self> {
        let command = match name {
            "bold" => FormatCommand::Bold,
            "italic" => FormatCommand::Italic,
            "underline" => FormatCommand::Underline,
            "strikethrough" | "strikeThrough" => FormatCommand::Strikethrough,
            "justifyLeft" => FormatCommand::JustifyLeft,
            "justifyCenter" => FormatCommand::JustifyCenter,
            "justifyRight" => FormatCommand::JustifyRight,
            "justifyFull" => FormatCommand::JustifyFull,
            "insertOrderedList" => FormatCommand::InsertOrderedList,
            "insertUnorderedList" => FormatCommand::InsertUnorderedList,
            "fontName" => FormatCommand::FontName(required(name, value)?.to_string()),
            "fontSize" => {
                let class = required(name, value)?
                    .parse::<u8>()
                    .ok()
                    .filter(|c| (1..=7).contains(c))
                    .ok_or_else(|| ProDocError::validation("Font size class must be 1-7"))?;
                let px = match arg.map(str::trim).filter(|a| !a.is_empty()) {
                    Some(px) => Some(
                        px.trim_end_matches("px")
                            .parse::<u32>()
                            .map_err(|_| ProDocError::validation(format!("Invalid font size: {}", px)))?,
                    ),
                    None => None,
                };
                FormatCommand::FontSize { class, px }
            }
            "foreColor" => FormatCommand::ForeColor(required(name, value)?.to_string()),
            "backColor" | "hiliteColor" => FormatCommand::BackColor(required(name, value)?.to_string()),
            "formatBlock" => {
                let tag = required(name, value)?;
                FormatCommand::FormatBlock(
                    BlockFormat::from_tag(tag)
                        .ok_or_else(|| ProDocError::validation(format!("Unsupported block format: {}", tag)))?,
                )
            }
            "outdent" => FormatCommand::Outdent,
            other => return Err(ProDocError::validation(format!("Unknown command: {}", other))),
        };
        Ok(command)
    }

    /// Primitive sent to the surface
    fn primitive(&self) -> SurfaceCommand {
        match self {
            FormatCommand::Bold => SurfaceCommand::Toggle(ToggleStyle::Bold),
            FormatCommand::Italic => SurfaceCommand::Toggle(ToggleStyle::Italic),
            FormatCommand::Underline => SurfaceCommand::Toggle(ToggleStyle::Underline),
            FormatCommand::Strikethrough => SurfaceCommand::Toggle(ToggleStyle::Strike),
            FormatCommand::JustifyLeft => SurfaceCommand::Align(Alignment::Left),
            FormatCommand::JustifyCenter => SurfaceCommand::Align(Alignment::Center),
            FormatCommand::JustifyRight => SurfaceCommand::Align(Alignment::Right),
            FormatCommand::JustifyFull => SurfaceCommand::Align(Alignment::Justify),
            FormatCommand::InsertOrderedList => SurfaceCommand::List { ordered: true },
            FormatCommand::InsertUnorderedList => SurfaceCommand::List { ordered: false },
            FormatCommand::FontName(family) => SurfaceCommand::FontName(family.clone()),
            FormatCommand::FontSize { class, px: None } => SurfaceCommand::FontSize(*class),
            FormatCommand::FontSize { px: Some(_), .. } => SurfaceCommand::FontSize(PIXEL_SIZE_CLASS),
            FormatCommand::ForeColor(color) => SurfaceCommand::ForeColor(color.clone()),
            FormatCommand::BackColor(color) => SurfaceCommand::BackColor(color.clone()),
            FormatCommand::FormatBlock(format) => SurfaceCommand::FormatBlock(*format),
            FormatCommand::Outdent => SurfaceCommand::Outdent,
        }
    }
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the content changed
    pub changed: bool,
    /// Confirmation shown to the user
    pub message: Option<String>,
}

impl CommandResult {
    pub fn ok(changed: bool) -> Self {
        Self {
            changed,
            message: None,
        }
    }

    pub fn with_message(changed: bool, message: impl Into<String>) -> Self {
        Self {
            changed,
            message: Some(message.into()),
        }
    }
}

/// What a key-down led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    /// Default key behaviour proceeds
    Default,
    /// The caret left a blockquote; the key is consumed
    QuoteExited,
    /// A shortcut was applied to the surface
    Applied(Shortcut),
    /// A shortcut the host has to carry out
    Requested(Shortcut),
}

/// Applies commands to a surface and keeps the undo history
pub struct CommandExecutor {
    history: History<RichTree>,
    tracker: SelectionTracker,
    toolbar: ToolbarState,
    dirty: bool,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: History::with_limit(limit),
            tracker: SelectionTracker::new(),
            toolbar: ToolbarState::default(),
            dirty: false,
        }
    }

    pub fn history(&self) -> &History<RichTree> {
        &self.history
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn toolbar(&self) -> ToolbarState {
        self.toolbar
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Snapshot the surface content into history
    pub fn record(&mut self, surface: &impl EditingSurface) -> bool {
        self.history.record(surface.content().clone())
    }

    /// Start a fresh history at the current content
    pub fn reset_history(&mut self, surface: &impl EditingSurface) {
        self.history.clear();
        self.record(surface);
    }

    /// Remember the selection before a dialog takes focus
    pub fn capture_selection(&mut self, surface: &impl EditingSurface) {
        self.tracker.capture(surface);
    }

    /// Recompute the active flags shown by the toolbar
    pub fn refresh_toolbar(&mut self, surface: &impl EditingSurface) -> ToolbarState {
        self.toolbar = ToolbarState {
            bold: surface.query_state(StateQuery::Bold),
            italic: surface.query_state(StateQuery::Italic),
            underline: surface.query_state(StateQuery::Underline),
            strikethrough: surface.query_state(StateQuery::Strikethrough),
            ordered_list: surface.query_state(StateQuery::OrderedList),
            unordered_list: surface.query_state(StateQuery::UnorderedList),
            justify_left: surface.query_state(StateQuery::JustifyLeft),
            justify_center: surface.query_state(StateQuery::JustifyCenter),
            justify_right: surface.query_state(StateQuery::JustifyRight),
            justify_full: surface.query_state(StateQuery::JustifyFull),
            in_blockquote: surface
                .caret_context()
                .map(|ctx| ctx.in_blockquote)
                .unwrap_or(false),
        };
        self.toolbar
    }

    /// Execute a command by name at the live selection
    pub fn execute(
        &mut self,
        surface: &mut impl EditingSurface,
        name: &str,
        value: Option<&str>,
        arg: Option<&str>,
    ) -> Result<CommandResult> {
        let command = FormatCommand::parse(name, value, arg)?;
        Ok(self.apply(surface, &command))
    }

    /// Apply a parsed command at the live selection
    pub fn apply(&mut self, surface: &mut impl EditingSurface, command: &FormatCommand) -> CommandResult {
        surface.focus();
        let mut changed = surface.apply(&command.primitive());

        if let FormatCommand::FontSize { px: Some(px), .. } = command {
            let rewritten = surface.replace_size_class(PIXEL_SIZE_CLASS, *px);
            debug!("Rewrote {} size markers to {}px", rewritten, px);
            changed |= rewritten > 0;
        }

        self.refresh_toolbar(surface);
        self.dirty = true;
        self.record(surface);
        debug!("Executed {:?} (changed: {})", command, changed);
        CommandResult::ok(changed)
    }

    /// Values the link dialog opens with; captures the selection
    pub fn link_prefill(&mut self, surface: &impl EditingSurface) -> LinkRequest {
        self.tracker.capture(surface);
        match surface.enclosing_link() {
            Some(link) => LinkRequest {
                url: link.href,
                text: link.text,
                new_tab: link.new_tab,
            },
            None => LinkRequest {
                url: "https://".to_string(),
                text: surface.selected_text(),
                new_tab: true,
            },
        }
    }

    /// Insert a hyperlink, or rewrite the one the selection sits in
    pub fn insert_link(
        &mut self,
        surface: &mut impl EditingSurface,
        request: &LinkRequest,
    ) -> Result<CommandResult> {
        self.tracker.restore(surface);
        let link = request.to_link()?;

        let changed = if surface.enclosing_link().is_some() {
            surface.edit_enclosing_link(&LinkInfo {
                href: link.href.clone(),
                text: request.display_text().to_string(),
                new_tab: link.new_tab,
            })
        } else {
            surface.insert_fragment(fragments::link_fragment(request)?)
        };

        info!("Link set to {}", link.href);
        Ok(self.finish_insertion(surface, changed, "Link updated"))
    }

    /// Insert an image from a URL or a local file
    pub async fn insert_image(
        &mut self,
        surface: &mut impl EditingSurface,
        request: &ImageRequest,
    ) -> Result<CommandResult> {
        let src = request.resolve_source().await?;
        self.tracker.restore(surface);
        let changed = surface.insert_fragment(request.fragment(src));
        Ok(self.finish_insertion(surface, changed, "Image inserted"))
    }

    /// Insert a video embed
    pub fn insert_video(
        &mut self,
        surface: &mut impl EditingSurface,
        request: &VideoRequest,
    ) -> Result<CommandResult> {
        let fragment = request.fragment()?;
        self.tracker.restore(surface);
        let changed = surface.insert_fragment(fragment);
        Ok(self.finish_insertion(surface, changed, "Video inserted"))
    }

    /// Insert a table with a header row
    pub fn insert_table(
        &mut self,
        surface: &mut impl EditingSurface,
        rows: usize,
        cols: usize,
    ) -> Result<CommandResult> {
        let fragment = fragments::table_fragment(rows, cols)?;
        self.tracker.restore(surface);
        let changed = surface.insert_fragment(fragment);
        Ok(self.finish_insertion(surface, changed, "Table inserted"))
    }

    /// Insert a code block with placeholder text
    pub fn insert_code_block(&mut self, surface: &mut impl EditingSurface) -> CommandResult {
        self.tracker.restore(surface);
        let changed = surface.insert_fragment(fragments::code_block_fragment());
        self.finish_insertion(surface, changed, "Code block inserted")
    }

    /// Quote the current block
    pub fn insert_quote(&mut self, surface: &mut impl EditingSurface) -> CommandResult {
        self.tracker.restore(surface);
        let result = self.apply(surface, &FormatCommand::FormatBlock(BlockFormat::Blockquote));
        self.tracker.clear();
        CommandResult::with_message(result.changed, "Quote applied")
    }

    fn finish_insertion(
        &mut self,
        surface: &mut impl EditingSurface,
        changed: bool,
        message: &str,
    ) -> CommandResult {
        self.tracker.clear();
        self.refresh_toolbar(surface);
        self.dirty = true;
        self.record(surface);
        CommandResult::with_message(changed, message)
    }

    /// Step back one snapshot
    pub fn undo(&mut self, surface: &mut impl EditingSurface) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.show_snapshot(surface, snapshot);
        true
    }

    /// Step forward one snapshot
    pub fn redo(&mut self, surface: &mut impl EditingSurface) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.show_snapshot(surface, snapshot);
        true
    }

    fn show_snapshot(&mut self, surface: &mut impl EditingSurface, snapshot: RichTree) {
        surface.set_content(snapshot);
        self.refresh_toolbar(surface);
        self.dirty = true;
    }

    /// Key-down: blockquote exit first, then shortcuts
    pub fn on_key_down(&mut self, surface: &mut impl EditingSurface, input: &KeyInput) -> KeyResponse {
        if keys::blockquote_exit(surface, input) {
            self.refresh_toolbar(surface);
            return KeyResponse::QuoteExited;
        }

        match keys::shortcut(input) {
            Some(Shortcut::Save) => KeyResponse::Requested(Shortcut::Save),
            Some(Shortcut::Undo) => {
                self.undo(surface);
                KeyResponse::Applied(Shortcut::Undo)
            }
            Some(Shortcut::Redo) => {
                self.redo(surface);
                KeyResponse::Applied(Shortcut::Redo)
            }
            Some(shortcut @ (Shortcut::Bold | Shortcut::Italic | Shortcut::Underline)) => {
                let command = match shortcut {
                    Shortcut::Bold => FormatCommand::Bold,
                    Shortcut::Italic => FormatCommand::Italic,
                    _ => FormatCommand::Underline,
                };
                self.apply(surface, &command);
                KeyResponse::Applied(shortcut)
            }
            None => KeyResponse::Default,
        }
    }

    /// Key-up: record unless a command modifier is held
    pub fn on_key_up(&mut self, surface: &impl EditingSurface, input: &KeyInput) -> bool {
        let recorded = !input.has_command_modifier() && self.record(surface);
        self.refresh_toolbar(surface);
        recorded
    }

    /// Mouse-up: record and refresh
    pub fn on_mouse_up(&mut self, surface: &impl EditingSurface) -> bool {
        let recorded = self.record(surface);
        self.refresh_toolbar(surface);
        recorded
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}
