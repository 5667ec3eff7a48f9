//! Editor Context
//!
//! Owns the document, the editing surface, the command executor, the view
//! scale and the persistence store, and publishes what happens on the
//! event bus. Errors are reported as notifications at this boundary and
//! handed back to the caller; the document is left untouched by any
//! operation that fails.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use prodoc_core::config::EditorConfig;
use prodoc_core::document::{outline, DocumentStats};
use prodoc_core::error::NotifyLevel;
use prodoc_core::events::{EventSubscription, HistoryDirection, SaveStatus};
use prodoc_core::{AppConfig, Document, Event, EventBus, ProDocError, Result, ViewScale};
use prodoc_editor::{
    CommandExecutor, CommandResult, EditingSurface, ImageRequest, KeyInput, KeyResponse,
    LinkRequest, RichSurface, Shortcut, VideoRequest,
};
use prodoc_markup::pdf::PdfExporter;
use prodoc_markup::{import_file, DocumentRecord, ExportArtifact, ExportFormat, Exporter};

use crate::autosave::{AutoSave, SaveTrigger};
use crate::storage::KeyValueStore;

pub struct EditorContext {
    config: AppConfig,
    document: Document,
    surface: RichSurface,
    executor: CommandExecutor,
    scale: ViewScale,
    exporter: Exporter,
    autosave: AutoSave,
    store: Arc<dyn KeyValueStore>,
    events: Arc<EventBus>,
}

impl EditorContext {
    /// Restore the stored document, or start a fresh one
    pub async fn load(config: AppConfig, store: Arc<dyn KeyValueStore>, events: Arc<EventBus>) -> Self {
        let (document, restored) = match read_document(store.as_ref(), &config.editor).await {
            Ok(Some(document)) => (document, true),
            Ok(None) => (Document::new(config.editor.default_title.clone()), false),
            Err(e) => {
                warn!("Stored document is unusable, starting fresh: {}", e);
                events.notify(
                    NotifyLevel::Warning,
                    "The saved document could not be restored; a new document was started",
                );
                (Document::new(config.editor.default_title.clone()), false)
            }
        };

        let mut exporter = Exporter::new(config.export.clone());
        if let Err(e) = exporter.load_stylesheet().await {
            events.notify(NotifyLevel::Warning, e.user_message());
        }

        let surface = RichSurface::new(document.content.clone());
        let mut executor = CommandExecutor::with_history_limit(config.editor.history_limit);
        executor.reset_history(&surface);
        executor.refresh_toolbar(&surface);

        let context = Self {
            scale: config.editor.view_scale(),
            autosave: AutoSave::from_config(&config.editor, Instant::now()),
            config,
            document,
            surface,
            executor,
            exporter,
            store,
            events,
        };

        info!("Loaded '{}' (restored: {})", context.document.title, restored);
        context.events.emit(Event::DocumentLoaded { restored });
        context.publish_derived();
        context
    }

    /// Attach a PDF renderer
    pub fn with_pdf(mut self, pdf: PdfExporter) -> Self {
        self.exporter = self.exporter.with_pdf(pdf);
        self
    }

    pub fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Document with the surface content folded in
    pub fn document(&mut self) -> &Document {
        self.sync_content();
        &self.document
    }

    pub fn surface(&self) -> &RichSurface {
        &self.surface
    }

    /// Direct access for typing; report the edit through `key_up` or `mouse_up`
    pub fn surface_mut(&mut self) -> &mut RichSurface {
        &mut self.surface
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    pub fn scale(&self) -> &ViewScale {
        &self.scale
    }

    pub fn is_dirty(&self) -> bool {
        self.executor.is_dirty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.title = title.into();
        self.changed();
    }

    pub fn set_zoom(&mut self, percent: u16) -> u16 {
        let percent = self.scale.set(percent);
        self.events.emit(Event::ZoomChanged(percent));
        percent
    }

    pub fn zoom_in(&mut self) -> u16 {
        let percent = self.scale.zoom_in();
        self.events.emit(Event::ZoomChanged(percent));
        percent
    }

    pub fn zoom_out(&mut self) -> u16 {
        let percent = self.scale.zoom_out();
        self.events.emit(Event::ZoomChanged(percent));
        percent
    }

    /// Run a toolbar command by name
    pub fn execute(&mut self, name: &str, value: Option<&str>, arg: Option<&str>) -> Result<CommandResult> {
        let result = self.executor.execute(&mut self.surface, name, value, arg);
        self.finish(result)
    }

    /// Remember the selection before a dialog opens
    pub fn capture_selection(&mut self) {
        self.executor.capture_selection(&self.surface);
    }

    pub fn link_prefill(&mut self) -> LinkRequest {
        self.executor.link_prefill(&self.surface)
    }

    pub fn insert_link(&mut self, request: &LinkRequest) -> Result<CommandResult> {
        let result = self.executor.insert_link(&mut self.surface, request);
        self.finish(result)
    }

    pub async fn insert_image(&mut self, request: &ImageRequest) -> Result<CommandResult> {
        let result = self.executor.insert_image(&mut self.surface, request).await;
        self.finish(result)
    }

    pub fn insert_video(&mut self, request: &VideoRequest) -> Result<CommandResult> {
        let result = self.executor.insert_video(&mut self.surface, request);
        self.finish(result)
    }

    pub fn insert_table(&mut self, rows: usize, cols: usize) -> Result<CommandResult> {
        let result = self.executor.insert_table(&mut self.surface, rows, cols);
        self.finish(result)
    }

    pub fn insert_code_block(&mut self) -> Result<CommandResult> {
        let result = self.executor.insert_code_block(&mut self.surface);
        self.finish(Ok(result))
    }

    pub fn insert_quote(&mut self) -> Result<CommandResult> {
        let result = self.executor.insert_quote(&mut self.surface);
        self.finish(Ok(result))
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(HistoryDirection::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(HistoryDirection::Redo)
    }

    fn step_history(&mut self, direction: HistoryDirection) -> bool {
        let applied = match direction {
            HistoryDirection::Undo => self.executor.undo(&mut self.surface),
            HistoryDirection::Redo => self.executor.redo(&mut self.surface),
        };
        if applied {
            self.events.emit(Event::HistoryApplied(direction));
            self.changed();
        }
        applied
    }

    pub async fn key_down(&mut self, input: &KeyInput) -> Result<KeyResponse> {
        let response = self.executor.on_key_down(&mut self.surface, input);
        match response {
            KeyResponse::Requested(Shortcut::Save) => self.save(true).await?,
            KeyResponse::Applied(Shortcut::Undo) => {
                self.events.emit(Event::HistoryApplied(HistoryDirection::Undo));
                self.changed();
            }
            KeyResponse::Applied(Shortcut::Redo) => {
                self.events.emit(Event::HistoryApplied(HistoryDirection::Redo));
                self.changed();
            }
            KeyResponse::Applied(_) | KeyResponse::QuoteExited => self.changed(),
            KeyResponse::Requested(_) | KeyResponse::Default => {}
        }
        Ok(response)
    }

    pub fn key_up(&mut self, input: &KeyInput) {
        if self.executor.on_key_up(&self.surface, input) {
            self.changed();
        } else {
            self.events.emit(Event::ToolbarUpdated(self.executor.toolbar()));
        }
    }

    pub fn mouse_up(&mut self) {
        if self.executor.on_mouse_up(&self.surface) {
            self.changed();
        } else {
            self.events.emit(Event::ToolbarUpdated(self.executor.toolbar()));
        }
    }

    /// Drive the auto-save timers
    pub async fn tick(&mut self, now: Instant) -> Result<Option<SaveTrigger>> {
        match self.autosave.tick(now) {
            Some(trigger) => {
                self.save(false).await?;
                Ok(Some(trigger))
            }
            None => Ok(None),
        }
    }

    /// Earliest instant the auto-save timers need attention
    pub fn next_deadline(&self) -> Instant {
        self.autosave.next_deadline()
    }

    /// Persist the document under the configured key
    pub async fn save(&mut self, manual: bool) -> Result<()> {
        match self.persist().await {
            Ok(stats) => {
                self.executor.mark_clean();
                self.autosave.mark_saved();
                info!("Saved '{}' ({} words)", self.document.title, stats.word_count);
                self.events.emit(Event::DocumentSaved { manual });
                self.events.emit(Event::SaveStatus(SaveStatus::Saved));
                self.events.emit(Event::StatsUpdated(stats));
                if manual {
                    self.events.notify(NotifyLevel::Success, "Document saved");
                }
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    async fn persist(&mut self) -> Result<DocumentStats> {
        self.sync_content();
        let stats = self.document.refresh_derived(Utc::now());
        let json = DocumentRecord::from_document(&self.document)?.to_json()?;
        self.store.set(&self.config.editor.storage_key, &json).await?;
        Ok(stats)
    }

    /// Replace the document with a file's contents and save
    pub async fn import(&mut self, path: &Path) -> Result<()> {
        self.sync_content();
        let imported = import_file(&self.document, path, &self.config.export.imported_title).await;
        let document = imported.map_err(|e| self.report(e))?;

        self.document = document;
        self.surface.set_content(self.document.content.clone());
        self.executor.record(&self.surface);
        self.executor.refresh_toolbar(&self.surface);
        self.config.add_recent_file(path.to_path_buf());

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.events.emit(Event::Imported { file_name });
        self.events.notify(NotifyLevel::Success, "Document imported");
        self.publish_derived();
        self.save(false).await
    }

    /// Build an export artifact of the current document
    pub async fn export(&mut self, format: ExportFormat, now: DateTime<Utc>) -> Result<ExportArtifact> {
        self.sync_content();
        let exported = self
            .exporter
            .export(&self.document, format, &mut self.scale, now)
            .await;
        let artifact = exported.map_err(|e| self.report(e))?;

        self.events.emit(Event::Exported {
            format: format.to_string(),
            filename: artifact.filename.clone(),
        });
        self.events.notify(
            NotifyLevel::Success,
            format!("Exported as {}", format.extension().to_uppercase()),
        );
        Ok(artifact)
    }

    fn finish(&mut self, result: Result<CommandResult>) -> Result<CommandResult> {
        match result {
            Ok(result) => {
                if let Some(message) = &result.message {
                    self.events.notify(NotifyLevel::Success, message.clone());
                }
                self.changed();
                Ok(result)
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn changed(&mut self) {
        self.executor.mark_dirty();
        self.autosave.note_edit(Instant::now());
        self.events.emit(Event::DocumentChanged);
        self.events.emit(Event::SaveStatus(SaveStatus::Typing));
        self.events.emit(Event::ToolbarUpdated(self.executor.toolbar()));
        self.publish_derived();
    }

    fn publish_derived(&self) {
        let content = self.surface.content();
        self.events.emit(Event::StatsUpdated(DocumentStats::of(content)));
        self.events.emit(Event::OutlineUpdated(outline(content)));
    }

    fn sync_content(&mut self) {
        self.document.content = self.surface.content().clone();
    }

    fn report(&self, error: ProDocError) -> ProDocError {
        warn!("Operation failed: {}", error);
        self.events.notify(error.notify_level(), error.user_message());
        error
    }
}

async fn read_document(store: &dyn KeyValueStore, config: &EditorConfig) -> Result<Option<Document>> {
    let Some(json) = store.get(&config.storage_key).await? else {
        return Ok(None);
    };
    let document = DocumentRecord::parse(&json)?.into_document(&config.default_title)?;
    Ok(Some(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use prodoc_core::tree::{Block, Inline};
    use prodoc_editor::Selection;

    use crate::storage::MemoryStore;

    async fn context(store: Arc<MemoryStore>) -> (EditorContext, EventSubscription) {
        let events = Arc::new(EventBus::new());
        let subscription = events.subscribe();
        let ctx = EditorContext::load(AppConfig::default(), store, events).await;
        (ctx, subscription)
    }

    fn select_all(ctx: &mut EditorContext) {
        let content = ctx.surface().content();
        let selection = Selection::new(content.start_position(), content.end_position());
        ctx.surface_mut().select(selection);
    }

    fn type_text(ctx: &mut EditorContext, text: &str) {
        let tree = prodoc_core::RichTree::from_blocks(vec![Block::paragraph(vec![Inline::text(text)])]);
        ctx.surface_mut().set_content(tree);
        ctx.key_up(&KeyInput::char('x'));
    }

    fn notifications(events: &[Event]) -> Vec<(NotifyLevel, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::Notification { level, message } => Some((*level, message.clone())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fresh_document_when_store_empty() {
        let (mut ctx, events) = context(Arc::new(MemoryStore::new())).await;
        assert_eq!(ctx.document().title, "Untitled Document");
        assert!(matches!(
            events.drain().first(),
            Some(Event::DocumentLoaded { restored: false })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_record_falls_back() {
        let store = Arc::new(MemoryStore::new());
        store.set("prodoc_document", "{oops").await.unwrap();

        let (mut ctx, events) = context(store).await;
        assert_eq!(ctx.document().title, "Untitled Document");
        let events = events.drain();
        assert!(notifications(&events).iter().any(|(level, _)| *level == NotifyLevel::Warning));
        assert!(events.iter().any(|e| matches!(e, Event::DocumentLoaded { restored: false })));
    }

    #[tokio::test]
    async fn test_save_and_restore() {
        let store = Arc::new(MemoryStore::new());
        let (mut ctx, events) = context(store.clone()).await;
        ctx.set_title("Minutes");
        type_text(&mut ctx, "two words");
        ctx.save(true).await.unwrap();
        assert!(!ctx.is_dirty());

        let events = events.drain();
        assert!(events.iter().any(|e| matches!(e, Event::DocumentSaved { manual: true })));
        assert!(notifications(&events).contains(&(NotifyLevel::Success, "Document saved".to_string())));

        let (mut restored, events) = context(store).await;
        assert!(matches!(events.drain().first(), Some(Event::DocumentLoaded { restored: true })));
        let document = restored.document();
        assert_eq!(document.title, "Minutes");
        assert_eq!(document.plain_text(), "two words");
        assert_eq!(document.metadata["wordCount"], serde_json::Value::from(2));
    }

    #[tokio::test]
    async fn test_command_then_autosave() {
        let store = Arc::new(MemoryStore::new());
        let (mut ctx, _events) = context(store.clone()).await;
        type_text(&mut ctx, "Heading");
        select_all(&mut ctx);
        ctx.execute("formatBlock", Some("h1"), None).unwrap();
        assert!(ctx.is_dirty());

        let later = Instant::now() + Duration::from_millis(2600);
        assert_eq!(ctx.tick(later).await.unwrap(), Some(SaveTrigger::Debounce));
        assert!(!ctx.is_dirty());

        let json = store.get("prodoc_document").await.unwrap().unwrap();
        assert!(json.contains("<h1>Heading</h1>"));
    }

    #[tokio::test]
    async fn test_unknown_command_reported() {
        let (mut ctx, events) = context(Arc::new(MemoryStore::new())).await;
        events.drain();
        let err = ctx.execute("explode", None, None).unwrap_err();
        assert!(matches!(err, ProDocError::Validation(_)));
        assert_eq!(notifications(&events.drain())[0].0, NotifyLevel::Warning);
    }

    #[tokio::test]
    async fn test_undo_publishes_history_event() {
        let (mut ctx, events) = context(Arc::new(MemoryStore::new())).await;
        type_text(&mut ctx, "first");
        type_text(&mut ctx, "second");
        events.drain();

        assert!(ctx.undo());
        assert_eq!(ctx.document().plain_text(), "first");
        assert!(events
            .drain()
            .iter()
            .any(|e| matches!(e, Event::HistoryApplied(HistoryDirection::Undo))));
    }

    #[tokio::test]
    async fn test_failed_import_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, r#"{"title":"No content"}"#).await.unwrap();

        let (mut ctx, _events) = context(Arc::new(MemoryStore::new())).await;
        type_text(&mut ctx, "keep me");
        assert!(ctx.import(&path).await.is_err());
        assert_eq!(ctx.document().plain_text(), "keep me");
    }

    #[tokio::test]
    async fn test_import_records_history_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, "alpha\n\nbeta").await.unwrap();

        let store = Arc::new(MemoryStore::new());
        let (mut ctx, _events) = context(store.clone()).await;
        type_text(&mut ctx, "old");
        let before = ctx.executor().history().len();
        ctx.import(&path).await.unwrap();

        assert_eq!(ctx.document().title, "notes");
        assert_eq!(ctx.executor().history().len(), before + 1);
        assert!(store.get("prodoc_document").await.unwrap().is_some());

        assert!(ctx.undo());
        assert_eq!(ctx.document().plain_text(), "old");
    }

    #[tokio::test]
    async fn test_export_keeps_zoom() {
        let (mut ctx, events) = context(Arc::new(MemoryStore::new())).await;
        ctx.set_title("Report");
        type_text(&mut ctx, "body");
        ctx.set_zoom(130);

        let artifact = ctx.export(ExportFormat::Text, Utc::now()).await.unwrap();
        assert_eq!(artifact.filename, "Report.txt");
        assert_eq!(artifact.as_text(), Some("body"));
        assert_eq!(ctx.scale().percent(), 130);

        assert!(ctx.export(ExportFormat::Pdf, Utc::now()).await.is_err());
        assert_eq!(ctx.scale().percent(), 130);
        assert!(events
            .drain()
            .iter()
            .any(|e| matches!(e, Event::Exported { filename, .. } if filename == "Report.txt")));
    }
}
