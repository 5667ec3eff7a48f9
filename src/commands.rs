//! CLI commands for ProDoc
//! 
//! Drives the editor engine from the command line: import files into the
//! stored document, export it, and inspect it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use prodoc_core::error::NotifyLevel;
use prodoc_core::events::EventSubscription;
use prodoc_core::{AppConfig, Document, Event, EventBus};
use prodoc_markup::{import_file, ExportFormat, Exporter};

use crate::context::EditorContext;
use crate::storage::{FileStore, KeyValueStore};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "prodoc")]
#[command(about = "Rich-text document editor engine")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored document
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace the stored document with a .json, .txt, .md or .html file
    Import(ImportCommand),
    /// Export the stored document, or convert a file directly
    Export(ExportCommand),
    /// Show statistics and the heading outline
    Stats(StatsCommand),
    /// Start a fresh document
    New(NewCommand),
}

fn parse_format(value: &str) -> std::result::Result<ExportFormat, String> {
    value.parse().map_err(|e: prodoc_core::ProDocError| e.user_message())
}

/// Shared state for one CLI invocation
pub struct App {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub events: Arc<EventBus>,
    config_path: Option<PathBuf>,
    subscription: EventSubscription,
}

impl App {
    pub async fn init(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AppConfig::load_from(path).await?,
            None => AppConfig::load().await?,
        };
        let store: Arc<dyn KeyValueStore> = match &cli.data_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(FileStore::open_default()?),
        };
        let events = Arc::new(EventBus::new());
        let subscription = events.subscribe();
        Ok(Self {
            config,
            store,
            events,
            config_path: cli.config.clone(),
            subscription,
        })
    }

    pub async fn save_config(&self) -> prodoc_core::Result<()> {
        match &self.config_path {
            Some(path) => self.config.save_to(path).await,
            None => self.config.save().await,
        }
    }

    pub async fn context(&self) -> EditorContext {
        EditorContext::load(self.config.clone(), self.store.clone(), self.events.clone()).await
    }

    /// Log pending notifications
    pub fn flush_notifications(&self) {
        for event in self.subscription.drain() {
            if let Event::Notification { level, message } = event {
                match level {
                    NotifyLevel::Warning | NotifyLevel::Error => warn!("{}", message),
                    NotifyLevel::Success | NotifyLevel::Info => info!("{}", message),
                }
            }
        }
    }
}

/// Import command options
#[derive(Args, Debug)]
pub struct ImportCommand {
    /// File to import
    pub file: PathBuf,
}

impl ImportCommand {
    pub async fn execute(&self, app: &mut App) -> Result<()> {
        let mut ctx = app.context().await;
        ctx.import(&self.file)
            .await
            .with_context(|| format!("Importing {}", self.file.display()))?;

        app.config.add_recent_file(self.file.clone());
        if let Err(e) = app.save_config().await {
            warn!("Could not update recent files: {}", e);
        }
        info!("Imported '{}'", ctx.document().title);
        Ok(())
    }
}

/// Export command options
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// docx, pdf, html, txt, md or json
    #[arg(short, long, value_parser = parse_format)]
    pub format: ExportFormat,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Convert this file instead of the stored document
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn execute(&self, app: &App) -> Result<PathBuf> {
        let artifact = match &self.input {
            Some(input) => {
                let blank = Document::new(app.config.editor.default_title.clone());
                let document = import_file(&blank, input, &app.config.export.imported_title)
                    .await
                    .with_context(|| format!("Reading {}", input.display()))?;

                let mut exporter = Exporter::new(app.config.export.clone());
                if let Err(e) = exporter.load_stylesheet().await {
                    warn!("Exporting without the extra stylesheet: {}", e);
                }
                let mut scale = app.config.editor.view_scale();
                exporter
                    .export(&document, self.format, &mut scale, Utc::now())
                    .await?
            }
            None => {
                let mut ctx = app.context().await;
                ctx.export(self.format, Utc::now()).await?
            }
        };

        let path = artifact.write_to(&self.out).await?;
        info!("Exported {} to {:?}", self.format, path);
        Ok(path)
    }
}

/// Stats command options
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Inspect this file instead of the stored document
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,
}

impl StatsCommand {
    pub async fn execute(&self, app: &App) -> Result<String> {
        let document = match &self.input {
            Some(input) => {
                let blank = Document::new(app.config.editor.default_title.clone());
                import_file(&blank, input, &app.config.export.imported_title).await?
            }
            None => app.context().await.document().clone(),
        };
        Ok(render_stats(&document))
    }
}

/// New command options
#[derive(Args, Debug)]
pub struct NewCommand {
    /// Title of the new document
    #[arg(short, long)]
    pub title: Option<String>,
}

impl NewCommand {
    pub async fn execute(&self, app: &App) -> Result<()> {
        app.store.remove(&app.config.editor.storage_key).await?;
        let mut ctx = app.context().await;
        if let Some(title) = &self.title {
            ctx.set_title(title.clone());
        }
        ctx.save(false).await?;
        info!("Started '{}'", ctx.document().title);
        Ok(())
    }
}

/// Human-readable statistics and outline
pub fn render_stats(document: &Document) -> String {
    let stats = document.stats();
    let mut out = format!(
        "{}\nWords: {}\nCharacters: {}\nParagraphs: {}\nReading time: {} min\n",
        document.title, stats.word_count, stats.char_count, stats.para_count, stats.reading_minutes
    );
    let outline = document.outline();
    if !outline.is_empty() {
        out.push_str("Outline:\n");
        for entry in outline {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            out.push_str(&format!("{}- {}\n", indent, entry.text));
        }
    }
    out
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let mut app = App::init(&cli).await?;
    let result = match &cli.command {
        Command::Import(cmd) => cmd.execute(&mut app).await,
        Command::Export(cmd) => cmd.execute(&app).await.map(|path| println!("{}", path.display())),
        Command::Stats(cmd) => cmd.execute(&app).await.map(|stats| print!("{}", stats)),
        Command::New(cmd) => cmd.execute(&app).await,
    };
    app.flush_notifications();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodoc_core::tree::{Block, Inline, RichTree};

    fn app(dir: &std::path::Path) -> App {
        let events = Arc::new(EventBus::new());
        let subscription = events.subscribe();
        App {
            config: AppConfig::default(),
            store: Arc::new(FileStore::new(dir.join("data"))),
            events,
            config_path: None,
            subscription,
        }
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from(["prodoc", "export", "--format", "md", "--out", "/tmp/x"]).unwrap();
        match cli.command {
            Command::Export(cmd) => {
                assert_eq!(cmd.format, ExportFormat::Markdown);
                assert_eq!(cmd.out, PathBuf::from("/tmp/x"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["prodoc", "export", "--format", "rtf"]).is_err());
    }

    #[test]
    fn test_render_stats() {
        let mut document = Document::new("Plan");
        document.content = RichTree::from_blocks(vec![
            Block::heading(1, vec![Inline::text("Goals")]),
            Block::heading(2, vec![Inline::text("Now")]),
            Block::paragraph(vec![Inline::text("ship it")]),
        ]);
        let out = render_stats(&document);
        assert!(out.starts_with("Plan\nWords: 4\n"));
        assert!(out.ends_with("Outline:\n- Goals\n  - Now\n"));
    }

    #[tokio::test]
    async fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("draft.txt");
        tokio::fs::write(&input, "one\n\ntwo").await.unwrap();

        let cmd = ExportCommand {
            format: ExportFormat::Markdown,
            out: dir.path().join("out"),
            input: Some(input),
        };
        let path = cmd.execute(&app(dir.path())).await.unwrap();
        assert!(path.ends_with("draft.md"));
        assert_eq!(tokio::fs::read_to_string(path).await.unwrap(), "one\n\ntwo");
    }

    #[tokio::test]
    async fn test_new_then_export_stored() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        NewCommand { title: Some("Fresh".into()) }.execute(&app).await.unwrap();
        let cmd = ExportCommand {
            format: ExportFormat::Json,
            out: dir.path().join("out"),
            input: None,
        };
        let path = cmd.execute(&app).await.unwrap();
        assert!(path.ends_with("Fresh.json"));
    }
}
