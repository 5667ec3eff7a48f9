//! Application Configuration
//! 
//! Manages editor settings:
//! - document defaults and history bounds
//! - auto-save timing
//! - zoom limits
//! - export options

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{ProDocError, Result};
use crate::view::ViewScale;

/// Editor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Title given to fresh documents
    pub default_title: String,
    /// Maximum number of undo snapshots kept
    pub history_limit: usize,
    /// Quiet period after an edit before auto-saving, in milliseconds
    pub autosave_debounce_ms: u64,
    /// Forced flush interval for unsaved changes, in milliseconds
    pub autosave_interval_ms: u64,
    /// Persistence key of the document record
    pub storage_key: String,
    /// Zoom bounds and step, in percent
    pub zoom_min: u16,
    pub zoom_max: u16,
    pub zoom_step: u16,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_title: "Untitled Document".to_string(),
            history_limit: 50,
            autosave_debounce_ms: 2500,
            autosave_interval_ms: 15000,
            storage_key: "prodoc_document".to_string(),
            zoom_min: 50,
            zoom_max: 200,
            zoom_step: 10,
        }
    }
}

impl EditorConfig {
    /// Zoom state built from the configured bounds
    pub fn view_scale(&self) -> ViewScale {
        ViewScale::new(self.zoom_min, self.zoom_max, self.zoom_step)
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name used when the document title is blank
    pub fallback_title: String,
    /// Title given to plain-text imports without a usable file stem
    pub imported_title: String,
    /// Pixel ratio used when capturing the page for PDF export
    pub pdf_pixel_ratio: f32,
    /// Extra stylesheet inlined into HTML exports
    pub stylesheet: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fallback_title: "Document".to_string(),
            imported_title: "Imported Document".to_string(),
            pdf_pixel_ratio: 2.0,
            stylesheet: None,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Editor settings
    pub editor: EditorConfig,
    /// Export settings
    pub export: ExportConfig,
    /// Recently imported or exported files
    pub recent_files: Vec<PathBuf>,
    /// Maximum recent files to store
    pub max_recent_files: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            editor: EditorConfig::default(),
            export: ExportConfig::default(),
            recent_files: Vec::new(),
            max_recent_files: 10,
        }
    }
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "prodoc", "ProDoc")
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get the data directory path (document storage)
    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Load configuration from the platform config file
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| ProDocError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from a file, writing defaults when it is missing
    pub async fn load_from(config_file: &PathBuf) -> Result<Self> {
        if config_file.exists() {
            debug!("Loading config from {:?}", config_file);
            let contents = tokio::fs::read_to_string(config_file).await?;
            let config: AppConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(config_file).await?;
            Ok(config)
        }
    }

    /// Save configuration to the platform config file
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| ProDocError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to a file
    pub async fn save_to(&self, config_file: &PathBuf) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(config_file, contents).await?;
        
        debug!("Config saved to {:?}", config_file);
        Ok(())
    }

    /// Add a recent file
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(self.max_recent_files);
    }
}
