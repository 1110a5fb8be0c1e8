//! Configuration management for uishot
//!
//! Settings for the browser, the capture geometry, and where captures are
//! written. Loaded from `.uishot/config.toml` (or an explicit path); every
//! field has a default so partial files are fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Category, Result, UishotError};

/// Default config location relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".uishot/config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UishotConfig {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Configuration for browser launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Browser window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Browser window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// User agent string
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Navigation timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Geometry and hover settings for element capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Margin added on every side of the element box
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// How far corner samples are pulled inside the box
    #[serde(default = "default_corner_inset")]
    pub corner_inset: f64,

    /// Categories that get a second, hovered capture
    #[serde(default = "default_hover_categories")]
    pub hover_categories: Vec<Category>,
}

/// Image encodings written by the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatKind {
    /// Lossless archival copy
    Png,
    /// Lossy preview
    Jpeg,
}

impl ImageFormatKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Output location and encodings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Root directory; one sub-directory per category
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_formats")]
    pub formats: Vec<ImageFormatKind>,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

// Default value providers
fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_padding() -> f64 {
    10.0
}

fn default_corner_inset() -> f64 {
    5.0
}

fn default_hover_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/images")
}

fn default_formats() -> Vec<ImageFormatKind> {
    vec![ImageFormatKind::Png, ImageFormatKind::Jpeg]
}

fn default_jpeg_quality() -> u8 {
    80
}

impl UishotConfig {
    /// Load configuration from `path`, or defaults if the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content).map_err(|e| {
                UishotError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| UishotError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the capture pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.capture.padding < 0.0 {
            return Err(UishotError::Config("capture.padding must be >= 0".to_string()));
        }
        if self.capture.corner_inset < 0.0 {
            return Err(UishotError::Config(
                "capture.corner_inset must be >= 0".to_string(),
            ));
        }
        if self.output.formats.is_empty() {
            return Err(UishotError::Config(
                "output.formats must name at least one format".to_string(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(UishotError::Config(
                "output.jpeg_quality must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            corner_inset: default_corner_inset(),
            hover_categories: default_hover_categories(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            formats: default_formats(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}
