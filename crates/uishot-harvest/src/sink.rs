//! Output sink - persist capture records as image files
//!
//! Layout: `{base}/{category-dir}/{uuid}[-hover].{ext}`, one file per
//! configured encoding. Captures arrive as PNG and are written unchanged;
//! other encodings are re-encoded with the `image` crate.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uishot_core::{CaptureRecord, Category, ImageFormatKind, OutputSettings, Result, UishotError};

/// Destination for captured records
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Persist one record, returning every path written
    async fn persist(&self, record: &CaptureRecord) -> Result<Vec<PathBuf>>;
}

/// Re-encode raw PNG capture bytes into `format`
pub fn encode(bytes: &[u8], format: ImageFormatKind, jpeg_quality: u8) -> Result<Vec<u8>> {
    match format {
        ImageFormatKind::Png => Ok(bytes.to_vec()),
        ImageFormatKind::Jpeg => {
            let decoded = image::load_from_memory(bytes)
                .map_err(|e| UishotError::Encoding(format!("Failed to decode capture: {}", e)))?;
            // JPEG has no alpha channel
            let rgb = decoded.to_rgb8();

            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality)
                .encode_image(&rgb)
                .map_err(|e| UishotError::Encoding(format!("JPEG encoding failed: {}", e)))?;
            Ok(buf)
        }
    }
}

/// Writes records into one directory per category
#[derive(Debug, Clone)]
pub struct ImageDirectorySink {
    base_dir: PathBuf,
    formats: Vec<ImageFormatKind>,
    jpeg_quality: u8,
}

impl ImageDirectorySink {
    pub fn new(settings: &OutputSettings) -> Self {
        Self {
            base_dir: settings.dir.clone(),
            formats: settings.formats.clone(),
            jpeg_quality: settings.jpeg_quality,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create every category directory up front
    pub async fn prepare(&self) -> Result<()> {
        for category in Category::ALL {
            let dir = self.base_dir.join(category.dir_name());
            fs::create_dir_all(&dir).await.map_err(|e| {
                UishotError::Other(format!(
                    "Failed to create output directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Where `record` is stored in `format`
    pub fn path_for(&self, record: &CaptureRecord, format: ImageFormatKind) -> PathBuf {
        self.base_dir
            .join(record.category.dir_name())
            .join(format!("{}.{}", record.file_stem(), format.extension()))
    }
}

#[async_trait]
impl OutputSink for ImageDirectorySink {
    async fn persist(&self, record: &CaptureRecord) -> Result<Vec<PathBuf>> {
        let dir = self.base_dir.join(record.category.dir_name());
        fs::create_dir_all(&dir).await?;

        // A record lands in every format or in none
        let encoded = self
            .formats
            .iter()
            .map(|format| {
                let data = encode(&record.bytes, *format, self.jpeg_quality)?;
                Ok((self.path_for(record, *format), data))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(encoded.len());
        for (path, data) in encoded {
            if let Err(e) = fs::write(&path, &data).await {
                remove_all(&written).await;
                return Err(UishotError::Other(format!(
                    "Failed to write capture {}: {}",
                    path.display(),
                    e
                )));
            }
            debug!("Wrote {} ({} bytes)", path.display(), data.len());
            written.push(path);
        }

        Ok(written)
    }
}

/// Best-effort removal of a partially written record
async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove partial capture {}: {}", path.display(), e);
        }
    }
}
