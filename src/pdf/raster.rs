//! Rasterization of a print snapshot into a single bitmap.

use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::process::Command;

use super::job::PageFormat;
use super::PdfError;

pub const DEFAULT_RASTERIZER_BIN: &str = "wkhtmltoimage";

const SNAPSHOT_FILE: &str = "snapshot.html";
const OUTPUT_FILE: &str = "snapshot.png";

/// A rendered PNG together with its pixel dimensions.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Bitmap {
    pub fn from_png(png: Vec<u8>) -> Result<Self, PdfError> {
        let decoded =
            image::load_from_memory(&png).map_err(|e| PdfError::Image(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(PdfError::EmptyBitmap);
        }
        Ok(Self { png, width, height })
    }
}

/// Capture settings handed to a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Viewport width in CSS pixels.
    pub width_px: u32,
    pub scale: f32,
}

impl RasterOptions {
    pub fn for_page(format: &PageFormat, scale: f32) -> Self {
        Self {
            width_px: format.viewport_width_px(),
            scale,
        }
    }
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render `html` (a complete document) at its full scroll height.
    async fn rasterize(&self, html: &str, options: &RasterOptions) -> Result<Bitmap, PdfError>;
}

/// Drives an external HTML-to-image binary inside a scratch directory.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    binary: PathBuf,
}

impl CommandRasterizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn args(options: &RasterOptions) -> Vec<String> {
        vec![
            "--quiet".to_string(),
            "--disable-javascript".to_string(),
            "--format".to_string(),
            "png".to_string(),
            "--width".to_string(),
            options.width_px.to_string(),
            // Height 0 captures the full scroll height.
            "--height".to_string(),
            "0".to_string(),
            "--zoom".to_string(),
            options.scale.to_string(),
            SNAPSHOT_FILE.to_string(),
            OUTPUT_FILE.to_string(),
        ]
    }
}

impl Default for CommandRasterizer {
    fn default() -> Self {
        Self::new(DEFAULT_RASTERIZER_BIN)
    }
}

#[async_trait]
impl Rasterizer for CommandRasterizer {
    async fn rasterize(&self, html: &str, options: &RasterOptions) -> Result<Bitmap, PdfError> {
        let temp_dir = tempdir().map_err(PdfError::TempDir)?;
        tokio::fs::write(temp_dir.path().join(SNAPSHOT_FILE), html)
            .await
            .map_err(PdfError::WriteSnapshot)?;

        log::debug!(
            "Running {} at {}px, zoom {}",
            self.binary.display(),
            options.width_px,
            options.scale
        );
        let output = Command::new(&self.binary)
            .args(Self::args(options))
            .current_dir(temp_dir.path())
            .output()
            .await
            .map_err(PdfError::RasterizerIo)?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            log::warn!(
                "Rasterizer exited with {}: {}",
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(PdfError::RasterizerExit(code));
        }

        let png = tokio::fs::read(temp_dir.path().join(OUTPUT_FILE))
            .await
            .map_err(PdfError::ReadBitmap)?;
        Bitmap::from_png(png)
    }
}
