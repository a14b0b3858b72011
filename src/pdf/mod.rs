//! Paginated HTML-to-PDF export.
//!
//! A preview is snapshotted into a standalone print document, rasterized to
//! one tall bitmap, planned onto pages and assembled into a PDF in which every
//! page shows the same image shifted up by one page height.

pub mod assemble;
pub mod exporter;
pub mod guard;
pub mod job;
pub mod paginate;
pub mod raster;
pub mod snapshot;

pub use exporter::{ExportedPdf, PdfExporter};
pub use guard::{ExportGuard, ExportPermit};
pub use job::{ExportJob, Orientation, PageFormat, PaperSize};
pub use raster::{Bitmap, CommandRasterizer, RasterOptions, Rasterizer};

use thiserror::Error;

use crate::templates::Language;

/// Message shown to callers for any export failure.
pub const EXPORT_FAILED: &str = "PDF generation failed";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("scale must be finite and within (0, {max}], got {0}", max = job::MAX_SCALE)]
    InvalidScale(f32),
    #[error("preview has no content to export")]
    MissingContent,
    #[error("rasterized bitmap is empty")]
    EmptyBitmap,
    #[error("failed to decode bitmap: {0}")]
    Image(String),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write snapshot: {0}")]
    WriteSnapshot(#[source] std::io::Error),
    #[error("failed to launch rasterizer: {0}")]
    RasterizerIo(#[source] std::io::Error),
    #[error("rasterizer exited with status {0}")]
    RasterizerExit(i32),
    #[error("failed to read rasterized bitmap: {0}")]
    ReadBitmap(#[source] std::io::Error),
}

impl PdfError {
    pub fn user_message(&self) -> &'static str {
        EXPORT_FAILED
    }
}

/// Download name for a template export: every non-alphanumeric character of
/// the title becomes `_`, followed by the language suffix.
pub fn export_filename(template_title: &str, language: Language) -> String {
    let stem: String = template_title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}.pdf", stem, language.file_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_title() {
        assert_eq!(
            export_filename("Leave Application (निवेदन)", Language::Nepali),
            "Leave_Application__________NP.pdf"
        );
        assert_eq!(
            export_filename("CV/Resume Generator", Language::English),
            "CV_Resume_Generator_EN.pdf"
        );
    }

    #[test]
    fn every_error_has_the_generic_message() {
        assert_eq!(PdfError::EmptyBitmap.user_message(), "PDF generation failed");
        assert_eq!(
            PdfError::InvalidScale(9.0).to_string(),
            "scale must be finite and within (0, 4], got 9"
        );
    }
}
