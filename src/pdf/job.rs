use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::PdfError;

/// Bottom allowance subtracted from the page height when stepping between
/// pages.
pub const PAGE_MARGIN_MM: f32 = 2.0;
pub const MAX_SCALE: f32 = 4.0;
pub const DEFAULT_FILENAME: &str = "document.pdf";

/// CSS reference resolution used to size the capture viewport.
const CSS_DPI: f32 = 96.0;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Physical page geometry in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    pub fn new(size: PaperSize, orientation: Orientation) -> Self {
        let (short, long) = match size {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
        };
        match orientation {
            Orientation::Portrait => Self {
                width_mm: short,
                height_mm: long,
            },
            Orientation::Landscape => Self {
                width_mm: long,
                height_mm: short,
            },
        }
    }

    /// Vertical distance between successive page slices (295mm on A4
    /// portrait).
    pub fn usable_height_mm(&self) -> f32 {
        self.height_mm - PAGE_MARGIN_MM
    }

    /// Capture width in CSS pixels for this page width.
    pub fn viewport_width_px(&self) -> u32 {
        (self.width_mm / MM_PER_INCH * CSS_DPI).round() as u32
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::new(PaperSize::A4, Orientation::Portrait)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ExportJob {
    pub filename: String,
    pub format: PaperSize,
    pub orientation: Orientation,
    /// Rasterization scale factor.
    pub scale: f32,
}

impl Default for ExportJob {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            format: PaperSize::A4,
            orientation: Orientation::Portrait,
            scale: 1.0,
        }
    }
}

impl ExportJob {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: PaperSize, orientation: Orientation) -> Self {
        self.format = format;
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn validate(&self) -> Result<(), PdfError> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > MAX_SCALE {
            return Err(PdfError::InvalidScale(self.scale));
        }
        Ok(())
    }

    pub fn page_format(&self) -> PageFormat {
        PageFormat::new(self.format, self.orientation)
    }

    /// Filename safe for a download header, always ending in `.pdf`.
    pub fn download_name(&self) -> String {
        let cleaned = sanitize_filename::sanitize(self.filename.trim());
        if cleaned.is_empty() {
            return DEFAULT_FILENAME.to_string();
        }
        if cleaned.to_ascii_lowercase().ends_with(".pdf") {
            cleaned
        } else {
            format!("{cleaned}.pdf")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_portrait_geometry() {
        let format = PageFormat::default();
        assert_eq!(format.width_mm, 210.0);
        assert_eq!(format.height_mm, 297.0);
        assert_eq!(format.usable_height_mm(), 295.0);
        assert_eq!(format.viewport_width_px(), 794);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let format = PageFormat::new(PaperSize::Letter, Orientation::Landscape);
        assert_eq!(format.width_mm, 279.4);
        assert_eq!(format.height_mm, 215.9);
    }

    #[test]
    fn defaults_and_partial_json() {
        let job: ExportJob = serde_json::from_str(r#"{"orientation": "landscape"}"#).unwrap();
        assert_eq!(job.filename, "document.pdf");
        assert_eq!(job.format, PaperSize::A4);
        assert_eq!(job.orientation, Orientation::Landscape);
        assert_eq!(job.scale, 1.0);
    }

    #[test]
    fn scale_bounds() {
        assert!(ExportJob::default().with_scale(2.0).validate().is_ok());
        assert!(ExportJob::default().with_scale(4.0).validate().is_ok());
        for bad in [0.0, -1.0, 4.5, f32::NAN, f32::INFINITY] {
            assert!(ExportJob::default().with_scale(bad).validate().is_err(), "{bad}");
        }
    }

    #[test]
    fn download_name_is_safe() {
        assert_eq!(ExportJob::new("Leave/Report").download_name(), "LeaveReport.pdf");
        assert_eq!(ExportJob::new("Report.PDF").download_name(), "Report.PDF");
        assert_eq!(ExportJob::new("   ").download_name(), "document.pdf");
    }
}
