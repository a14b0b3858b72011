//! Page planning for a single tall bitmap.
//!
//! Every page places the whole bitmap, scaled to the page width, shifted up
//! by one usable page height per page. The page boundary clips what falls
//! outside, so no slicing of the bitmap happens.

use super::job::PageFormat;
use super::raster::Bitmap;
use super::PdfError;

/// Rounding slack so an image exactly one page tall never spills a blank page.
const EPSILON_MM: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub image_width_mm: f32,
    pub image_height_mm: f32,
    /// Top edge of the image relative to the top of each page: 0, -p, -2p, ...
    pub offsets_mm: Vec<f32>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.offsets_mm.len()
    }
}

pub fn plan(bitmap: &Bitmap, format: &PageFormat) -> Result<PagePlan, PdfError> {
    plan_dimensions(bitmap.width, bitmap.height, format)
}

pub fn plan_dimensions(
    width_px: u32,
    height_px: u32,
    format: &PageFormat,
) -> Result<PagePlan, PdfError> {
    if width_px == 0 || height_px == 0 {
        return Err(PdfError::EmptyBitmap);
    }

    let image_width_mm = format.width_mm;
    let image_height_mm = height_px as f32 * image_width_mm / width_px as f32;
    let step = format.usable_height_mm();

    let mut offsets_mm = vec![0.0];
    let mut remaining = image_height_mm - step;
    while remaining > EPSILON_MM {
        offsets_mm.push(-(offsets_mm.len() as f32) * step);
        remaining -= step;
    }

    Ok(PagePlan {
        page_width_mm: format.width_mm,
        page_height_mm: format.height_mm,
        image_width_mm,
        image_height_mm,
        offsets_mm,
    })
}
