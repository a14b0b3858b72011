//! PDF assembly with printpdf's ops API.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, XObjectTransform,
};

use super::paginate::PagePlan;
use super::raster::Bitmap;
use super::PdfError;

const PT_PER_MM: f32 = 72.0 / 25.4;

fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Build the PDF: one page per planned offset, each placing the full bitmap.
pub fn assemble(bitmap: &Bitmap, plan: &PagePlan, title: &str) -> Result<Vec<u8>, PdfError> {
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(PdfError::EmptyBitmap);
    }

    let mut doc = PdfDocument::new(title);
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let raw = RawImage::decode_from_bytes(&bitmap.png, &mut warnings)
        .map_err(|e| PdfError::Image(e.to_string()))?;
    if !warnings.is_empty() {
        log::debug!("{} warnings while decoding page image", warnings.len());
    }
    let image_id = doc.add_image(&raw);

    let page_height_pt = mm_to_pt(plan.page_height_mm);
    let image_height_pt = mm_to_pt(plan.image_height_mm);
    // At 72 dpi one bitmap pixel is one point.
    let scale_x = mm_to_pt(plan.image_width_mm) / bitmap.width as f32;
    let scale_y = image_height_pt / bitmap.height as f32;

    let pages = plan
        .offsets_mm
        .iter()
        .map(|&offset_mm| {
            // PDF origin is bottom-left; translate_y is the image's bottom edge.
            let bottom = page_height_pt - mm_to_pt(offset_mm) - image_height_pt;
            let ops = vec![Op::UseXobject {
                id: image_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(bottom)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            }];
            PdfPage::new(Mm(plan.page_width_mm), Mm(plan.page_height_mm), ops)
        })
        .collect::<Vec<_>>();

    doc.with_pages(pages);
    Ok(doc.save(&PdfSaveOptions::default(), &mut Vec::new()))
}
