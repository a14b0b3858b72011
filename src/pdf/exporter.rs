use std::sync::Arc;
use std::time::Instant;

use super::assemble::assemble;
use super::job::ExportJob;
use super::paginate::plan;
use super::raster::{RasterOptions, Rasterizer};
use super::snapshot;
use super::PdfError;

/// A finished export ready for download.
#[derive(Debug, Clone)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Runs snapshot, rasterize, paginate and assemble for one preview.
#[derive(Clone)]
pub struct PdfExporter {
    rasterizer: Arc<dyn Rasterizer>,
}

impl PdfExporter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Export a rendered preview element.
    pub async fn export(&self, preview_html: &str, job: &ExportJob) -> Result<ExportedPdf, PdfError> {
        job.validate()?;
        let title = document_title(job);
        let snapshot = snapshot::prepare_titled(preview_html, &title)?;
        self.render(&snapshot, job, &title).await
    }

    /// Export loose markup, laid out in a page-width container first.
    pub async fn export_markup(&self, markup: &str, job: &ExportJob) -> Result<ExportedPdf, PdfError> {
        job.validate()?;
        let title = document_title(job);
        let snapshot = snapshot::prepare_markup(markup, &title)?;
        self.render(&snapshot, job, &title).await
    }

    async fn render(&self, snapshot: &str, job: &ExportJob, title: &str) -> Result<ExportedPdf, PdfError> {
        let started = Instant::now();
        let format = job.page_format();
        let options = RasterOptions::for_page(&format, job.scale);

        let bitmap = self.rasterizer.rasterize(snapshot, &options).await?;
        let page_plan = plan(&bitmap, &format)?;
        let bytes = assemble(&bitmap, &page_plan, title)?;

        let filename = job.download_name();
        log::info!(
            "Exported {} ({} page(s), {}x{}px) in {:?}",
            filename,
            page_plan.page_count(),
            bitmap.width,
            bitmap.height,
            started.elapsed()
        );
        Ok(ExportedPdf {
            filename,
            bytes,
            pages: page_plan.page_count(),
        })
    }
}

fn document_title(job: &ExportJob) -> String {
    let name = job.download_name();
    name.strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(&name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::raster::Bitmap;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use parking_lot::Mutex;
    use std::io::Cursor;

    /// Returns a fixed-size bitmap and remembers what it was asked to render.
    struct FixedRasterizer {
        width: u32,
        height: u32,
        seen: Mutex<Vec<(String, RasterOptions)>>,
    }

    impl FixedRasterizer {
        fn new(width: u32, height: u32) -> Arc<Self> {
            Arc::new(Self {
                width,
                height,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Rasterizer for FixedRasterizer {
        async fn rasterize(&self, html: &str, options: &RasterOptions) -> Result<Bitmap, PdfError> {
            self.seen.lock().push((html.to_string(), *options));
            let mut png = Vec::new();
            RgbImage::new(self.width, self.height)
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|e| PdfError::Image(e.to_string()))?;
            Bitmap::from_png(png)
        }
    }

    struct FailingRasterizer;

    #[async_trait]
    impl Rasterizer for FailingRasterizer {
        async fn rasterize(&self, _html: &str, _options: &RasterOptions) -> Result<Bitmap, PdfError> {
            Err(PdfError::RasterizerExit(1))
        }
    }

    #[tokio::test]
    async fn short_preview_is_one_page() {
        let rasterizer = FixedRasterizer::new(210, 295);
        let exporter = PdfExporter::new(rasterizer.clone());
        let pdf = exporter
            .export("<div><p>hi</p></div>", &ExportJob::new("Leave_Application_EN.pdf"))
            .await
            .unwrap();
        assert_eq!(pdf.pages, 1);
        assert_eq!(pdf.filename, "Leave_Application_EN.pdf");
        assert!(pdf.bytes.starts_with(b"%PDF-"));

        let seen = rasterizer.seen.lock();
        assert_eq!(seen[0].1.width_px, 794);
        assert!(seen[0].0.contains("font-family: Arial, sans-serif"));
    }

    #[tokio::test]
    async fn tall_preview_spans_pages() {
        let exporter = PdfExporter::new(FixedRasterizer::new(210, 354));
        let pdf = exporter
            .export("<div>long</div>", &ExportJob::default())
            .await
            .unwrap();
        assert_eq!(pdf.pages, 2);
        assert_eq!(pdf.filename, "document.pdf");
    }

    #[tokio::test]
    async fn scale_is_passed_to_the_rasterizer() {
        let rasterizer = FixedRasterizer::new(100, 100);
        let exporter = PdfExporter::new(rasterizer.clone());
        exporter
            .export_markup("<p>x</p>", &ExportJob::default().with_scale(2.0))
            .await
            .unwrap();
        assert_eq!(rasterizer.seen.lock()[0].1.scale, 2.0);
    }

    #[tokio::test]
    async fn failures_surface_as_errors() {
        let exporter = PdfExporter::new(Arc::new(FailingRasterizer));
        let err = exporter
            .export("<div>x</div>", &ExportJob::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::RasterizerExit(1)));
        assert_eq!(err.user_message(), "PDF generation failed");

        let err = exporter
            .export("<div>x</div>", &ExportJob::default().with_scale(0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::InvalidScale(_)));

        let err = exporter.export("   ", &ExportJob::default()).await.unwrap_err();
        assert!(matches!(err, PdfError::MissingContent));
    }
}
