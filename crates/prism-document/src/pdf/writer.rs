// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — single-page PDFs from page images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use image::DynamicImage;
use prism_core::PaperSize;
use prism_core::error::PrismError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use super::ImagePdfWriter;

/// Nominal resolution used to size the embedded image before scaling.
const PLACEMENT_DPI: f32 = 300.0;

/// Creates one-page PDFs whose page is filled by a scanned image.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
        }
    }

    /// Writer for US Letter, the size of the paper forms.
    pub fn letter() -> Self {
        Self::new(PaperSize::Letter)
    }

    /// Document title; defaults to "PRISM Scan".
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Create a single-page PDF with `image` stretched to the full page.
    ///
    /// The image keeps its full pixel resolution; only the placement
    /// transform scales it, independently on each axis.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn create_from_image(&self, image: &DynamicImage) -> Result<Vec<u8>, PrismError> {
        let (img_width, img_height) = (image.width(), image.height());
        if img_width == 0 || img_height == 0 {
            return Err(PrismError::PdfWriteFailure("image has no pixels".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("PRISM Scan");
        info!(paper = ?self.paper_size, title, "Creating image PDF");

        let raw = RawImage {
            pixels: RawImageData::U8(image.to_rgb8().into_raw()),
            width: img_width as usize,
            height: img_height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let img_w_pt = img_width as f32 / PLACEMENT_DPI * 72.0;
        let img_h_pt = img_height as f32 / PLACEMENT_DPI * 72.0;
        let scale_x = page_w.into_pt().0 / img_w_pt;
        let scale_y = page_h.into_pt().0 / img_h_pt;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);
        debug!(scale_x, scale_y, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }
        if output.is_empty() {
            return Err(PrismError::PdfWriteFailure(
                "PDF serialisation produced no bytes".into(),
            ));
        }
        Ok(output)
    }
}

impl ImagePdfWriter for PdfWriter {
    fn write_pdf(&self, image: &DynamicImage) -> Result<Vec<u8>, PrismError> {
        self.create_from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page_image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(85, 110, Rgb([200, 10, 10])))
    }

    #[test]
    fn pdf_has_exactly_one_page() {
        let bytes = PdfWriter::letter()
            .create_from_image(&page_image())
            .expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));

        let doc = lopdf::Document::load_mem(&bytes).expect("parse pdf");
        assert_eq!(doc.get_pages().len(), 1);
    }

    fn title_of(bytes: &[u8]) -> Vec<u8> {
        let doc = lopdf::Document::load_mem(bytes).expect("parse pdf");
        let info = doc
            .trailer
            .get(b"Info")
            .and_then(lopdf::Object::as_reference)
            .expect("info reference");
        doc.get_dictionary(info)
            .and_then(|dict| dict.get(b"Title"))
            .and_then(lopdf::Object::as_str)
            .expect("title")
            .to_vec()
    }

    #[test]
    fn title_is_recorded_in_document_info() {
        let titled = PdfWriter::new(PaperSize::A4)
            .with_title("Form 2 1234567890 2026-03-14")
            .create_from_image(&page_image())
            .expect("pdf");
        assert_eq!(title_of(&titled), b"Form 2 1234567890 2026-03-14");

        let untitled = PdfWriter::letter()
            .create_from_image(&page_image())
            .expect("pdf");
        assert_eq!(title_of(&untitled), b"PRISM Scan");
    }

    #[test]
    fn empty_image_is_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            PdfWriter::letter().create_from_image(&empty),
            Err(PrismError::PdfWriteFailure(_))
        ));
    }
}
