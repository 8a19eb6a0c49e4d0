// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-to-PDF generation.

pub mod writer;

pub use writer::PdfWriter;

use image::DynamicImage;
use prism_core::error::PrismError;

/// Renders one page image into a complete single-page PDF document.
pub trait ImagePdfWriter {
    fn write_pdf(&self, image: &DynamicImage) -> Result<Vec<u8>, PrismError>;
}
