// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// prism-document — Page processing for the PRISM scanning pipeline.
//
// Provides overlay redaction (privacy masks composited over each page), text
// recognition, and image-to-PDF generation for the extraction stage.

pub mod extract;
pub mod ocr;
pub mod page;
pub mod pdf;
pub mod raster;
pub mod redact;

// Re-export the primary structs so callers can use `prism_document::Redactor` etc.
pub use extract::{ExtractionOutcome, Extractor};
pub use ocr::{FixedTextExtractor, TesseractCli, TextExtractor};
pub use page::{Page, RedactedImage};
pub use pdf::{ImagePdfWriter, PdfWriter};
pub use raster::{ImageProcessor, encode_png};
pub use redact::{OverlayLibrary, Redactor};

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
