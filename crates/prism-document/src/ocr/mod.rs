// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backends.
//
// The default backend shells out to the system `tesseract` binary. The pure
// Rust `ocrs` engine is available behind the `ocr` feature.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod engine;

pub use tesseract::TesseractCli;

#[cfg(feature = "ocr")]
pub use engine::{OcrConfig, OcrEngine};

use image::DynamicImage;
use prism_core::error::PrismError;

/// Something that can turn a page image into plain text.
pub trait TextExtractor {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Recognise all text on the page. An empty string is a valid result
    /// for a blank page; only engine failures are errors.
    fn extract_text(&self, image: &DynamicImage) -> Result<String, PrismError>;
}

/// Extractor returning a fixed string, for tests and dry runs.
pub struct FixedTextExtractor {
    text: String,
}

impl FixedTextExtractor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextExtractor for FixedTextExtractor {
    fn name(&self) -> &str {
        "fixed"
    }

    fn extract_text(&self, _image: &DynamicImage) -> Result<String, PrismError> {
        Ok(self.text.clone())
    }
}
