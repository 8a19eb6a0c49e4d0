// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction stage — OCR text and an image PDF for each redacted page.
//
// The two artifacts are independent: a recognition failure does not prevent
// the PDF and vice versa. Only archive failures (an existing file, an
// unwritable directory) abort the stage.

use std::path::PathBuf;

use image::DynamicImage;
use prism_core::error::{PrismError, Result};
use prism_core::{Archive, ArtifactName, Stage};
use tracing::{info, instrument, warn};

use crate::ocr::TextExtractor;
use crate::pdf::ImagePdfWriter;

/// Result of extracting one page. Each field is the written path or the
/// artifact-scoped failure that prevented it.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub text: std::result::Result<PathBuf, PrismError>,
    pub pdf: std::result::Result<PathBuf, PrismError>,
}

impl ExtractionOutcome {
    pub fn is_complete(&self) -> bool {
        self.text.is_ok() && self.pdf.is_ok()
    }

    /// Paths that were written.
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.text.iter().chain(self.pdf.iter())
    }

    /// Failures, in artifact order (text, then PDF).
    pub fn failures(&self) -> impl Iterator<Item = &PrismError> {
        self.text
            .as_ref()
            .err()
            .into_iter()
            .chain(self.pdf.as_ref().err())
    }
}

/// Produces `OCR_*.txt` and `OCR_*.pdf` for a page image.
pub struct Extractor {
    ocr: Box<dyn TextExtractor>,
    pdf: Box<dyn ImagePdfWriter>,
}

impl Extractor {
    pub fn new(ocr: Box<dyn TextExtractor>, pdf: Box<dyn ImagePdfWriter>) -> Self {
        Self { ocr, pdf }
    }

    pub fn engine_name(&self) -> &str {
        self.ocr.name()
    }

    /// Extract `image` into the archive. `name` identifies the page; its
    /// stage is replaced by the OCR stages.
    ///
    /// Returns `Err` only for failures that must stop the session.
    #[instrument(skip(self, archive, image), fields(artifact = %name, engine = self.ocr.name()))]
    pub fn extract(
        &self,
        archive: &Archive,
        image: &DynamicImage,
        name: &ArtifactName,
    ) -> Result<ExtractionOutcome> {
        let text = match self.ocr.extract_text(image) {
            Ok(text) => Ok(archive.write_once(&name.with_stage(Stage::OcrText), text.as_bytes())?),
            Err(err) => {
                warn!(error = %err, "OCR text not produced");
                Err(err)
            }
        };

        let pdf = match self.pdf.write_pdf(image) {
            Ok(bytes) => Ok(archive.write_once(&name.with_stage(Stage::OcrPdf), &bytes)?),
            Err(err) => {
                warn!(error = %err, "OCR PDF not produced");
                Err(err)
            }
        };

        let outcome = ExtractionOutcome { text, pdf };
        info!(complete = outcome.is_complete(), "Extraction finished");
        Ok(outcome)
    }
}
