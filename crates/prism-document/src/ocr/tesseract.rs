// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract backend — writes the page to a temporary PNG and runs
// `tesseract <file> stdout`.

use std::ffi::OsString;
use std::process::Command;

use image::DynamicImage;
use prism_core::error::PrismError;
use tracing::{debug, info, instrument, warn};

use super::TextExtractor;
use crate::raster::encode_png;

/// Runs the system `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: OsString,
    language: Option<String>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            program: OsString::from("tesseract"),
            language: None,
        }
    }
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable instead of `tesseract` on `PATH`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Recognition language, passed as `-l <lang>` (e.g. `eng`, `deu+eng`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Whether the executable can be launched at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl TextExtractor for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn extract_text(&self, image: &DynamicImage) -> Result<String, PrismError> {
        let png = encode_png(image)?;
        let input = tempfile::Builder::new()
            .prefix("prism-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| PrismError::OcrFailure(format!("cannot stage page for OCR: {err}")))?;
        std::fs::write(input.path(), &png)
            .map_err(|err| PrismError::OcrFailure(format!("cannot stage page for OCR: {err}")))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(input.path()).arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        debug!(?cmd, "running tesseract");

        let output = cmd.output().map_err(|err| {
            PrismError::OcrFailure(format!(
                "cannot run {}: {err}",
                self.program.to_string_lossy()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "tesseract exited with an error");
            return Err(PrismError::OcrFailure(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR complete"
        );
        Ok(text)
    }
}
