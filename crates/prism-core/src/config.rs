// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Archive settings (persistent) and session settings (fixed for one run).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PrismError, Result};
use crate::types::{ColorMode, FormType, PaperSize, Side, SubjectId};

/// Default name of the settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "prism.json";

/// Which OCR engine produces the text artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcrEngineKind {
    /// The `tesseract` command-line tool.
    Tesseract,
    /// The built-in `ocrs` engine (requires the `ocr` feature and model files).
    Ocrs,
}

/// Persistent settings: where artifacts live and how pages are acquired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Raw scans.
    pub scans_dir: PathBuf,
    /// Overlay-composited images.
    pub redacted_dir: PathBuf,
    /// OCR text and PDF output.
    pub extraction_dir: PathBuf,
    /// Read-only privacy masks, `Form-<code>-<side>.png`.
    pub overlay_dir: PathBuf,
    pub resolution_dpi: u32,
    pub color_mode: ColorMode,
    /// Page size of generated PDFs.
    pub pdf_page_size: PaperSize,
    pub ocr_engine: OcrEngineKind,
    /// Model directory for the `ocrs` engine; the engine default is used when unset.
    pub ocr_model_dir: Option<PathBuf>,
    /// Preferred scanner; the first device found is used when unset.
    pub device: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            scans_dir: PathBuf::from("./Scans"),
            redacted_dir: PathBuf::from("./Redactions"),
            extraction_dir: PathBuf::from("./OCR"),
            overlay_dir: PathBuf::from("./redaction-overlays"),
            resolution_dpi: 300,
            color_mode: ColorMode::Color,
            pdf_page_size: PaperSize::Letter,
            ocr_engine: OcrEngineKind::Tesseract,
            ocr_model_dir: None,
            device: None,
        }
    }
}

impl ArchiveConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        debug!(path = %path.as_ref().display(), "archive config loaded");
        Ok(config)
    }

    /// Load settings if the file exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Re-root every relative directory under `base`.
    pub fn rooted_at(mut self, base: &Path) -> Self {
        for dir in [
            &mut self.scans_dir,
            &mut self.redacted_dir,
            &mut self.extraction_dir,
            &mut self.overlay_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        self
    }
}

/// Settings for one session, validated up front and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Calendar day stamped on every artifact of the run.
    pub date: NaiveDate,
    pub form_type: FormType,
    pub subject_id: SubjectId,
    /// Number of logical forms to process.
    pub form_count: u32,
    /// Sides acquired for each form, in feed order.
    pub sides: Vec<Side>,
    pub duplex_requested: bool,
    pub ocr_enabled: bool,
}

impl SessionConfig {
    pub fn new(
        date: NaiveDate,
        form_type: FormType,
        subject_id: SubjectId,
        form_count: u32,
        sides: Vec<Side>,
        duplex_requested: bool,
        ocr_enabled: bool,
    ) -> Result<Self> {
        if form_count == 0 {
            return Err(PrismError::Config("form count must be at least 1".into()));
        }
        let mut sides = sides;
        sides.sort();
        sides.dedup();
        if sides.is_empty() {
            return Err(PrismError::Config("at least one side must be scanned".into()));
        }
        Ok(Self {
            date,
            form_type,
            subject_id,
            form_count,
            sides,
            duplex_requested,
            ocr_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectId {
        SubjectId::parse("1234567890").expect("valid id")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ArchiveConfig =
            serde_json::from_str(r#"{ "resolution_dpi": 600 }"#).expect("parse");
        assert_eq!(config.resolution_dpi, 600);
        assert_eq!(config.scans_dir, PathBuf::from("./Scans"));
        assert_eq!(config.pdf_page_size, PaperSize::Letter);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let config = ArchiveConfig {
            device: Some("epson2:libusb:001:004".into()),
            ..Default::default()
        };
        config.save(&path).expect("save");
        let loaded = ArchiveConfig::load(&path).expect("load");
        assert_eq!(loaded.device.as_deref(), Some("epson2:libusb:001:004"));
    }

    #[test]
    fn rooted_at_keeps_absolute_dirs() {
        let config = ArchiveConfig {
            overlay_dir: PathBuf::from("/srv/overlays"),
            ..Default::default()
        }
        .rooted_at(Path::new("/data"));
        assert_eq!(config.scans_dir, PathBuf::from("/data/./Scans"));
        assert_eq!(config.overlay_dir, PathBuf::from("/srv/overlays"));
    }

    #[test]
    fn session_rejects_zero_forms_and_no_sides() {
        assert!(
            SessionConfig::new(today(), FormType::TYPE_A, subject(), 0, Side::ALL.to_vec(), false, true)
                .is_err()
        );
        assert!(SessionConfig::new(today(), FormType::TYPE_A, subject(), 1, vec![], false, true).is_err());
    }

    #[test]
    fn session_normalises_side_order() {
        let session = SessionConfig::new(
            today(),
            FormType::TYPE_A,
            subject(),
            1,
            vec![Side::Back, Side::Front, Side::Back],
            true,
            true,
        )
        .expect("valid session");
        assert_eq!(session.sides, vec![Side::Front, Side::Back]);
    }
}
