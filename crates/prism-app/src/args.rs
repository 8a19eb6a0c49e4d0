// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for the `prism` binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use prism_core::{ArchiveConfig, ColorMode, FormType, OcrEngineKind, PaperSize, Side, SubjectId};
use prism_scanner::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "prism", version)]
#[command(about = "Scan paper forms, mask private fields, and archive searchable PDFs", long_about = None)]
pub struct Cli {
    /// 10-digit number of the person who submitted the forms
    #[arg(short = 'i', long, value_parser = SubjectId::parse)]
    pub subject_id: SubjectId,

    /// Form type code (0 = no redaction)
    #[arg(short = 't', long)]
    pub form_type: FormType,

    /// Number of forms to scan in this session
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,

    /// Date stamped on every artifact (YYYY-MM-DD, default today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Which sides of each form to scan
    #[arg(long, value_enum, default_value_t = SidesArg::Both)]
    pub sides: SidesArg,

    /// Scan both sides in one pass when the scanner supports it
    #[arg(long)]
    pub duplex: bool,

    /// Skip OCR text and PDF generation
    #[arg(long)]
    pub no_ocr: bool,

    /// Scanner backend: `sane`, `stub`, or `folder:<dir>` to import images
    #[arg(short, long, default_value = "sane", value_parser = parse_backend)]
    pub backend: BackendKind,

    /// Preferred scanner device name
    #[arg(long)]
    pub device: Option<String>,

    /// Settings file
    #[arg(short, long, default_value = prism_core::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory the Scans, Redactions and OCR folders live under
    #[arg(long)]
    pub archive_root: Option<PathBuf>,

    /// Directory holding the Form-<type>-<side>.png overlays
    #[arg(long)]
    pub overlay_dir: Option<PathBuf>,

    /// Scan resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Scanner colour mode
    #[arg(long, value_enum)]
    pub color_mode: Option<ColorArg>,

    /// Page size of the generated PDFs
    #[arg(long, value_enum)]
    pub page_size: Option<PageSizeArg>,

    /// OCR engine
    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,

    /// Directory holding the ocrs model files
    #[arg(long)]
    pub model_dir: Option<PathBuf>,

    /// Write a JSON run report here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SidesArg {
    Both,
    Front,
    Back,
}

impl SidesArg {
    pub fn sides(self) -> Vec<Side> {
        match self {
            Self::Both => Side::ALL.to_vec(),
            Self::Front => vec![Side::Front],
            Self::Back => vec![Side::Back],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    Tesseract,
    Ocrs,
}

impl From<EngineArg> for OcrEngineKind {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Tesseract => Self::Tesseract,
            EngineArg::Ocrs => Self::Ocrs,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Color,
    Gray,
    Lineart,
}

impl From<ColorArg> for ColorMode {
    fn from(mode: ColorArg) -> Self {
        match mode {
            ColorArg::Color => Self::Color,
            ColorArg::Gray => Self::Gray,
            ColorArg::Lineart => Self::Lineart,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PageSizeArg {
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PageSizeArg> for PaperSize {
    fn from(size: PageSizeArg) -> Self {
        match size {
            PageSizeArg::A4 => Self::A4,
            PageSizeArg::A5 => Self::A5,
            PageSizeArg::Letter => Self::Letter,
            PageSizeArg::Legal => Self::Legal,
        }
    }
}

fn parse_backend(raw: &str) -> Result<BackendKind, String> {
    match raw {
        "sane" => Ok(BackendKind::Sane),
        "stub" => Ok(BackendKind::Stub),
        _ => match raw.strip_prefix("folder:") {
            Some(dir) if !dir.is_empty() => Ok(BackendKind::Folder(PathBuf::from(dir))),
            _ => Err(format!(
                "unknown backend {raw:?}: expected sane, stub, or folder:<dir>"
            )),
        },
    }
}

impl Cli {
    /// Apply command-line overrides on top of the settings file.
    pub fn apply(&self, config: ArchiveConfig) -> ArchiveConfig {
        let mut config = match &self.archive_root {
            Some(root) => config.rooted_at(root),
            None => config,
        };
        if let Some(dir) = &self.overlay_dir {
            config.overlay_dir = dir.clone();
        }
        if let Some(dpi) = self.dpi {
            config.resolution_dpi = dpi;
        }
        if let Some(mode) = self.color_mode {
            config.color_mode = mode.into();
        }
        if let Some(size) = self.page_size {
            config.pdf_page_size = size.into();
        }
        if let Some(engine) = self.engine {
            config.ocr_engine = engine.into();
        }
        if let Some(dir) = &self.model_dir {
            config.ocr_model_dir = Some(dir.clone());
        }
        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        config
    }

    /// Folder imports need no paper handling.
    pub fn is_interactive(&self) -> bool {
        !matches!(self.backend, BackendKind::Folder(_))
    }
}
