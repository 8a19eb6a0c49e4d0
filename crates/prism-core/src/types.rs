// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the PRISM scan/redact/extract pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PrismError;

/// One face of a physical sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Both sides in feed order.
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    /// Marker embedded in artifact names. The leading letter keeps
    /// directory listings in front/back order.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Front => "a_front",
            Self::Back => "b_back",
        }
    }

    /// Lowercase word used in overlay asset names and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }

    /// Inverse of [`marker`](Self::marker).
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "a_front" => Some(Self::Front),
            "b_back" => Some(Self::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form class, identified by its numeric code.
///
/// Codes are open-ended so new form classes only need a new overlay pair on
/// disk. Code `0` is reserved for documents that carry nothing to mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormType(u16);

impl FormType {
    /// Overlay-exempt documents (memos, cover sheets).
    pub const NONE: FormType = FormType(0);
    pub const TYPE_A: FormType = FormType(2);
    pub const TYPE_B: FormType = FormType(3);

    pub const fn from_code(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Whether pages of this form class are composited against an overlay.
    pub fn requires_redaction(&self) -> bool {
        *self != Self::NONE
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FormType {
    type Err = PrismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u16>()
            .map(Self)
            .map_err(|_| PrismError::Config(format!("invalid form type {s:?}: expected a number")))
    }
}

/// Length of a subject identifier.
pub const SUBJECT_ID_LEN: usize = 10;

/// Fixed-length numeric identifier of the person who submitted a form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate and wrap a subject id (exactly ten ASCII digits).
    pub fn parse(raw: &str) -> Result<Self, PrismError> {
        if raw.len() == SUBJECT_ID_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(PrismError::InvalidSubjectId(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = PrismError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

/// One subject's physical multi-page submission within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalForm {
    pub date: NaiveDate,
    pub form_type: FormType,
    pub subject_id: SubjectId,
    /// Per-day counter; always greater than every number already on disk for `date`.
    pub sequence: u32,
}

impl std::fmt::Display for LogicalForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} form {} subject {} #{:02}",
            self.date.format("%Y-%m-%d"),
            self.form_type,
            self.subject_id,
            self.sequence
        )
    }
}

/// Pipeline stage that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Raw page as acquired from the scanner.
    Scan,
    /// Page composited against its privacy overlay.
    Redacted,
    /// Verbatim OCR output.
    OcrText,
    /// Single-page PDF embedding the (redacted or passthrough) image.
    OcrPdf,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Scan, Stage::Redacted, Stage::OcrText, Stage::OcrPdf];

    /// Filename prefix prepended to the canonical scan name.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Scan => "",
            Self::Redacted => "REDACTED_",
            Self::OcrText | Self::OcrPdf => "OCR_",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Scan | Self::Redacted => "png",
            Self::OcrText => "txt",
            Self::OcrPdf => "pdf",
        }
    }

    /// Recover the stage from a prefix/extension pair.
    pub fn from_parts(prefix: &str, extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.prefix() == prefix && stage.extension() == extension)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Scan => "scan",
            Self::Redacted => "redaction",
            Self::OcrText => "ocr-text",
            Self::OcrPdf => "ocr-pdf",
        })
    }
}

/// Colour mode requested from the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Color,
    Gray,
    Lineart,
}

impl ColorMode {
    /// SANE `--mode` value.
    pub fn sane_keyword(&self) -> &'static str {
        match self {
            Self::Color => "Color",
            Self::Gray => "Gray",
            Self::Lineart => "Lineart",
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// How far the consequences of an error reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorScope {
    /// One side of one form; the other side and later forms continue.
    Side,
    /// One derived artifact (OCR text, PDF); sibling artifacts continue.
    Artifact,
    /// One logical form; the session moves on to the next form.
    Form,
    /// The whole session must stop.
    Session,
}
