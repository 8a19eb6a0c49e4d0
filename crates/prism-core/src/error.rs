// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PRISM.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ErrorScope, FormType, Side};

/// Top-level error type for all PRISM operations.
#[derive(Debug, Error)]
pub enum PrismError {
    // -- Acquisition --
    #[error("acquisition failed for {side} side: {detail}")]
    Acquisition { side: Side, detail: String },

    #[error("scanner does not support duplex acquisition")]
    DuplexUnsupported,

    #[error("duplex pass returned no {missing} side")]
    DuplexPartial { missing: Side },

    #[error("no scanner available: {0}")]
    DeviceUnavailable(String),

    // -- Redaction --
    #[error("redaction overlay for form {form_type} {side} side not found at {}", path.display())]
    OverlayMissing {
        form_type: FormType,
        side: Side,
        path: PathBuf,
    },

    #[error("redaction overlay {} is unusable: {detail}", path.display())]
    OverlayInvalid { path: PathBuf, detail: String },

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Extraction --
    #[error("OCR failed: {0}")]
    OcrFailure(String),

    #[error("PDF generation failed: {0}")]
    PdfWriteFailure(String),

    // -- Archive --
    #[error("artifact store unavailable at {}: {source}", path.display())]
    IoUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact already exists: {}", .0.display())]
    ArtifactExists(PathBuf),

    #[error("not a PRISM artifact name: {0}")]
    InvalidArtifactName(String),

    // -- Configuration --
    #[error("subject id must be exactly 10 digits, got {0:?}")]
    InvalidSubjectId(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrismError {
    /// Wrap an I/O error on the artifact store with the path that failed.
    pub fn io_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoUnavailable {
            path: path.into(),
            source,
        }
    }

    /// How far this error reaches into the run.
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::Acquisition { .. } | Self::DuplexPartial { .. } => ErrorScope::Side,
            Self::OverlayMissing { .. } | Self::OverlayInvalid { .. } | Self::ImageError(_) => {
                ErrorScope::Side
            }
            Self::OcrFailure(_) | Self::PdfWriteFailure(_) => ErrorScope::Artifact,
            Self::DuplexUnsupported => ErrorScope::Form,
            Self::InvalidArtifactName(_) => ErrorScope::Artifact,
            Self::InvalidSubjectId(_) | Self::Config(_) => ErrorScope::Session,
            Self::IoUnavailable { .. } | Self::ArtifactExists(_) | Self::DeviceUnavailable(_) => {
                ErrorScope::Session
            }
            Self::Io(_) | Self::Serialization(_) => ErrorScope::Session,
        }
    }

    /// Whether the session must halt.
    pub fn is_fatal(&self) -> bool {
        self.scope() == ErrorScope::Session
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrismError>;
