// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operator-facing error messages.
//
// Every technical error is mapped to a plain sentence plus the one thing the
// operator at the scanner should do next. The severity drives how loudly the
// CLI reports it.

use crate::error::PrismError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recorded; nothing to do unless the operator wants the missing output.
    Notice,
    /// The operator should act (rescan, fix an overlay) before filing the paper.
    ActionRequired,
    /// The session cannot continue.
    Fatal,
}

/// A readable error with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct OperatorNotice {
    pub message: String,
    pub suggestion: String,
    /// Whether rescanning the affected sheet would help.
    pub rescan: bool,
    pub severity: Severity,
}

/// Convert a `PrismError` into an `OperatorNotice`.
pub fn humanize_error(err: &PrismError) -> OperatorNotice {
    match err {
        PrismError::Acquisition { side, detail } => OperatorNotice {
            message: format!("The {side} side was not scanned."),
            suggestion: format!(
                "Check the sheet is seated in the feeder and rescan this form if the {side} side matters. ({detail})"
            ),
            rescan: true,
            severity: Severity::ActionRequired,
        },

        PrismError::DuplexUnsupported => OperatorNotice {
            message: "This scanner cannot scan both sides in one pass.".into(),
            suggestion: "Each side will be requested separately.".into(),
            rescan: false,
            severity: Severity::Notice,
        },

        PrismError::DuplexPartial { missing } => OperatorNotice {
            message: format!("The duplex pass did not return the {missing} side."),
            suggestion: format!("You will be asked to place the {missing} side on its own."),
            rescan: false,
            severity: Severity::Notice,
        },

        PrismError::DeviceUnavailable(detail) => OperatorNotice {
            message: "No scanner could be reached.".into(),
            suggestion: format!("Check the scanner is powered on and connected, then start again. ({detail})"),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::OverlayMissing {
            form_type,
            side,
            path,
        } => OperatorNotice {
            message: format!("No privacy overlay for the {side} side of form {form_type}; that side was NOT redacted."),
            suggestion: format!(
                "Install the overlay at {} and rescan, or redact the saved scan by hand.",
                path.display()
            ),
            rescan: true,
            severity: Severity::ActionRequired,
        },

        PrismError::OverlayInvalid { path, detail } => OperatorNotice {
            message: "A privacy overlay could not be used; the page was NOT redacted.".into(),
            suggestion: format!("Replace {} with a valid mask image. ({detail})", path.display()),
            rescan: true,
            severity: Severity::ActionRequired,
        },

        PrismError::ImageError(detail) => OperatorNotice {
            message: "A scanned image could not be processed.".into(),
            suggestion: format!("Rescan the sheet. ({detail})"),
            rescan: true,
            severity: Severity::ActionRequired,
        },

        PrismError::OcrFailure(detail) => OperatorNotice {
            message: "Text recognition failed for this page.".into(),
            suggestion: format!("The image and PDF are still saved; run OCR again later if the text is needed. ({detail})"),
            rescan: false,
            severity: Severity::Notice,
        },

        PrismError::PdfWriteFailure(detail) => OperatorNotice {
            message: "The PDF for this page could not be written.".into(),
            suggestion: format!("The image and text are still saved. ({detail})"),
            rescan: false,
            severity: Severity::Notice,
        },

        PrismError::IoUnavailable { path, source } => OperatorNotice {
            message: "The archive folders cannot be used.".into(),
            suggestion: format!(
                "Check that {} exists and is writable, then start again. ({source})",
                path.display()
            ),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::ArtifactExists(path) => OperatorNotice {
            message: "A file with this form's name already exists.".into(),
            suggestion: format!(
                "Nothing was overwritten. Move {} aside only if you are sure it is stale, then start again.",
                path.display()
            ),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::InvalidArtifactName(name) => OperatorNotice {
            message: "A file in the archive has an unexpected name.".into(),
            suggestion: format!("It was ignored. ({name})"),
            rescan: false,
            severity: Severity::Notice,
        },

        PrismError::InvalidSubjectId(raw) => OperatorNotice {
            message: "The subject number is not valid.".into(),
            suggestion: format!("Enter the 10-digit number exactly as printed on the form. (got {raw:?})"),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::Config(detail) => OperatorNotice {
            message: "The settings are not valid.".into(),
            suggestion: detail.clone(),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::Io(io_err) => OperatorNotice {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check disk space and permissions. ({io_err})"),
            rescan: false,
            severity: Severity::Fatal,
        },

        PrismError::Serialization(detail) => OperatorNotice {
            message: "A settings or report file is malformed.".into(),
            suggestion: format!("Fix or remove the file. ({detail})"),
            rescan: false,
            severity: Severity::Fatal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FormType, Side};

    #[test]
    fn fatal_notices_match_fatal_errors() {
        let errors = [
            PrismError::DeviceUnavailable("none".into()),
            PrismError::io_unavailable("/x", std::io::Error::other("denied")),
            PrismError::OcrFailure("boom".into()),
            PrismError::Acquisition {
                side: Side::Front,
                detail: "jam".into(),
            },
        ];
        for err in &errors {
            let notice = humanize_error(err);
            assert_eq!(notice.severity == Severity::Fatal, err.is_fatal(), "{err}");
        }
    }

    #[test]
    fn missing_overlay_warns_that_side_is_unredacted() {
        let notice = humanize_error(&PrismError::OverlayMissing {
            form_type: FormType::TYPE_B,
            side: Side::Back,
            path: "redaction-overlays/Form-3-back.png".into(),
        });
        assert!(notice.message.contains("NOT redacted"));
        assert!(notice.suggestion.contains("Form-3-back.png"));
        assert!(notice.rescan);
    }
}
