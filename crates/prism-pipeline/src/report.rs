// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run report — what a session produced and what went wrong, per form.
//
// Every artifact is listed with its SHA-256 digest so the archive can be
// checked against the report later. Serialised as JSON.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use prism_core::error::{PrismError, Result};
use prism_core::{ErrorScope, FormType, Side, Stage, SubjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

/// Lowercase hex SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash a file already written to the archive.
pub fn hash_file(path: &Path) -> Result<String> {
    let data = std::fs::read(path).map_err(|err| PrismError::io_unavailable(path, err))?;
    Ok(hash_bytes(&data))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    /// At least one page was acquired.
    Processed,
    /// No page was acquired; the sequence number was not consumed.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub stage: Stage,
    pub side: Side,
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// `None` when the failure is not tied to one side.
    pub side: Option<Side>,
    pub stage: Stage,
    pub scope: ErrorScope,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormReport {
    /// 1-based position within the session.
    pub index: u32,
    /// Sequence number the form was attempted under.
    pub sequence: u32,
    pub status: FormStatus,
    pub artifacts: Vec<ArtifactRecord>,
    pub failures: Vec<FailureRecord>,
    /// Duplex downgrades and similar mode changes.
    pub notices: Vec<String>,
}

impl FormReport {
    pub fn new(index: u32, sequence: u32) -> Self {
        Self {
            index,
            sequence,
            status: FormStatus::Skipped,
            artifacts: Vec::new(),
            failures: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn record_artifact(&mut self, stage: Stage, side: Side, path: PathBuf) -> Result<()> {
        let sha256 = hash_file(&path)?;
        debug!(path = %path.display(), %sha256, "artifact recorded");
        self.artifacts.push(ArtifactRecord {
            stage,
            side,
            path,
            sha256,
        });
        Ok(())
    }

    pub fn record_failure(&mut self, side: Option<Side>, stage: Stage, err: &PrismError) {
        self.failures.push(FailureRecord {
            side,
            stage,
            scope: err.scope(),
            message: err.to_string(),
        });
    }

    pub fn artifacts_for(&self, stage: Stage) -> impl Iterator<Item = &ArtifactRecord> {
        self.artifacts.iter().filter(move |a| a.stage == stage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub session_id: Uuid,
    pub date: NaiveDate,
    pub form_type: FormType,
    pub subject_id: SubjectId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub forms: Vec<FormReport>,
    /// Set when a session-fatal error stopped the run.
    pub halted: Option<String>,
}

impl RunReport {
    pub fn new(date: NaiveDate, form_type: FormType, subject_id: SubjectId) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            date,
            form_type,
            subject_id,
            started_at: Utc::now(),
            finished_at: None,
            forms: Vec::new(),
            halted: None,
        }
    }

    pub fn finish(&mut self, halted: Option<&PrismError>) {
        self.finished_at = Some(Utc::now());
        self.halted = halted.map(ToString::to_string);
    }

    pub fn processed(&self) -> usize {
        self.forms
            .iter()
            .filter(|f| f.status == FormStatus::Processed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.forms
            .iter()
            .filter(|f| f.status == FormStatus::Skipped)
            .count()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.forms.iter().flat_map(|f| f.artifacts.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.forms.iter().flat_map(|f| f.failures.iter())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Plain-text end-of-session summary for the operator.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Session {}\nForms processed: {}  skipped: {}\n",
            self.session_id,
            self.processed(),
            self.skipped()
        );
        for (label, stages) in [
            ("Scans", &[Stage::Scan][..]),
            ("Redacted images", &[Stage::Redacted][..]),
            ("OCR text and PDFs", &[Stage::OcrText, Stage::OcrPdf][..]),
        ] {
            let paths: Vec<&ArtifactRecord> = self
                .artifacts()
                .filter(|a| stages.contains(&a.stage))
                .collect();
            if paths.is_empty() {
                continue;
            }
            out.push_str(&format!("{label}:\n"));
            for artifact in paths {
                out.push_str(&format!("  {}\n", artifact.path.display()));
            }
        }
        let failures: Vec<&FailureRecord> = self.failures().collect();
        if !failures.is_empty() {
            out.push_str(&format!("Problems ({}):\n", failures.len()));
            for failure in failures {
                match failure.side {
                    Some(side) => out.push_str(&format!(
                        "  [{} {side}] {}\n",
                        failure.stage, failure.message
                    )),
                    None => out.push_str(&format!("  [{}] {}\n", failure.stage, failure.message)),
                }
            }
        }
        if let Some(reason) = &self.halted {
            out.push_str(&format!("Session stopped early: {reason}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn report() -> RunReport {
        RunReport::new(
            NaiveDate::from_ymd_opt(2026, 3, 14).expect("date"),
            FormType::TYPE_A,
            SubjectId::parse("1234567890").expect("id"),
        )
    }

    #[test]
    fn hash_known_values() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
        assert_eq!(
            hash_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn artifact_digest_matches_file_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("OCR_x.txt");
        std::fs::write(&path, b"hello").expect("write");

        let mut form = FormReport::new(1, 1);
        form.record_artifact(Stage::OcrText, Side::Front, path)
            .expect("record");
        assert_eq!(form.artifacts[0].sha256, hash_bytes(b"hello"));
    }

    #[test]
    fn json_round_trip_keeps_outcomes() {
        let mut run = report();
        let mut form = FormReport::new(1, 7);
        form.status = FormStatus::Processed;
        form.record_failure(Some(Side::Back), Stage::OcrText, &PrismError::OcrFailure("x".into()));
        run.forms.push(form);
        run.forms.push(FormReport::new(2, 8));
        run.finish(None);

        let json = run.to_json().expect("json");
        assert!(json.contains("\"processed\""));
        assert!(json.contains("\"skipped\""));
        let back: RunReport = serde_json::from_str(&json).expect("parse");
        assert_eq!(back.session_id, run.session_id);
        assert_eq!(back.processed(), 1);
        assert_eq!(back.skipped(), 1);
        assert_eq!(back.failures().next().map(|f| f.scope), Some(ErrorScope::Artifact));
    }

    #[test]
    fn summary_names_problems_and_halts() {
        let mut run = report();
        let mut form = FormReport::new(1, 1);
        form.record_failure(
            Some(Side::Back),
            Stage::Redacted,
            &PrismError::OverlayMissing {
                form_type: FormType::TYPE_A,
                side: Side::Back,
                path: "redaction-overlays/Form-2-back.png".into(),
            },
        );
        run.forms.push(form);
        run.finish(Some(&PrismError::DeviceUnavailable("unplugged".into())));

        let summary = run.summary();
        assert!(summary.contains("Problems (1)"));
        assert!(summary.contains("Form-2-back.png"));
        assert!(summary.contains("Session stopped early"));
    }
}
