// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Naming authority — canonical artifact names, their parser, and the
// per-day sequence counter recovered from the archive on disk.
//
// Name layout (scan stage):
//
//   2026-03-14_Form2-1234567890_scan07_a_front.png
//   ^date      ^code ^subject   ^seq   ^side
//
// Later stages prepend a prefix and may change the extension:
//
//   REDACTED_2026-03-14_Form2-1234567890_scan07_a_front.png
//   OCR_2026-03-14_Form2-1234567890_scan07_a_front.txt
//   OCR_2026-03-14_Form2-1234567890_scan07_a_front.pdf

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::config::ArchiveConfig;
use crate::error::{PrismError, Result};
use crate::types::{FormType, LogicalForm, Side, Stage, SubjectId};

const DATE_FORMAT: &str = "%Y-%m-%d";
const SEQUENCE_DESIGNATOR: &str = "scan";

/// The full identity of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    pub date: NaiveDate,
    pub form_type: FormType,
    pub subject_id: SubjectId,
    pub sequence: u32,
    pub side: Side,
    pub stage: Stage,
}

impl ArtifactName {
    /// Name of the artifact produced by `stage` for one side of `form`.
    pub fn new(form: &LogicalForm, side: Side, stage: Stage) -> Self {
        Self {
            date: form.date,
            form_type: form.form_type,
            subject_id: form.subject_id.clone(),
            sequence: form.sequence,
            side,
            stage,
        }
    }

    /// Same form and side, different stage. All cross-stage derivations go
    /// through here rather than through string surgery on file names.
    pub fn with_stage(&self, stage: Stage) -> Self {
        Self {
            stage,
            ..self.clone()
        }
    }

    /// Render the canonical file name.
    pub fn file_name(&self) -> String {
        format!(
            "{prefix}{date}_Form{code}-{subject}_{designator}{seq:02}_{side}.{ext}",
            prefix = self.stage.prefix(),
            date = self.date.format(DATE_FORMAT),
            code = self.form_type.code(),
            subject = self.subject_id,
            designator = SEQUENCE_DESIGNATOR,
            seq = self.sequence,
            side = self.side.marker(),
            ext = self.stage.extension(),
        )
    }

    /// Parse a canonical file name. Only the exact spelling produced by
    /// [`file_name`](Self::file_name) is accepted.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || PrismError::InvalidArtifactName(name.to_owned());

        let (prefix, rest) = ["REDACTED_", "OCR_"]
            .into_iter()
            .find_map(|p| name.strip_prefix(p).map(|rest| (p, rest)))
            .unwrap_or(("", name));
        let (body, extension) = rest.rsplit_once('.').ok_or_else(invalid)?;
        let stage = Stage::from_parts(prefix, extension).ok_or_else(invalid)?;

        // date _ Form<code>-<subject> _ scan<seq> _ <a_front|b_back>
        let mut fields = body.splitn(4, '_');
        let date_field = fields.next().ok_or_else(invalid)?;
        let form_field = fields.next().ok_or_else(invalid)?;
        let seq_field = fields.next().ok_or_else(invalid)?;
        let side_field = fields.next().ok_or_else(invalid)?;

        let date = NaiveDate::parse_from_str(date_field, DATE_FORMAT).map_err(|_| invalid())?;

        let (code, subject) = form_field
            .strip_prefix("Form")
            .and_then(|f| f.split_once('-'))
            .ok_or_else(invalid)?;
        let form_type = FormType::from_code(parse_canonical_number(code).ok_or_else(invalid)?);
        let subject_id = SubjectId::parse(subject).map_err(|_| invalid())?;

        let sequence = seq_field
            .strip_prefix(SEQUENCE_DESIGNATOR)
            .and_then(parse_canonical_number)
            .filter(|seq| *seq >= 1)
            .ok_or_else(invalid)?;

        let side = Side::from_marker(side_field).ok_or_else(invalid)?;

        let parsed = Self {
            date,
            form_type,
            subject_id,
            sequence,
            side,
            stage,
        };
        // Rejects non-canonical spellings such as `2026-3-14` or `scan007`.
        if parsed.file_name() != name {
            return Err(invalid());
        }
        Ok(parsed)
    }
}

impl std::fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Digits only, no sign; leading-zero checks happen on re-render.
fn parse_canonical_number<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// The three sibling artifact directories.
#[derive(Debug, Clone)]
pub struct Archive {
    scans_dir: PathBuf,
    redacted_dir: PathBuf,
    extraction_dir: PathBuf,
}

impl Archive {
    pub fn new(
        scans_dir: impl Into<PathBuf>,
        redacted_dir: impl Into<PathBuf>,
        extraction_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scans_dir: scans_dir.into(),
            redacted_dir: redacted_dir.into(),
            extraction_dir: extraction_dir.into(),
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(
            &config.scans_dir,
            &config.redacted_dir,
            &config.extraction_dir,
        )
    }

    /// Standard layout under one root (`Scans`, `Redactions`, `OCR`).
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root.join("Scans"), root.join("Redactions"), root.join("OCR"))
    }

    fn dirs(&self) -> [&Path; 3] {
        [&self.scans_dir, &self.redacted_dir, &self.extraction_dir]
    }

    /// Create the artifact directories. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(dir).map_err(|err| PrismError::io_unavailable(dir, err))?;
        }
        debug!("archive layout ready");
        Ok(())
    }

    /// Directory holding artifacts of `stage`.
    pub fn dir_for(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Scan => &self.scans_dir,
            Stage::Redacted => &self.redacted_dir,
            Stage::OcrText | Stage::OcrPdf => &self.extraction_dir,
        }
    }

    pub fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.dir_for(name.stage).join(name.file_name())
    }

    /// Every parseable artifact name currently stored, in no particular order.
    pub fn artifacts(&self) -> Result<Vec<ArtifactName>> {
        let mut names = Vec::new();
        for dir in self.dirs() {
            let entries =
                std::fs::read_dir(dir).map_err(|err| PrismError::io_unavailable(dir, err))?;
            for entry in entries {
                let entry = entry.map_err(|err| PrismError::io_unavailable(dir, err))?;
                if let Some(parsed) = entry
                    .file_name()
                    .to_str()
                    .and_then(|name| ArtifactName::parse(name).ok())
                {
                    names.push(parsed);
                }
            }
        }
        Ok(names)
    }

    /// One past the highest sequence number on disk for `date`, or 1.
    ///
    /// Recomputed from the directory contents on every call, so an attempt
    /// that wrote nothing leaves no gap.
    #[instrument(skip(self), fields(date = %date))]
    pub fn next_sequence_number(&self, date: NaiveDate) -> Result<u32> {
        let highest = self
            .artifacts()?
            .into_iter()
            .filter(|name| name.date == date)
            .map(|name| name.sequence)
            .max()
            .unwrap_or(0);
        let next = highest.checked_add(1).ok_or_else(|| {
            PrismError::Config(format!("sequence numbers for {date} are exhausted"))
        })?;
        debug!(next, "next sequence number");
        Ok(next)
    }

    /// Persist `bytes` under `name`. Fails with `ArtifactExists` rather than
    /// overwrite an artifact from an earlier run.
    #[instrument(skip(self, bytes), fields(artifact = %name, len = bytes.len()))]
    pub fn write_once(&self, name: &ArtifactName, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::AlreadyExists => PrismError::ArtifactExists(path.clone()),
                _ => PrismError::io_unavailable(&path, err),
            })?;
        file.write_all(bytes)
            .and_then(|()| file.sync_all())
            .map_err(|err| PrismError::io_unavailable(&path, err))?;
        info!(path = %path.display(), "artifact written");
        Ok(path)
    }
}
