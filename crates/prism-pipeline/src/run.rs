// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run controller — sequences acquire → redact → extract across every form
// of a session.
//
// Policy: a form's failures never stop the next form. Only session-scoped
// errors (archive unusable, an artifact already present, scanner lost) end
// the run, and the report gathered so far is kept.

use prism_core::error::{PrismError, Result};
use prism_core::{Archive, ArtifactName, LogicalForm, SessionConfig, Side, Stage};
use prism_document::{Extractor, Page, Redactor, encode_png};
use prism_scanner::DeviceSession;
use tracing::{error, info, instrument, warn};

use crate::acquire::{AcquisitionCoordinator, AcquisitionSettings, Operator};
use crate::report::{FormReport, FormStatus, RunReport};

/// Mutable state threaded through a run.
#[derive(Debug)]
pub struct RunState {
    pub report: RunReport,
    /// Set after a combined duplex pass fails outright; later forms scan
    /// each side singly.
    pub duplex_disabled: bool,
}

impl RunState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            report: RunReport::new(config.date, config.form_type, config.subject_id.clone()),
            duplex_disabled: false,
        }
    }
}

pub struct RunController {
    config: SessionConfig,
    archive: Archive,
    session: DeviceSession,
    redactor: Redactor,
    extractor: Option<Extractor>,
    operator: Box<dyn Operator>,
    settings: AcquisitionSettings,
}

impl RunController {
    /// `extractor` is required when the session asks for OCR.
    pub fn new(
        config: SessionConfig,
        archive: Archive,
        session: DeviceSession,
        redactor: Redactor,
        extractor: Option<Extractor>,
        operator: Box<dyn Operator>,
        settings: AcquisitionSettings,
    ) -> Result<Self> {
        if config.ocr_enabled && extractor.is_none() {
            return Err(PrismError::Config(
                "OCR was requested but no OCR engine is configured".into(),
            ));
        }
        Ok(Self {
            config,
            archive,
            session,
            redactor,
            extractor,
            operator,
            settings,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Process every form of the session.
    ///
    /// On `Err` the session stopped early; `state.report` still holds every
    /// form attempted so far.
    #[instrument(skip_all, fields(
        date = %self.config.date,
        form_type = %self.config.form_type,
        forms = self.config.form_count,
    ))]
    pub fn run(&mut self, state: &mut RunState) -> Result<()> {
        let result = self.run_forms(state);
        match &result {
            Ok(()) => state.report.finish(None),
            Err(err) => {
                error!(error = %err, "session halted");
                state.report.finish(Some(err));
            }
        }
        info!(
            processed = state.report.processed(),
            skipped = state.report.skipped(),
            "Session finished"
        );
        result
    }

    fn run_forms(&mut self, state: &mut RunState) -> Result<()> {
        self.archive.ensure_layout()?;
        for index in 1..=self.config.form_count {
            // Re-derived every time so a skipped form leaves no gap.
            let sequence = self.archive.next_sequence_number(self.config.date)?;
            let form = LogicalForm {
                date: self.config.date,
                form_type: self.config.form_type,
                subject_id: self.config.subject_id.clone(),
                sequence,
            };
            let mut report = FormReport::new(index, sequence);
            let result = self.process_form(&form, index, &mut report, state);
            state.report.forms.push(report);
            result?;
        }
        Ok(())
    }

    #[instrument(skip(self, form, report, state), fields(form = %form))]
    fn process_form(
        &mut self,
        form: &LogicalForm,
        index: u32,
        report: &mut FormReport,
        state: &mut RunState,
    ) -> Result<()> {
        info!("Processing form");
        let duplex = self.config.duplex_requested && !state.duplex_disabled;
        let outcome = {
            let mut coordinator = AcquisitionCoordinator::new(
                &mut self.session,
                self.operator.as_mut(),
                self.settings,
            );
            coordinator.acquire_form(
                &self.archive,
                form,
                &self.config.sides,
                duplex,
                (index, self.config.form_count),
            )
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(error = %err, "form not acquired");
                self.record_failure(report, None, Stage::Scan, &err);
                return Ok(());
            }
        };

        if outcome.duplex_failed && !state.duplex_disabled {
            warn!("duplex disabled for the rest of the session");
            state.duplex_disabled = true;
        }
        for change in &outcome.mode_changes {
            self.operator.notify(report.index, change);
            report.notices.push(change.to_string());
        }
        for failure in &outcome.failures {
            self.record_failure(report, failure_side(failure), Stage::Scan, failure);
        }
        if !outcome.has_pages() {
            warn!("no pages acquired; form skipped");
            return Ok(());
        }
        report.status = FormStatus::Processed;

        for ((name, path), page) in outcome.scans.into_iter().zip(&outcome.pages) {
            report.record_artifact(Stage::Scan, name.side, path)?;
            self.process_page(page, &name, report)?;
        }
        Ok(())
    }

    /// Redact (or pass through) one page, then extract it.
    #[instrument(skip(self, page, report), fields(artifact = %name))]
    fn process_page(
        &mut self,
        page: &Page,
        name: &ArtifactName,
        report: &mut FormReport,
    ) -> Result<()> {
        let side = page.side();
        let redacted = match self.redactor.redact(page, self.config.form_type) {
            Ok(redacted) => redacted,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // Nothing derived from an unmasked page may be written.
                warn!(error = %err, "redaction failed; side not extracted");
                self.record_failure(report, Some(side), Stage::Redacted, &err);
                return Ok(());
            }
        };

        if redacted.is_masked() {
            let png = match encode_png(redacted.image()) {
                Ok(png) => png,
                Err(err) => {
                    self.record_failure(report, Some(side), Stage::Redacted, &err);
                    return Ok(());
                }
            };
            let path = self
                .archive
                .write_once(&name.with_stage(Stage::Redacted), &png)?;
            report.record_artifact(Stage::Redacted, side, path)?;
        }

        if !self.config.ocr_enabled {
            return Ok(());
        }
        let Some(extractor) = &self.extractor else {
            return Ok(());
        };
        let outcome = extractor.extract(&self.archive, redacted.image(), name)?;
        match outcome.text {
            Ok(path) => report.record_artifact(Stage::OcrText, side, path)?,
            Err(err) => self.record_failure(report, Some(side), Stage::OcrText, &err),
        }
        match outcome.pdf {
            Ok(path) => report.record_artifact(Stage::OcrPdf, side, path)?,
            Err(err) => self.record_failure(report, Some(side), Stage::OcrPdf, &err),
        }
        Ok(())
    }

    fn record_failure(
        &mut self,
        report: &mut FormReport,
        side: Option<Side>,
        stage: Stage,
        err: &PrismError,
    ) {
        self.operator.notify(report.index, err);
        report.record_failure(side, stage, err);
    }
}

fn failure_side(err: &PrismError) -> Option<Side> {
    match err {
        PrismError::Acquisition { side, .. } => Some(*side),
        PrismError::DuplexPartial { missing } => Some(*missing),
        PrismError::OverlayMissing { side, .. } => Some(*side),
        _ => None,
    }
}
