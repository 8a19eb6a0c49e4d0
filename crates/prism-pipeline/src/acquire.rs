// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Acquisition coordinator — turns one logical form into zero or more pages.
//
// State machine per form:
//
//   Requested ─┬─ duplex attempt ─┬─ DuplexOk ───────────────────────┐
//              │                  ├─ DuplexPartial ─ Simplex(missing) ┤
//              │                  └─ (failed) ─ Simplex(front, back) ─┤
//              └─ Simplex(front) ─ Simplex(back) ────────────────────┴─ Done
//
// Every transition continues; only session-fatal errors (archive unusable,
// artifact already present, scanner gone) propagate.

use std::path::PathBuf;

use prism_core::error::{PrismError, Result};
use prism_core::{Archive, ArtifactName, ColorMode, LogicalForm, Side, Stage};
use prism_document::{Page, encode_png};
use prism_scanner::{AcquireRequest, DeviceSession};
use tracing::{info, instrument, warn};

/// A pause where the operator must place paper before the scanner runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOff {
    /// Place the sheet for a combined two-sided pass.
    Sheet { form: u32, of: u32 },
    /// Place one side of the sheet.
    Side { form: u32, of: u32, side: Side },
}

impl std::fmt::Display for HandOff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sheet { form, of } => {
                write!(f, "Form {form} of {of}: place the form to scan both sides")
            }
            Self::Side { form, of, side } => {
                write!(f, "Form {form} of {of}: place the {} side", side.as_str().to_uppercase())
            }
        }
    }
}

/// The person at the scanner.
pub trait Operator {
    /// Block until the paper for `hand_off` is in place.
    fn hand_off(&mut self, hand_off: &HandOff);

    /// A recoverable problem with form `form`, reported as it happens.
    fn notify(&mut self, _form: u32, _err: &PrismError) {}
}

/// Operator that never waits. Used for folder imports and tests.
#[derive(Debug, Default)]
pub struct ImmediateOperator {
    pub hand_offs: Vec<HandOff>,
}

impl Operator for ImmediateOperator {
    fn hand_off(&mut self, hand_off: &HandOff) {
        info!(%hand_off, "hand-off (not waiting)");
        self.hand_offs.push(hand_off.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Requested,
    DuplexOk,
    DuplexPartial,
    Simplex(Side),
    Done,
}

/// Scanner settings applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionSettings {
    pub resolution_dpi: u32,
    pub color_mode: ColorMode,
}

/// What one form's acquisition produced.
#[derive(Debug)]
pub struct AcquisitionOutcome {
    /// Acquired pages, front before back.
    pub pages: Vec<Page>,
    /// Scan artifacts written, parallel to `pages`.
    pub scans: Vec<(ArtifactName, PathBuf)>,
    /// Sides that could not be acquired.
    pub failures: Vec<PrismError>,
    /// Duplex downgrades (`DuplexUnsupported`, `DuplexPartial`, or a
    /// failed combined pass).
    pub mode_changes: Vec<PrismError>,
    /// The combined pass failed outright; duplex should not be retried.
    pub duplex_failed: bool,
    pub transitions: Vec<AcquisitionState>,
}

impl AcquisitionOutcome {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            scans: Vec::new(),
            failures: Vec::new(),
            mode_changes: Vec::new(),
            duplex_failed: false,
            transitions: vec![AcquisitionState::Requested],
        }
    }

    fn enter(&mut self, state: AcquisitionState) {
        info!(?state, "acquisition state");
        self.transitions.push(state);
    }

    pub fn has_pages(&self) -> bool {
        !self.pages.is_empty()
    }

    pub fn acquired_sides(&self) -> Vec<Side> {
        self.pages.iter().map(Page::side).collect()
    }
}

/// Drives the scanner for one form at a time.
pub struct AcquisitionCoordinator<'a> {
    session: &'a mut DeviceSession,
    operator: &'a mut dyn Operator,
    settings: AcquisitionSettings,
}

impl<'a> AcquisitionCoordinator<'a> {
    pub fn new(
        session: &'a mut DeviceSession,
        operator: &'a mut dyn Operator,
        settings: AcquisitionSettings,
    ) -> Self {
        Self {
            session,
            operator,
            settings,
        }
    }

    fn request(&self, side: Side, duplex: bool) -> AcquireRequest {
        AcquireRequest {
            side,
            resolution_dpi: self.settings.resolution_dpi,
            color_mode: self.settings.color_mode,
            duplex,
        }
    }

    /// Acquire `sides` of `form` and persist each page as a scan artifact.
    ///
    /// `progress` is the 1-based form index and the session's form count,
    /// used only for operator prompts.
    #[instrument(skip(self, archive, form), fields(form = %form))]
    pub fn acquire_form(
        &mut self,
        archive: &Archive,
        form: &LogicalForm,
        sides: &[Side],
        duplex: bool,
        progress: (u32, u32),
    ) -> Result<AcquisitionOutcome> {
        let (position, count) = progress;
        let mut outcome = AcquisitionOutcome::new();
        let mut pending: Vec<Side> = sides.to_vec();

        let wants_both = pending.contains(&Side::Front) && pending.contains(&Side::Back);
        if duplex && wants_both {
            if self.session.supports_duplex() {
                pending = self.attempt_duplex(&mut outcome, position, count)?;
            } else {
                warn!("duplex requested but the scanner cannot; scanning each side");
                outcome.mode_changes.push(PrismError::DuplexUnsupported);
            }
        }

        for side in pending {
            outcome.enter(AcquisitionState::Simplex(side));
            self.operator.hand_off(&HandOff::Side {
                form: position,
                of: count,
                side,
            });
            let request = self.request(side, false);
            match self.session.acquire(&request) {
                Ok(images) => match images.into_iter().next() {
                    Some(image) => outcome.pages.push(Page::new(side, image)),
                    None => outcome.failures.push(PrismError::Acquisition {
                        side,
                        detail: "scanner returned no image".into(),
                    }),
                },
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(side = %side, error = %err, "side not acquired");
                    outcome.failures.push(err);
                }
            }
        }
        outcome.enter(AcquisitionState::Done);

        // All pages are encoded before the first write.
        outcome.pages.sort_by_key(Page::side);
        let mut encoded = Vec::with_capacity(outcome.pages.len());
        for page in std::mem::take(&mut outcome.pages) {
            match encode_png(page.image()) {
                Ok(png) => encoded.push((page, png)),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    let side = page.side();
                    warn!(side = %side, error = %err, "page could not be stored");
                    outcome.failures.push(PrismError::Acquisition {
                        side,
                        detail: format!("page could not be stored: {err}"),
                    });
                }
            }
        }
        for (page, png) in encoded {
            let name = ArtifactName::new(form, page.side(), Stage::Scan);
            let path = archive.write_once(&name, &png)?;
            outcome.scans.push((name, path));
            outcome.pages.push(page);
        }

        info!(
            pages = outcome.pages.len(),
            failures = outcome.failures.len(),
            "Form acquired"
        );
        Ok(outcome)
    }

    /// One combined pass. Returns the sides still to be scanned singly.
    fn attempt_duplex(
        &mut self,
        outcome: &mut AcquisitionOutcome,
        position: u32,
        count: u32,
    ) -> Result<Vec<Side>> {
        self.operator.hand_off(&HandOff::Sheet {
            form: position,
            of: count,
        });

        let request = self.request(Side::Front, true);
        let images = match self.session.acquire(&request) {
            Ok(images) => images,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(error = %err, "duplex pass failed; falling back to single sides");
                outcome.duplex_failed = true;
                outcome.mode_changes.push(err);
                return Ok(Side::ALL.to_vec());
            }
        };

        // Feed order is front, then back.
        let mut images = images.into_iter();
        let mut pending = Vec::new();
        for side in Side::ALL {
            match images.next() {
                Some(image) => outcome.pages.push(Page::new(side, image)),
                None => pending.push(side),
            }
        }
        let extra = images.count();
        if extra > 0 {
            warn!(extra, "duplex pass returned more images than sides; extra images ignored");
        }

        match pending.as_slice() {
            [] => outcome.enter(AcquisitionState::DuplexOk),
            [Side::Front, Side::Back] => {
                warn!("duplex pass returned nothing; falling back to single sides");
                outcome.duplex_failed = true;
                outcome.mode_changes.push(PrismError::Acquisition {
                    side: Side::Front,
                    detail: "duplex pass returned no images".into(),
                });
            }
            missing => {
                outcome.enter(AcquisitionState::DuplexPartial);
                for &side in missing {
                    outcome
                        .mode_changes
                        .push(PrismError::DuplexPartial { missing: side });
                }
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBackend, blank, form, open_session};
    use image::{DynamicImage, Rgb32FImage};

    fn settings() -> AcquisitionSettings {
        AcquisitionSettings {
            resolution_dpi: 300,
            color_mode: ColorMode::Color,
        }
    }

    fn archive() -> (tempfile::TempDir, Archive) {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = Archive::under(dir.path());
        archive.ensure_layout().expect("layout");
        (dir, archive)
    }

    #[test]
    fn simplex_acquires_each_side_with_a_hand_off() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::simplex(vec![Ok(vec![blank()]), Ok(vec![blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, false, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front, Side::Back]);
        assert_eq!(outcome.scans.len(), 2);
        assert!(outcome.scans.iter().all(|(_, path)| path.is_file()));
        assert_eq!(
            operator.hand_offs,
            vec![
                HandOff::Side { form: 1, of: 1, side: Side::Front },
                HandOff::Side { form: 1, of: 1, side: Side::Back },
            ]
        );
    }

    #[test]
    fn duplex_request_on_simplex_scanner_downgrades() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::simplex(vec![Ok(vec![blank()]), Ok(vec![blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, true, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.pages.len(), 2);
        assert!(matches!(
            outcome.mode_changes.as_slice(),
            [PrismError::DuplexUnsupported]
        ));
        assert!(!outcome.duplex_failed);
    }

    #[test]
    fn full_duplex_pass_needs_one_hand_off() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::duplex(vec![Ok(vec![blank(), blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(4), &Side::ALL, true, (2, 3))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front, Side::Back]);
        assert!(outcome.transitions.contains(&AcquisitionState::DuplexOk));
        assert_eq!(operator.hand_offs, vec![HandOff::Sheet { form: 2, of: 3 }]);
    }

    #[test]
    fn partial_duplex_rescans_only_the_missing_side() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::duplex(vec![Ok(vec![blank()]), Ok(vec![blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, true, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front, Side::Back]);
        assert_eq!(
            outcome.transitions,
            vec![
                AcquisitionState::Requested,
                AcquisitionState::DuplexPartial,
                AcquisitionState::Simplex(Side::Back),
                AcquisitionState::Done,
            ]
        );
        assert!(matches!(
            outcome.mode_changes.as_slice(),
            [PrismError::DuplexPartial { missing: Side::Back }]
        ));
        assert_eq!(
            operator.hand_offs,
            vec![
                HandOff::Sheet { form: 1, of: 1 },
                HandOff::Side { form: 1, of: 1, side: Side::Back },
            ]
        );
    }

    #[test]
    fn failed_duplex_pass_falls_back_to_both_sides() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::duplex(vec![
            Err(PrismError::Acquisition {
                side: Side::Front,
                detail: "paper jam".into(),
            }),
            Ok(vec![blank()]),
            Ok(vec![blank()]),
        ]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, true, (1, 1))
            .expect("acquire");
        assert!(outcome.duplex_failed);
        assert_eq!(outcome.pages.len(), 2);
        assert!(outcome.failures.is_empty());
        assert_eq!(operator.hand_offs.len(), 3);
    }

    #[test]
    fn failed_side_is_recorded_and_the_other_still_scanned() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::simplex(vec![
            Err(PrismError::Acquisition {
                side: Side::Front,
                detail: "feeder empty".into(),
            }),
            Ok(vec![blank()]),
        ]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, false, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Back]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.scans.len(), 1);
        assert!(outcome.scans[0].1.ends_with("scan01_b_back.png"));
    }

    #[test]
    fn device_loss_is_fatal() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::simplex(vec![Err(PrismError::DeviceUnavailable(
            "unplugged".into(),
        ))]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let err = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, false, (1, 1))
            .err()
            .expect("fatal");
        assert!(matches!(err, PrismError::DeviceUnavailable(_)));
    }

    #[test]
    fn only_requested_sides_are_scanned() {
        let (_dir, archive) = archive();
        let backend = ScriptedBackend::duplex(vec![Ok(vec![blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &[Side::Front], true, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front]);
        assert_eq!(
            operator.hand_offs,
            vec![HandOff::Side { form: 1, of: 1, side: Side::Front }]
        );
    }

    #[test]
    fn extra_duplex_images_are_ignored() {
        let (dir, archive) = archive();
        let backend = ScriptedBackend::duplex(vec![Ok(vec![blank(), blank(), blank()])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, true, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front, Side::Back]);
        assert!(outcome.transitions.contains(&AcquisitionState::DuplexOk));
        assert!(outcome.mode_changes.is_empty());
        assert!(outcome.failures.is_empty());
        let stored = std::fs::read_dir(dir.path().join("Scans"))
            .expect("scans dir")
            .count();
        assert_eq!(stored, 2);
    }

    #[test]
    fn unstorable_page_is_a_side_failure_and_writes_nothing() {
        let (dir, archive) = archive();
        let unencodable = DynamicImage::ImageRgb32F(Rgb32FImage::new(20, 26));
        let backend = ScriptedBackend::simplex(vec![Ok(vec![blank()]), Ok(vec![unencodable])]);
        let mut session = open_session(backend);
        let mut operator = ImmediateOperator::default();
        let mut coordinator = AcquisitionCoordinator::new(&mut session, &mut operator, settings());

        let outcome = coordinator
            .acquire_form(&archive, &form(1), &Side::ALL, false, (1, 1))
            .expect("acquire");
        assert_eq!(outcome.acquired_sides(), vec![Side::Front]);
        assert_eq!(outcome.scans.len(), 1);
        assert!(matches!(
            outcome.failures.as_slice(),
            [PrismError::Acquisition { side: Side::Back, .. }]
        ));
        assert!(
            !dir.path()
                .join("Scans")
                .join("2026-03-14_Form2-1234567890_scan01_b_back.png")
                .exists()
        );
    }
}
