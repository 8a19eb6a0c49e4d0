// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// prism-pipeline — Session orchestration for PRISM.
//
// Coordinates acquisition of each logical form, runs redaction and
// extraction over every acquired page, and records the outcome in a run
// report.

pub mod acquire;
pub mod report;
pub mod run;

#[cfg(test)]
mod testing;

pub use acquire::{
    AcquisitionCoordinator, AcquisitionOutcome, AcquisitionSettings, AcquisitionState, HandOff,
    ImmediateOperator, Operator,
};
pub use report::{ArtifactRecord, FailureRecord, FormReport, FormStatus, RunReport};
pub use run::{RunController, RunState};
