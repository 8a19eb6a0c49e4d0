// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PRISM — Core types, errors, configuration, and artifact naming shared by all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod naming;
pub mod types;

pub use config::{ArchiveConfig, OcrEngineKind, SessionConfig};
pub use error::PrismError;
pub use naming::{Archive, ArtifactName};
pub use types::*;
