// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// prism-scanner — Scanner capability abstractions.
//
// Defines the backend trait used by the acquisition stage, the scoped device
// session that guarantees the scanner is released, and the concrete
// backends: SANE via `scanimage`, a folder of pre-scanned images, and a stub.

pub mod folder;
pub mod sane;
pub mod session;
pub mod stub;
pub mod traits;

pub use folder::FolderBackend;
pub use sane::ScanimageBackend;
pub use session::DeviceSession;
pub use stub::StubBackend;
pub use traits::{AcquireRequest, DeviceDescriptor, ScannerBackend};

/// Backend selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Sane,
    Folder(std::path::PathBuf),
    Stub,
}

/// Construct the backend for `kind`.
pub fn backend_for(kind: &BackendKind) -> Box<dyn ScannerBackend> {
    match kind {
        BackendKind::Sane => Box::new(ScanimageBackend::new()),
        BackendKind::Folder(dir) => Box::new(FolderBackend::new(dir.clone())),
        BackendKind::Stub => Box::new(StubBackend),
    }
}
