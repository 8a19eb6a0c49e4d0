// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend-agnostic scanner capability.
//
// Every acquisition source (SANE, a folder of pre-scanned images, a test
// script) implements `ScannerBackend`. The pipeline only ever talks to a
// backend through a `DeviceSession`.

use image::DynamicImage;
use prism_core::error::Result;
use prism_core::{ColorMode, Side};

/// A scanner as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Backend-specific identifier, e.g. `epson2:net:192.168.1.5`.
    pub id: String,
    /// Human-readable description for device selection.
    pub description: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description, self.id)
    }
}

/// Parameters for one acquisition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireRequest {
    /// Side being placed. For a duplex request this is the side fed first.
    pub side: Side,
    pub resolution_dpi: u32,
    pub color_mode: ColorMode,
    /// Ask for both sides of the sheet in one pass.
    pub duplex: bool,
}

/// Source of page images.
pub trait ScannerBackend {
    /// Backend name for logs, e.g. "sane".
    fn name(&self) -> &str;

    /// Devices currently reachable. An empty list is not an error.
    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>>;

    /// Claim `device` for exclusive use.
    fn open(&mut self, device: &DeviceDescriptor) -> Result<()>;

    /// Whether `device` can scan both sides in one pass.
    fn supports_duplex(&mut self, device: &DeviceDescriptor) -> bool;

    /// Acquire images for `request`, in feed order. A simplex request
    /// yields at most one image; a duplex request at most two (front, back).
    fn acquire(
        &mut self,
        device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>>;

    /// Release `device`. Must be safe to call on every exit path.
    fn close(&mut self, device: &DeviceDescriptor);
}
