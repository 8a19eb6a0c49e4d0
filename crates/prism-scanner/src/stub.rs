// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub backend for builds and machines without scanner support.
//
// Lists no devices, so opening a session fails with `DeviceUnavailable`
// before any form is attempted.

use image::DynamicImage;
use prism_core::error::{PrismError, Result};

use crate::traits::{AcquireRequest, DeviceDescriptor, ScannerBackend};

/// Backend with no devices.
pub struct StubBackend;

impl ScannerBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        tracing::warn!("ScannerBackend::list_devices called on stub backend");
        Ok(Vec::new())
    }

    fn open(&mut self, device: &DeviceDescriptor) -> Result<()> {
        Err(PrismError::DeviceUnavailable(format!(
            "stub backend cannot open {}",
            device.id
        )))
    }

    fn supports_duplex(&mut self, _device: &DeviceDescriptor) -> bool {
        false
    }

    fn acquire(
        &mut self,
        device: &DeviceDescriptor,
        _request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        Err(PrismError::DeviceUnavailable(format!(
            "stub backend cannot scan with {}",
            device.id
        )))
    }

    fn close(&mut self, _device: &DeviceDescriptor) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceSession;

    #[test]
    fn stub_session_never_opens() {
        let err = DeviceSession::open(Box::new(StubBackend), None)
            .err()
            .expect("stub has no devices");
        assert!(matches!(err, PrismError::DeviceUnavailable(_)));
    }
}
