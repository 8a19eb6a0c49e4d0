// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scoped scanner handle — one per run. The device is released when the
// session is dropped, including on early returns and panics.

use image::DynamicImage;
use prism_core::error::{PrismError, Result};
use tracing::{info, instrument, warn};

use crate::traits::{AcquireRequest, DeviceDescriptor, ScannerBackend};

pub struct DeviceSession {
    backend: Box<dyn ScannerBackend>,
    device: DeviceDescriptor,
    duplex_capable: bool,
}

impl DeviceSession {
    /// Select and open a device.
    ///
    /// `preferred` picks a device by id; otherwise the first device listed
    /// is used. No devices at all is `DeviceUnavailable`.
    #[instrument(skip(backend), fields(backend = backend.name()))]
    pub fn open(mut backend: Box<dyn ScannerBackend>, preferred: Option<&str>) -> Result<Self> {
        let devices = backend.list_devices()?;
        if devices.is_empty() {
            return Err(PrismError::DeviceUnavailable(format!(
                "no scanners found by the {} backend",
                backend.name()
            )));
        }

        let device = match preferred {
            Some(id) => devices
                .into_iter()
                .find(|d| d.id == id)
                .ok_or_else(|| PrismError::DeviceUnavailable(format!("scanner {id} not found")))?,
            None => devices
                .into_iter()
                .next()
                .ok_or_else(|| PrismError::DeviceUnavailable("no scanners found".into()))?,
        };

        backend.open(&device)?;
        let duplex_capable = backend.supports_duplex(&device);
        info!(device = %device, duplex_capable, "Scanner opened");

        Ok(Self {
            backend,
            device,
            duplex_capable,
        })
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn supports_duplex(&self) -> bool {
        self.duplex_capable
    }

    pub fn acquire(&mut self, request: &AcquireRequest) -> Result<Vec<DynamicImage>> {
        if request.duplex && !self.duplex_capable {
            warn!("duplex requested on a simplex device");
            return Err(PrismError::DuplexUnsupported);
        }
        self.backend.acquire(&self.device, request)
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.backend.close(&self.device);
        info!(device = %self.device, "Scanner released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use prism_core::{ColorMode, Side};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Backend that records lifecycle calls.
    struct Recording {
        devices: Vec<DeviceDescriptor>,
        duplex: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ScannerBackend for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
            Ok(self.devices.clone())
        }

        fn open(&mut self, device: &DeviceDescriptor) -> Result<()> {
            self.log.borrow_mut().push(format!("open {}", device.id));
            Ok(())
        }

        fn supports_duplex(&mut self, _device: &DeviceDescriptor) -> bool {
            self.duplex
        }

        fn acquire(
            &mut self,
            _device: &DeviceDescriptor,
            request: &AcquireRequest,
        ) -> Result<Vec<DynamicImage>> {
            self.log.borrow_mut().push(format!("acquire {}", request.side));
            Ok(vec![DynamicImage::ImageRgb8(RgbImage::new(2, 2))])
        }

        fn close(&mut self, device: &DeviceDescriptor) {
            self.log.borrow_mut().push(format!("close {}", device.id));
        }
    }

    fn backend(ids: &[&str], duplex: bool) -> (Box<dyn ScannerBackend>, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let devices = ids
            .iter()
            .map(|id| DeviceDescriptor::new(*id, "test scanner"))
            .collect();
        (
            Box::new(Recording {
                devices,
                duplex,
                log: Rc::clone(&log),
            }),
            log,
        )
    }

    fn request(duplex: bool) -> AcquireRequest {
        AcquireRequest {
            side: Side::Front,
            resolution_dpi: 300,
            color_mode: ColorMode::Color,
            duplex,
        }
    }

    #[test]
    fn no_devices_is_device_unavailable() {
        let (backend, _log) = backend(&[], false);
        let err = DeviceSession::open(backend, None).err().expect("no device");
        assert!(matches!(err, PrismError::DeviceUnavailable(_)));
    }

    #[test]
    fn preferred_device_is_selected() {
        let (backend, log) = backend(&["a", "b"], false);
        let session = DeviceSession::open(backend, Some("b")).expect("open");
        assert_eq!(session.device().id, "b");
        assert_eq!(log.borrow()[0], "open b");
    }

    #[test]
    fn unknown_preferred_device_is_device_unavailable() {
        let (backend, _log) = backend(&["a"], false);
        assert!(matches!(
            DeviceSession::open(backend, Some("zzz")).err(),
            Some(PrismError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn device_is_closed_on_drop() {
        let (backend, log) = backend(&["a"], true);
        {
            let mut session = DeviceSession::open(backend, None).expect("open");
            assert!(session.supports_duplex());
            session.acquire(&request(false)).expect("acquire");
        }
        assert_eq!(*log.borrow(), vec!["open a", "acquire front", "close a"]);
    }

    #[test]
    fn duplex_on_simplex_device_is_refused() {
        let (backend, log) = backend(&["a"], false);
        let mut session = DeviceSession::open(backend, None).expect("open");
        assert!(matches!(
            session.acquire(&request(true)),
            Err(PrismError::DuplexUnsupported)
        ));
        assert_eq!(log.borrow().len(), 1);
    }
}
