// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder backend — feeds pre-scanned images from a directory, one per
// acquisition, in file-name order. Simplex only.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use prism_core::error::{PrismError, Result};
use tracing::{info, instrument};

use crate::traits::{AcquireRequest, DeviceDescriptor, ScannerBackend};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "pnm", "bmp"];

pub struct FolderBackend {
    dir: PathBuf,
    queue: VecDeque<PathBuf>,
}

impl FolderBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            queue: VecDeque::new(),
        }
    }

    /// Images not yet handed out.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl ScannerBackend for FolderBackend {
    fn name(&self) -> &str {
        "folder"
    }

    fn list_devices(&mut self) -> Result<Vec<DeviceDescriptor>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        Ok(vec![DeviceDescriptor::new(
            self.dir.display().to_string(),
            "image folder",
        )])
    }

    #[instrument(skip(self, device), fields(dir = %self.dir.display()))]
    fn open(&mut self, device: &DeviceDescriptor) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir).map_err(|err| {
            PrismError::DeviceUnavailable(format!("cannot read {}: {err}", device.id))
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();
        info!(images = files.len(), "Image folder opened");
        self.queue = files.into();
        Ok(())
    }

    fn supports_duplex(&mut self, _device: &DeviceDescriptor) -> bool {
        false
    }

    fn acquire(
        &mut self,
        _device: &DeviceDescriptor,
        request: &AcquireRequest,
    ) -> Result<Vec<DynamicImage>> {
        let side = request.side;
        let path = self.queue.pop_front().ok_or_else(|| PrismError::Acquisition {
            side,
            detail: "no images left in the folder".into(),
        })?;
        let image = image::open(&path).map_err(|err| PrismError::Acquisition {
            side,
            detail: format!("cannot read {}: {err}", path.display()),
        })?;
        info!(path = %path.display(), side = %side, "Imported page");
        Ok(vec![image])
    }

    fn close(&mut self, _device: &DeviceDescriptor) {
        self.queue.clear();
    }
}
