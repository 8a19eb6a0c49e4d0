// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay assets — one privacy mask per (form type, side), loaded lazily from
// `<overlay_dir>/Form-<code>-<side>.png` and cached for the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use prism_core::error::{PrismError, Result};
use prism_core::{FormType, Side};
use tracing::{info, instrument};

use crate::raster::ImageProcessor;

/// Location of the overlay for `(form_type, side)` under `dir`.
pub fn overlay_path(dir: &Path, form_type: FormType, side: Side) -> PathBuf {
    dir.join(format!("Form-{}-{}.png", form_type.code(), side.as_str()))
}

/// Read-only set of privacy masks.
pub struct OverlayLibrary {
    dir: PathBuf,
    cache: HashMap<(FormType, Side), RgbaImage>,
}

impl OverlayLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether an overlay file exists for `(form_type, side)`.
    pub fn contains(&self, form_type: FormType, side: Side) -> bool {
        self.cache.contains_key(&(form_type, side))
            || overlay_path(&self.dir, form_type, side).is_file()
    }

    /// The overlay for `(form_type, side)` at its native size.
    ///
    /// Misses are not cached, so an overlay installed mid-session is picked
    /// up by the next form.
    #[instrument(skip(self), fields(form_type = %form_type, side = %side))]
    pub fn get(&mut self, form_type: FormType, side: Side) -> Result<&RgbaImage> {
        let key = (form_type, side);
        if !self.cache.contains_key(&key) {
            let overlay = load_overlay(&self.dir, form_type, side)?;
            self.cache.insert(key, overlay);
        }
        self.cache
            .get(&key)
            .ok_or_else(|| PrismError::OverlayMissing {
                form_type,
                side,
                path: overlay_path(&self.dir, form_type, side),
            })
    }
}

fn load_overlay(dir: &Path, form_type: FormType, side: Side) -> Result<RgbaImage> {
    let path = overlay_path(dir, form_type, side);
    if !path.is_file() {
        return Err(PrismError::OverlayMissing {
            form_type,
            side,
            path,
        });
    }

    let overlay = ImageProcessor::open(&path)
        .map_err(|err| PrismError::OverlayInvalid {
            path: path.clone(),
            detail: err.to_string(),
        })?
        .into_dynamic()
        .to_rgba8();

    // A fully transparent mask would produce "redacted" output identical to the scan.
    if overlay.pixels().all(|px| px.0[3] == 0) {
        return Err(PrismError::OverlayInvalid {
            path,
            detail: "overlay has no opaque region".into(),
        });
    }

    info!(
        path = %path.display(),
        width = overlay.width(),
        height = overlay.height(),
        "Overlay loaded"
    );
    Ok(overlay)
}
