// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory page images flowing between the pipeline stages.

use image::DynamicImage;
use prism_core::Side;

/// One acquired side of a logical form. Never mutated after capture.
#[derive(Debug, Clone)]
pub struct Page {
    side: Side,
    image: DynamicImage,
}

impl Page {
    pub fn new(side: Side, image: DynamicImage) -> Self {
        Self { side, image }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Pixel dimensions (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// Output of the redaction stage: either a masked composite or, for
/// overlay-exempt form types, the page itself.
#[derive(Debug, Clone)]
pub struct RedactedImage {
    side: Side,
    image: DynamicImage,
    masked: bool,
}

impl RedactedImage {
    pub(crate) fn masked(side: Side, image: DynamicImage) -> Self {
        Self {
            side,
            image,
            masked: true,
        }
    }

    pub(crate) fn passthrough(page: &Page) -> Self {
        Self {
            side: page.side,
            image: page.image.clone(),
            masked: false,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Whether an overlay was composited. Only masked images may be
    /// persisted as redacted artifacts.
    pub fn is_masked(&self) -> bool {
        self.masked
    }
}
