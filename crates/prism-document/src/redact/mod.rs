// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction engine — masks the privacy regions of each page before anything
// derived from it is persisted.

pub mod composite;
pub mod overlay;

pub use composite::composite;
pub use overlay::{OverlayLibrary, overlay_path};

use image::DynamicImage;
use prism_core::FormType;
use prism_core::error::Result;
use tracing::{info, instrument};

use crate::page::{Page, RedactedImage};

/// Applies the `(form_type, side)` overlay to pages.
pub struct Redactor {
    overlays: OverlayLibrary,
}

impl Redactor {
    pub fn new(overlays: OverlayLibrary) -> Self {
        Self { overlays }
    }

    pub fn overlays(&self) -> &OverlayLibrary {
        &self.overlays
    }

    /// Produce the redacted image for one page.
    ///
    /// Form types that need no redaction pass through unchanged. For every
    /// other type a missing or unusable overlay is an error; the caller must
    /// not fall back to the unmasked page.
    #[instrument(skip(self, page), fields(form_type = %form_type, side = %page.side()))]
    pub fn redact(&mut self, page: &Page, form_type: FormType) -> Result<RedactedImage> {
        if !form_type.requires_redaction() {
            return Ok(Self::passthrough(page));
        }

        let overlay = self.overlays.get(form_type, page.side())?;
        let masked = composite(page.image(), overlay);
        info!(
            width = masked.width(),
            height = masked.height(),
            "Page redacted"
        );
        Ok(RedactedImage::masked(
            page.side(),
            DynamicImage::ImageRgb8(masked),
        ))
    }

    /// The page itself, flagged as unmasked.
    pub fn passthrough(page: &Page) -> RedactedImage {
        RedactedImage::passthrough(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use prism_core::{PrismError, Side};
    use std::path::Path;

    fn blank_page(side: Side, w: u32, h: u32) -> Page {
        Page::new(
            side,
            DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([250, 250, 250]))),
        )
    }

    /// Overlay with an opaque black box over the top-left quadrant.
    fn install_overlay(dir: &Path, form_type: FormType, side: Side, w: u32, h: u32) {
        let mut mask = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
        draw_filled_rect_mut(
            &mut mask,
            Rect::at(0, 0).of_size(w / 2, h / 2),
            Rgba([0, 0, 0, 255]),
        );
        mask.save(overlay_path(dir, form_type, side)).expect("save overlay");
    }

    #[test]
    fn none_form_type_passes_through_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut redactor = Redactor::new(OverlayLibrary::new(dir.path()));
        let page = blank_page(Side::Front, 10, 10);

        let out = redactor.redact(&page, FormType::NONE).expect("passthrough");
        assert!(!out.is_masked());
        assert_eq!(out.image(), page.image());
    }

    #[test]
    fn overlay_masks_the_privacy_region() {
        let dir = tempfile::tempdir().expect("tempdir");
        install_overlay(dir.path(), FormType::TYPE_A, Side::Front, 20, 20);
        let mut redactor = Redactor::new(OverlayLibrary::new(dir.path()));

        let out = redactor
            .redact(&blank_page(Side::Front, 20, 20), FormType::TYPE_A)
            .expect("redact");
        assert!(out.is_masked());
        let rgb = out.image().to_rgb8();
        assert_eq!(rgb.get_pixel(2, 2), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(15, 15), &Rgb([250, 250, 250]));
    }

    #[test]
    fn overlay_of_a_different_size_is_scaled() {
        let dir = tempfile::tempdir().expect("tempdir");
        install_overlay(dir.path(), FormType::TYPE_B, Side::Back, 10, 10);
        let mut redactor = Redactor::new(OverlayLibrary::new(dir.path()));

        let out = redactor
            .redact(&blank_page(Side::Back, 40, 60), FormType::TYPE_B)
            .expect("redact");
        assert_eq!(out.image().dimensions(), (40, 60));
        let rgb = out.image().to_rgb8();
        assert_eq!(rgb.get_pixel(19, 29), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(20, 30), &Rgb([250, 250, 250]));
    }

    #[test]
    fn missing_side_overlay_fails_only_that_side() {
        let dir = tempfile::tempdir().expect("tempdir");
        install_overlay(dir.path(), FormType::TYPE_B, Side::Front, 10, 10);
        let mut redactor = Redactor::new(OverlayLibrary::new(dir.path()));

        assert!(
            redactor
                .redact(&blank_page(Side::Front, 10, 10), FormType::TYPE_B)
                .is_ok()
        );
        let err = redactor
            .redact(&blank_page(Side::Back, 10, 10), FormType::TYPE_B)
            .err()
            .expect("back overlay missing");
        assert!(matches!(
            err,
            PrismError::OverlayMissing {
                side: Side::Back,
                ..
            }
        ));
    }

    #[test]
    fn redacting_a_redacted_image_changes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        install_overlay(dir.path(), FormType::TYPE_A, Side::Front, 16, 16);
        let mut redactor = Redactor::new(OverlayLibrary::new(dir.path()));

        let first = redactor
            .redact(&blank_page(Side::Front, 16, 16), FormType::TYPE_A)
            .expect("first pass");
        let again = redactor
            .redact(
                &Page::new(Side::Front, first.image().clone()),
                FormType::TYPE_A,
            )
            .expect("second pass");
        assert_eq!(first.image(), again.image());
    }
}
