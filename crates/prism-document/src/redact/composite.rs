// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Alpha compositing of a privacy mask over a page.
//
// Integer "over" operator on 8-bit channels:
//   alpha == 255  -> overlay pixel
//   alpha == 0    -> page pixel, bit-identical
//   otherwise     -> (ov * a + pg * (255 - a) + 127) / 255

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use tracing::debug;

use crate::raster::ImageProcessor;

/// Blend one channel.
#[inline]
fn blend_channel(page: u8, overlay: u8, alpha: u8) -> u8 {
    match alpha {
        255 => overlay,
        0 => page,
        a => {
            let a = u32::from(a);
            ((u32::from(overlay) * a + u32::from(page) * (255 - a) + 127) / 255) as u8
        }
    }
}

/// Composite `overlay` over `page`, stretching the overlay to the page's
/// dimensions first if they differ. The result is opaque RGB.
pub fn composite(page: &DynamicImage, overlay: &RgbaImage) -> RgbImage {
    let mut out = page.to_rgb8();
    let (width, height) = out.dimensions();

    let scaled;
    let mask = if overlay.dimensions() == (width, height) {
        overlay
    } else {
        debug!(
            overlay_w = overlay.width(),
            overlay_h = overlay.height(),
            width,
            height,
            "scaling overlay to page"
        );
        scaled = ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(overlay.clone()))
            .resize_exact(width, height, FilterType::Nearest)
            .into_dynamic()
            .to_rgba8();
        &scaled
    };

    for (dst, src) in out.pixels_mut().zip(mask.pixels()) {
        let [r, g, b, a] = src.0;
        if a == 0 {
            continue;
        }
        let [pr, pg, pb] = dst.0;
        *dst = Rgb([
            blend_channel(pr, r, a),
            blend_channel(pg, g, a),
            blend_channel(pb, b, a),
        ]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn blend_extremes_are_exact() {
        assert_eq!(blend_channel(17, 200, 0), 17);
        assert_eq!(blend_channel(17, 200, 255), 200);
    }

    #[test]
    fn blend_midpoint_rounds() {
        // (0 * 128 + 255 * 127 + 127) / 255 = 127
        assert_eq!(blend_channel(255, 0, 128), 127);
        assert_eq!(blend_channel(100, 100, 77), 100);
    }

    #[test]
    fn transparent_region_is_untouched() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_fn(6, 6, |x, y| {
            Rgb([x as u8 * 40, y as u8 * 40, 9])
        }));
        let mut overlay = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 0]));
        overlay.put_pixel(0, 0, Rgba([0, 0, 0, 255]));

        let out = composite(&page, &overlay);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        let source = page.to_rgb8();
        for (x, y, px) in out.enumerate_pixels() {
            if (x, y) != (0, 0) {
                assert_eq!(px, source.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn smaller_overlay_is_stretched_to_the_page() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        // Left half opaque black at 2x2; after nearest scaling the left 4 columns are black.
        let overlay = RgbaImage::from_fn(2, 2, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        let out = composite(&page, &overlay);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.get_pixel(0, 7), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(4, 3), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(7, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn compositing_twice_is_idempotent_for_binary_masks() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_fn(5, 5, |x, y| {
            Rgb([x as u8 * 50, y as u8 * 50, 128])
        }));
        let overlay = RgbaImage::from_fn(5, 5, |x, y| {
            if x == y {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 0, 0, 0])
            }
        });

        let once = composite(&page, &overlay);
        let twice = composite(&DynamicImage::ImageRgb8(once.clone()), &overlay);
        assert_eq!(once, twice);
    }
}
