// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use diorama_scene::ViewportSize;

/// Physical pixel size of an element measured in CSS pixels.
///
/// Negative or non-finite inputs collapse to zero; a non-positive ratio is
/// treated as 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn device_pixel_size(css_width: f64, css_height: f64, pixel_ratio: f64) -> ViewportSize {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    };
    let scale = |css: f64| {
        let px = (css * ratio).round();
        if px.is_finite() && px > 0.0 {
            px.min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    };
    ViewportSize::new(scale(css_width), scale(css_height))
}
