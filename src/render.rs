//! Turning gray slices into displayable RGB images.

use std::sync::LazyLock;

use image::{GrayImage, Rgb, RgbImage, buffer::ConvertBuffer};

use crate::errors::{Error, Result};
use crate::volume::{IntensityMapping, Volume};

/// Default weight of the warped slice in the overlay.
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.5;

// matplotlib "hot": piecewise-linear red, then green, then blue ramps.
const RED_END: f32 = 0.365079;
const GREEN_END: f32 = 0.746032;
const RED_START: f32 = 0.0416;

static HOT_LUT: LazyLock<[[u8; 3]; 256]> = LazyLock::new(|| {
    let mut lut = [[0u8; 3]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f32 / 255.0;
        let red = if x < RED_END {
            RED_START + (1.0 - RED_START) * x / RED_END
        } else {
            1.0
        };
        let green = ((x - RED_END) / (GREEN_END - RED_END)).clamp(0.0, 1.0);
        let blue = ((x - GREEN_END) / (1.0 - GREEN_END)).clamp(0.0, 1.0);
        // truncating, like scaling the float colour map by 255 and casting
        *entry = [
            (red * 255.0) as u8,
            (green * 255.0) as u8,
            (blue * 255.0) as u8,
        ];
    }
    lut
});

/// Colour of a gray level under the `hot` map.
pub fn hot_color(level: u8) -> [u8; 3] {
    HOT_LUT[level as usize]
}

pub fn gray_to_rgb(slice: &GrayImage) -> RgbImage {
    slice.convert()
}

pub fn hot(slice: &GrayImage) -> RgbImage {
    RgbImage::from_fn(slice.width(), slice.height(), |x, y| {
        Rgb(hot_color(slice.get_pixel(x, y)[0]))
    })
}

/// `overlay * alpha + base * (1 - alpha)`, rounded and saturated per channel.
pub fn blend(overlay: &RgbImage, base: &RgbImage, alpha: f32) -> Result<RgbImage> {
    if overlay.dimensions() != base.dimensions() {
        return Err(Error::SizeMismatch {
            left: overlay.dimensions(),
            right: base.dimensions(),
        });
    }

    let alpha = alpha.clamp(0.0, 1.0);
    let mut blended = base.clone();
    for (out, top) in blended.pixels_mut().zip(overlay.pixels()) {
        for channel in 0..3 {
            let value = top[channel] as f32 * alpha + out[channel] as f32 * (1.0 - alpha);
            out[channel] = value.round() as u8;
        }
    }
    Ok(blended)
}

/// The warped slice in `hot` colours over the gray fixed slice.
pub fn overlay(fixed: &GrayImage, warped: &GrayImage, alpha: f32) -> Result<RgbImage> {
    blend(&hot(warped), &gray_to_rgb(fixed), alpha)
}

/// Slice index to keep once a volume of `depth` is shown: the current one if
/// it still exists, otherwise the first slice.
pub fn slice_index_for_depth(z: usize, depth: usize) -> usize {
    if z >= depth { 0 } else { z }
}

/// What the warped pane shows at slice `z` of the fixed image.
///
/// `None` means a blank pane: `z` is past the warped depth or the slices
/// differ in size. Without a fixed image the warped slice is shown alone.
pub fn warped_view(
    fixed: Option<&Volume>,
    warped: &Volume,
    z: usize,
    mapping: IntensityMapping,
    alpha: f32,
) -> Option<RgbImage> {
    let warped_slice = warped.slice(z, mapping).ok()?;
    let fixed_slice = match fixed {
        Some(fixed) => match fixed.slice(z, mapping) {
            Ok(slice) => slice,
            Err(e) => {
                log::warn!("Cannot overlay warped image: {}", e);
                return None;
            }
        },
        None => return Some(hot(&warped_slice)),
    };

    match overlay(&fixed_slice, &warped_slice, alpha) {
        Ok(image) => Some(image),
        Err(e) => {
            log::warn!("Cannot overlay warped image: {}", e);
            None
        }
    }
}

/// RGBA bytes for toolkits that want them.
pub fn to_rgba(image: &RgbImage) -> Vec<u8> {
    let rgba: image::RgbaImage = image.convert();
    rgba.into_raw()
}
