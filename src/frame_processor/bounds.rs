// SPDX-License-Identifier: GPL-3.0-only

//! Sensor-space to view-space bounds mapping
//!
//! Detectors report boxes relative to the crop region they were given. The
//! mapping to view space runs in four fixed steps:
//!
//! 1. Crop offsets are landscape-relative; for a rotation of exactly 90° or
//!    -90° they are swapped. No other rotation swaps them, 270° included.
//! 2. The box is translated by the crop offsets into full-image space.
//! 3. Half of the view padding is added when the untranslated box edge lies
//!    in the first half of the raw image, and subtracted when it lies in the
//!    second half. An edge exactly on the midpoint is left alone. The
//!    midpoint comes from the raw image size, not the crop.
//! 4. Origin and size are multiplied by the per-axis scale factors.

use super::geometry::{ScaleFactors, ViewPadding};
use super::types::{BoundingBox, MappedBounds, MappedDetection, Origin, RawDetection, Size};
use crate::backends::camera::types::CropRect;

/// Crop offset within the raw image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropOffset {
    pub x: i32,
    pub y: i32,
}

impl CropOffset {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<CropRect> for CropOffset {
    fn from(crop: CropRect) -> Self {
        Self::new(crop.x as i32, crop.y as i32)
    }
}

/// Map one raw box into view space
pub fn map_bounds(
    raw: &BoundingBox,
    crop: CropOffset,
    rotation: i32,
    image_width: u32,
    image_height: u32,
    padding: ViewPadding,
    scale: ScaleFactors,
) -> MappedBounds {
    let (crop_x, crop_y) = if rotation == 90 || rotation == -90 {
        (crop.y, crop.x)
    } else {
        (crop.x, crop.y)
    };

    let x = raw.left + crop_x + padding_shift(raw.left, image_width, padding.left);
    let y = raw.top + crop_y + padding_shift(raw.top, image_height, padding.top);

    MappedBounds {
        origin: Origin {
            x: x as f64 * scale.x,
            y: y as f64 * scale.y,
        },
        size: Size {
            width: raw.width as f64 * scale.x,
            height: raw.height as f64 * scale.y,
        },
    }
}

/// Half-padding adjustment for a coordinate against the raw image midpoint
fn padding_shift(coordinate: i32, extent: u32, padding: i32) -> i32 {
    let midpoint = (extent / 2) as i32;
    let half_padding = padding / 2;

    match coordinate.cmp(&midpoint) {
        std::cmp::Ordering::Less => half_padding,
        std::cmp::Ordering::Greater => -half_padding,
        std::cmp::Ordering::Equal => 0,
    }
}

/// Per-task bounds mapper
///
/// Holds every input of [`map_bounds`] that is constant for a frame, so each
/// detection only supplies its raw box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsMapper {
    crop: CropOffset,
    rotation: i32,
    image_width: u32,
    image_height: u32,
    padding: ViewPadding,
    scale: ScaleFactors,
}

impl BoundsMapper {
    pub fn new(
        crop: CropOffset,
        rotation: i32,
        image_width: u32,
        image_height: u32,
        padding: ViewPadding,
        scale: ScaleFactors,
    ) -> Self {
        Self {
            crop,
            rotation,
            image_width,
            image_height,
            padding,
            scale,
        }
    }

    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    pub fn map(&self, raw: &BoundingBox) -> MappedBounds {
        map_bounds(
            raw,
            self.crop,
            self.rotation,
            self.image_width,
            self.image_height,
            self.padding,
            self.scale,
        )
    }

    /// Map a raw detection, carrying its payload through
    pub fn map_detection(&self, raw: &RawDetection) -> MappedDetection {
        MappedDetection::new(&raw.payload, self.map(&raw.bounds))
    }
}
