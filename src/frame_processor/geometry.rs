// SPDX-License-Identifier: GPL-3.0-only

//! Image and view geometry
//!
//! Detector output lives in sensor space. To draw it over the preview it has
//! to be brought into view space, which depends on how the sensor is rotated
//! relative to the display and on how large the preview view is. The values
//! here are computed once per detection task and reused for every region.

use crate::backends::camera::types::{CameraFacing, SensorRotation};
use crate::errors::GeometryError;
use serde::{Deserialize, Serialize};

/// Image dimensions after normalising for rotation
///
/// For portrait rotations (±90°, ±270°) the width and height of the raw
/// image are swapped; otherwise they pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    width: u32,
    height: u32,
    rotation: i32,
    facing: CameraFacing,
}

impl ImageDimensions {
    /// Compute rotation-normalised dimensions for a raw `width` x `height` image
    pub fn compute(width: u32, height: u32, rotation: i32, facing: CameraFacing) -> Self {
        let (width, height) = if SensorRotation::from_degrees_int(rotation).swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        };

        Self {
            width,
            height,
            rotation,
            facing,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Whether the caller should mirror overlays horizontally
    pub fn is_mirrored(&self) -> bool {
        self.facing.is_mirrored()
    }
}

/// View padding in view pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewPadding {
    pub left: i32,
    pub top: i32,
}

impl ViewPadding {
    pub fn new(left: i32, top: i32) -> Self {
        Self { left, top }
    }
}

/// Target preview view the detections are drawn into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    width: u32,
    height: u32,
    density: f32,
    padding: ViewPadding,
}

impl ViewGeometry {
    pub fn new(
        width: u32,
        height: u32,
        density: f32,
        padding: ViewPadding,
    ) -> Result<Self, GeometryError> {
        if !density.is_finite() || density <= 0.0 {
            return Err(GeometryError::InvalidDensity(density));
        }
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyView { width, height });
        }

        Ok(Self {
            width,
            height,
            density,
            padding,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn padding(&self) -> ViewPadding {
        self.padding
    }
}

/// Multipliers taking image-space pixels into view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// `view / (image * density)` per axis
    ///
    /// The image extent is multiplied by the density in single precision
    /// before the division, which is how the preview side computes it.
    pub fn new(image: &ImageDimensions, view: &ViewGeometry) -> Self {
        let scaled_width = image.width() as f32 * view.density();
        let scaled_height = image.height() as f32 * view.density();

        Self {
            x: view.width() as f64 / scaled_width as f64,
            y: view.height() as f64 / scaled_height as f64,
        }
    }

    pub fn identity() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}
