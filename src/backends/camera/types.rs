// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frames handed from the capture side to analysis tasks

//! Shared camera frame types

use crate::errors::FrameError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Reference-counted pixel storage
///
/// Frames are cloned cheaply when handed to background analysis; the
/// underlying bytes are never copied or mutated after capture.
#[derive(Clone)]
pub struct FrameData(Arc<[u8]>);

impl FrameData {
    /// Get the length of the frame data in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the frame data is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for FrameData {
    fn from(data: Vec<u8>) -> Self {
        FrameData(Arc::from(data))
    }
}

impl From<Arc<[u8]>> for FrameData {
    fn from(data: Arc<[u8]>) -> Self {
        FrameData(data)
    }
}

impl From<&[u8]> for FrameData {
    fn from(data: &[u8]) -> Self {
        FrameData(Arc::from(data))
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameData({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Which way the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Rear camera
    #[default]
    Back,
    /// Front (selfie) camera, previewed mirrored
    Front,
}

impl CameraFacing {
    /// Whether previews from this camera are shown mirrored
    pub fn is_mirrored(&self) -> bool {
        matches!(self, CameraFacing::Front)
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

impl std::str::FromStr for CameraFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "back" | "rear" => Ok(CameraFacing::Back),
            "front" | "selfie" => Ok(CameraFacing::Front),
            other => Err(format!("unknown camera facing '{}'", other)),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Frames arrive with the rotation needed to bring them upright. Negative
/// values are accepted and normalised (`-90` is the same as `270`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    ///
    /// Values that are not a multiple of 90 collapse to `None`.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Sub-region of the raw frame that is actually analysed
///
/// Expressed in the sensor's native (landscape) orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Crop covering an entire `width` x `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels in the crop region
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A single captured frame queued for analysis
///
/// `data` holds a luma-first buffer (Y plane first, as in NV21, NV12, I420 or
/// plain greyscale) covering only the crop region, with a row stride equal to
/// the crop width. `width`/`height` describe the full raw image the crop was
/// taken from.
#[derive(Debug, Clone)]
pub struct Frame {
    data: FrameData,
    width: u32,
    height: u32,
    crop: CropRect,
    rotation: i32,
    facing: CameraFacing,
    captured_at: Instant,
}

impl Frame {
    /// Build a frame, validating that the buffer covers the crop region
    pub fn new(
        data: impl Into<FrameData>,
        width: u32,
        height: u32,
        crop: CropRect,
        rotation: i32,
        facing: CameraFacing,
    ) -> Result<Self, FrameError> {
        let data = data.into();

        if width == 0 || height == 0 {
            return Err(FrameError::EmptyImage { width, height });
        }
        if crop.width == 0 || crop.height == 0 {
            return Err(FrameError::EmptyCrop {
                width: crop.width,
                height: crop.height,
            });
        }
        if data.len() < crop.area() {
            return Err(FrameError::BufferTooSmall {
                expected: crop.area(),
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            crop,
            rotation,
            facing,
            captured_at: Instant::now(),
        })
    }

    /// Build a frame whose crop region is the whole image
    pub fn uncropped(
        data: impl Into<FrameData>,
        width: u32,
        height: u32,
        rotation: i32,
        facing: CameraFacing,
    ) -> Result<Self, FrameError> {
        Self::new(data, width, height, CropRect::full(width, height), rotation, facing)
    }

    pub fn data(&self) -> &FrameData {
        &self.data
    }

    /// Luma plane of the crop region (`crop.width * crop.height` bytes)
    pub fn luma(&self) -> &[u8] {
        &self.data[..self.crop.area()]
    }

    /// Raw image width in sensor orientation
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raw image height in sensor orientation
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn crop(&self) -> CropRect {
        self.crop
    }

    /// Rotation in degrees exactly as reported by the capture side
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn sensor_rotation(&self) -> SensorRotation {
        SensorRotation::from_degrees_int(self.rotation)
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Timestamp when the frame was constructed (for latency diagnostics)
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }
}
