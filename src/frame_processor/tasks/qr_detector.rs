// SPDX-License-Identifier: GPL-3.0-only

//! QR code detector
//!
//! This module implements the [`Detector`] capability with the rqrr crate.
//! The luma plane of the frame's crop region is turned upright according to
//! the frame rotation, optionally downscaled, and searched for QR codes.
//! Boxes are reported in upright crop-relative pixels.

use crate::backends::camera::types::{Frame, SensorRotation};
use crate::constants::analysis::DEFAULT_QR_MAX_DIMENSION;
use crate::errors::DetectorError;
use crate::frame_processor::detector::Detector;
use crate::frame_processor::types::{BarcodeFormat, BoundingBox, DetectionPayload, RawDetection};
use tracing::{debug, trace};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            // QR codes are typically large enough to be detected at 640px
            max_dimension: DEFAULT_QR_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

impl Detector for QrDetector {
    fn name(&self) -> &str {
        "rqrr-qr"
    }

    fn is_operational(&self) -> bool {
        self.max_dimension > 0
    }

    fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
        detect_sync(frame, self.max_dimension)
    }
}

/// Synchronous QR detection (runs on the blocking pool)
fn detect_sync(frame: &Frame, max_dimension: u32) -> Result<Vec<RawDetection>, DetectorError> {
    if max_dimension == 0 {
        return Err(DetectorError::UnsupportedFrame(
            "max processing dimension is zero".to_string(),
        ));
    }

    let start = std::time::Instant::now();

    let crop = frame.crop();
    let rotation = frame.sensor_rotation();
    let (upright_width, upright_height) = if rotation.swaps_dimensions() {
        (crop.height, crop.width)
    } else {
        (crop.width, crop.height)
    };

    let scale = if upright_width > max_dimension || upright_height > max_dimension {
        (upright_width as f32 / max_dimension as f32)
            .max(upright_height as f32 / max_dimension as f32)
    } else {
        1.0
    };
    let proc_width = ((upright_width as f32 / scale) as u32).max(1);
    let proc_height = ((upright_height as f32 / scale) as u32).max(1);

    let luma = frame.luma();
    let stride = crop.width as usize;
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| {
            let ux = ((x as f32 * scale) as u32).min(upright_width - 1);
            let uy = ((y as f32 * scale) as u32).min(upright_height - 1);
            let (sx, sy) = upright_to_source(ux, uy, crop.width, crop.height, rotation);
            luma[sy as usize * stride + sx as usize]
        },
    );

    let conversion_time = start.elapsed();
    trace!(
        proc_width,
        proc_height,
        scale,
        rotation = %rotation,
        conversion_ms = conversion_time.as_millis(),
        "Prepared luma image for processing"
    );

    let grids = prepared.detect_grids();

    trace!(
        count = grids.len(),
        detection_ms = (start.elapsed() - conversion_time).as_millis(),
        "QR grid search complete"
    );

    let mut detections = Vec::with_capacity(grids.len());

    for grid in grids {
        let content = match grid.decode() {
            Ok((_meta, content)) => content,
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR code");
                continue;
            }
        };

        let min_x = grid.bounds.iter().map(|p| p.x).min().unwrap_or(0).max(0);
        let max_x = grid
            .bounds
            .iter()
            .map(|p| p.x)
            .max()
            .unwrap_or(0)
            .min(proc_width as i32);
        let min_y = grid.bounds.iter().map(|p| p.y).min().unwrap_or(0).max(0);
        let max_y = grid
            .bounds
            .iter()
            .map(|p| p.y)
            .max()
            .unwrap_or(0)
            .min(proc_height as i32);

        // Scale back to upright crop coordinates
        let bounds = BoundingBox::from_edges(
            (min_x as f32 * scale) as i32,
            (min_y as f32 * scale) as i32,
            (max_x as f32 * scale) as i32,
            (max_y as f32 * scale) as i32,
        );

        debug!(
            content = %content,
            left = bounds.left,
            top = bounds.top,
            width = bounds.width,
            height = bounds.height,
            "Detected QR code"
        );

        detections.push(RawDetection::new(
            bounds,
            DetectionPayload::text(content, BarcodeFormat::QrCode),
        ));
    }

    if !detections.is_empty() {
        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    Ok(detections)
}

/// Map a pixel of the upright image back to the sensor-oriented source
///
/// `width`/`height` are the source dimensions. The upright image is the
/// source rotated clockwise by `rotation`.
fn upright_to_source(
    ux: u32,
    uy: u32,
    width: u32,
    height: u32,
    rotation: SensorRotation,
) -> (u32, u32) {
    match rotation {
        SensorRotation::None => (ux, uy),
        SensorRotation::Rotate90 => (uy, height - 1 - ux),
        SensorRotation::Rotate180 => (width - 1 - ux, height - 1 - uy),
        SensorRotation::Rotate270 => (width - 1 - uy, ux),
    }
}
