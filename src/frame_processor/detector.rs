// SPDX-License-Identifier: GPL-3.0-only

//! Detector capability consumed by detection tasks

use super::types::RawDetection;
use crate::backends::camera::types::Frame;
use crate::errors::DetectorError;

/// Common interface for frame detectors
///
/// Implementations may block for the whole duration of inference; detection
/// tasks always call [`Detector::detect`] from tokio's blocking pool.
pub trait Detector: Send + Sync {
    /// Identity reported in error signals
    fn name(&self) -> &str;

    /// Whether the backing engine is ready to run
    ///
    /// A detector that returns `false` is never asked to detect.
    fn is_operational(&self) -> bool {
        true
    }

    /// Detect regions in the crop area of `frame`
    ///
    /// Returned boxes are relative to the crop region. An empty vector means
    /// the frame was analysed and nothing was found.
    fn detect(&self, frame: &Frame) -> Result<Vec<RawDetection>, DetectorError>;
}
