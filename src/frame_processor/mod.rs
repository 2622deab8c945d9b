// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for async frame analysis
//!
//! This module runs a pluggable detector over a single camera frame off the
//! calling thread and maps every detected region from sensor space into the
//! coordinate space of the preview view. Results reach the caller through a
//! [`ResultSink`].

pub mod bounds;
pub mod detector;
pub mod geometry;
pub mod scheduler;
pub mod sink;
pub mod tasks;
pub mod types;

pub use bounds::{BoundsMapper, CropOffset, map_bounds};
pub use detector::Detector;
pub use geometry::{ImageDimensions, ScaleFactors, ViewGeometry, ViewPadding};
pub use scheduler::AnalysisSlot;
pub use sink::{DetectionEvent, ResultSink};
pub use tasks::{DetectionTask, QrDetector, TaskHandle, TaskState};
pub use types::{
    BarcodeFormat, BoundingBox, DetectionPayload, MappedBounds, MappedDetection, RawDetection,
};
