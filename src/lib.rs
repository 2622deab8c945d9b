// SPDX-License-Identifier: GPL-3.0-only

//! Frame Detect - asynchronous detection over camera frames
//!
//! This library runs a pluggable detector over a single camera frame on a
//! background worker and maps every detected region from sensor space into
//! the coordinate space of the on-screen preview, accounting for rotation,
//! crop region, view padding and display density.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Camera frame types handed over by the capture side
//! - [`frame_processor`]: Geometry, bounds mapping, detectors and detection tasks
//! - [`config`]: Analysis settings
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let task = DetectionTask::new(frame, view, Some(Arc::new(QrDetector::new())));
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let (handle, join) = task.spawn(tx);
//! while let Some(event) = rx.recv().await {
//!     // draw overlays
//! }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;

// Re-export commonly used types
pub use backends::camera::types::{CameraFacing, CropRect, Frame};
pub use config::Config;
pub use frame_processor::{
    DetectionEvent, DetectionTask, Detector, MappedDetection, QrDetector, ResultSink, TaskHandle,
    TaskState, ViewGeometry, ViewPadding,
};
