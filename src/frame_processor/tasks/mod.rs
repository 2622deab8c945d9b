// SPDX-License-Identifier: GPL-3.0-only

//! Frame processing tasks
//!
//! This module contains the detection task lifecycle and the detector
//! implementations shipped with the crate.

pub mod detection_task;
pub mod qr_detector;

pub use detection_task::{DetectionTask, MISSING_DETECTOR, TaskHandle, TaskState};
pub use qr_detector::QrDetector;
