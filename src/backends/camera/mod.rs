// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame types
//!
//! Frames arrive from the capture pipeline as luma-first buffers of the crop
//! region, tagged with sensor rotation and camera facing.

pub mod types;

pub use types::*;
