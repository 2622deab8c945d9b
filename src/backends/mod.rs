// SPDX-License-Identifier: GPL-3.0-only

//! Capture-side boundary
//!
//! The capture pipeline itself lives outside this crate. This module only
//! defines the frame types it hands over for analysis.

pub mod camera;
