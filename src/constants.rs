// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Frame analysis defaults
pub mod analysis {
    /// Minimum time between sampled frames (1 FPS)
    pub const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

    /// Frames larger than this are downscaled before QR detection
    pub const DEFAULT_QR_MAX_DIMENSION: u32 = 640;

    /// Default display density
    pub const DEFAULT_DENSITY: f32 = 1.0;
}

/// Accepted sensor rotations in degrees
pub mod rotation {
    /// Canonical rotations, plus the negative forms some capture stacks report
    pub const VALID_DEGREES: [i32; 7] = [0, 90, 180, 270, -90, -180, -270];

    /// Whether `degrees` is a rotation the capture side can report
    pub fn is_valid(degrees: i32) -> bool {
        VALID_DEGREES.contains(&degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rotations() {
        assert!(rotation::is_valid(-90));
        assert!(rotation::is_valid(270));
        assert!(!rotation::is_valid(45));
        assert!(!rotation::is_valid(360));
    }
}
