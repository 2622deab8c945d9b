// SPDX-License-Identifier: GPL-3.0-only

//! Error types for frame analysis

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type used by the command-line front end
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame construction errors
    Frame(FrameError),
    /// View geometry errors
    Geometry(GeometryError),
    /// Configuration errors
    Config(ConfigError),
    /// Detection task failures
    Detection(DetectionError),
    /// Image decoding errors
    Image(String),
    /// Async runtime errors
    Runtime(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while building a [`Frame`](crate::backends::camera::types::Frame)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Width or height of the raw image is zero
    EmptyImage { width: u32, height: u32 },
    /// Crop rectangle has a zero dimension
    EmptyCrop { width: u32, height: u32 },
    /// Buffer is shorter than the crop region requires
    BufferTooSmall { expected: usize, actual: usize },
}

/// Errors raised while building view geometry
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Density must be finite and strictly positive
    InvalidDensity(f32),
    /// View has a zero dimension
    EmptyView { width: u32, height: u32 },
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// The configuration file could not be read
    Read(String),
    /// The configuration file is not valid JSON for [`Config`](crate::config::Config)
    Parse(String),
}

/// Failure delivered to a [`ResultSink`](crate::frame_processor::ResultSink)
///
/// Both variants carry the identity of the detector that was asked to run,
/// so the receiver can decide whether to surface feedback or retry on the
/// next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    /// Detector is missing or reports itself as non-operational
    DetectorUnavailable { detector: String },
    /// Detector ran but produced no usable result
    DetectionFailed { detector: String, reason: String },
}

impl DetectionError {
    /// Identity of the detector this error refers to
    pub fn detector(&self) -> &str {
        match self {
            DetectionError::DetectorUnavailable { detector }
            | DetectionError::DetectionFailed { detector, .. } => detector,
        }
    }
}

/// Error returned by a [`Detector`](crate::frame_processor::Detector) implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    /// Frame layout cannot be processed by this detector
    UnsupportedFrame(String),
    /// Engine-specific failure
    Engine(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Frame(e) => write!(f, "Frame error: {}", e),
            AppError::Geometry(e) => write!(f, "Geometry error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Detection(e) => write!(f, "Detection error: {}", e),
            AppError::Image(msg) => write!(f, "Image error: {}", msg),
            AppError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::EmptyImage { width, height } => {
                write!(f, "Image has an empty dimension: {}x{}", width, height)
            }
            FrameError::EmptyCrop { width, height } => {
                write!(f, "Crop region has an empty dimension: {}x{}", width, height)
            }
            FrameError::BufferTooSmall { expected, actual } => write!(
                f,
                "Frame buffer too small: expected at least {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::InvalidDensity(density) => {
                write!(f, "Invalid pixel density: {}", density)
            }
            GeometryError::EmptyView { width, height } => {
                write!(f, "View has an empty dimension: {}x{}", width, height)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionError::DetectorUnavailable { detector } => {
                write!(f, "Detector '{}' is not operational", detector)
            }
            DetectionError::DetectionFailed { detector, reason } => {
                write!(f, "Detector '{}' failed: {}", detector, reason)
            }
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorError::UnsupportedFrame(msg) => write!(f, "Unsupported frame: {}", msg),
            DetectorError::Engine(msg) => write!(f, "Engine error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for FrameError {}
impl std::error::Error for GeometryError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for DetectionError {}
impl std::error::Error for DetectorError {}

// Conversions from sub-errors to AppError
impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        AppError::Frame(err)
    }
}

impl From<GeometryError> for AppError {
    fn from(err: GeometryError) -> Self {
        AppError::Geometry(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DetectionError> for AppError {
    fn from(err: DetectionError) -> Self {
        AppError::Detection(err)
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Runtime(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
