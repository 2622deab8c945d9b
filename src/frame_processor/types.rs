// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! Detectors report [`RawDetection`]s in crop-relative sensor pixels. Once a
//! detection task maps them into view space they become
//! [`MappedDetection`]s, which serialize to the shape the preview layer
//! consumes:
//!
//! ```json
//! { "data": "...", "rawData": "...", "type": "QR_CODE",
//!   "bounds": { "origin": { "x": 0.0, "y": 0.0 },
//!               "size": { "width": 0.0, "height": 0.0 } } }
//! ```

use serde::{Deserialize, Serialize};

/// Barcode symbology, keyed by the bit-flag codes mobile vision engines use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    Code128,
    Code39,
    Code93,
    Codabar,
    DataMatrix,
    Ean13,
    Ean8,
    Itf,
    QrCode,
    UpcA,
    UpcE,
    Pdf417,
    Aztec,
}

impl BarcodeFormat {
    /// All known formats, in code order
    pub const ALL: [BarcodeFormat; 13] = [
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Codabar,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Itf,
        BarcodeFormat::QrCode,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
    ];

    /// Name reported for codes that match no known format
    pub const UNKNOWN_NAME: &'static str = "UNKNOWN_FORMAT";

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.code() == code)
    }

    pub fn code(&self) -> i32 {
        match self {
            BarcodeFormat::Code128 => 1,
            BarcodeFormat::Code39 => 2,
            BarcodeFormat::Code93 => 4,
            BarcodeFormat::Codabar => 8,
            BarcodeFormat::DataMatrix => 16,
            BarcodeFormat::Ean13 => 32,
            BarcodeFormat::Ean8 => 64,
            BarcodeFormat::Itf => 128,
            BarcodeFormat::QrCode => 256,
            BarcodeFormat::UpcA => 512,
            BarcodeFormat::UpcE => 1024,
            BarcodeFormat::Pdf417 => 2048,
            BarcodeFormat::Aztec => 4096,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
            BarcodeFormat::Pdf417 => "PDF417",
            BarcodeFormat::Aztec => "AZTEC",
        }
    }

    /// Format name for an arbitrary code, falling back to [`Self::UNKNOWN_NAME`]
    pub fn name_for_code(code: i32) -> &'static str {
        Self::from_code(code)
            .map(|format| format.name())
            .unwrap_or(Self::UNKNOWN_NAME)
    }
}

impl std::fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Axis-aligned box in crop-relative sensor pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Box spanning two corners given as `left, top, right, bottom`
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

/// Decoded content carried alongside a detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionPayload {
    /// Value exactly as encoded
    pub raw_value: String,
    /// Value formatted for display
    pub display_value: String,
    /// Format code (see [`BarcodeFormat`])
    pub format: i32,
}

impl DetectionPayload {
    pub fn new(raw_value: impl Into<String>, display_value: impl Into<String>, format: i32) -> Self {
        Self {
            raw_value: raw_value.into(),
            display_value: display_value.into(),
            format,
        }
    }

    /// Payload whose raw and display values are the same text
    pub fn text(value: impl Into<String>, format: BarcodeFormat) -> Self {
        let value = value.into();
        Self::new(value.clone(), value, format.code())
    }
}

/// A detector-native result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub bounds: BoundingBox,
    pub payload: DetectionPayload,
}

impl RawDetection {
    pub fn new(bounds: BoundingBox, payload: DetectionPayload) -> Self {
        Self { bounds, payload }
    }
}

/// Top-left corner in view space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// Extent in view space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Bounding box in view space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MappedBounds {
    pub origin: Origin,
    pub size: Size,
}

/// A detection ready for delivery to the preview layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedDetection {
    /// Display value
    pub data: String,
    /// Raw encoded value
    pub raw_data: String,
    /// Format name
    #[serde(rename = "type")]
    pub format: String,
    pub bounds: MappedBounds,
}

impl MappedDetection {
    /// Combine a raw detection's payload with its view-space bounds
    pub fn new(payload: &DetectionPayload, bounds: MappedBounds) -> Self {
        Self {
            data: payload.display_value.clone(),
            raw_data: payload.raw_value.clone(),
            format: BarcodeFormat::name_for_code(payload.format).to_string(),
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookup() {
        assert_eq!(BarcodeFormat::name_for_code(256), "QR_CODE");
        assert_eq!(BarcodeFormat::name_for_code(32), "EAN_13");
        assert_eq!(BarcodeFormat::name_for_code(3), BarcodeFormat::UNKNOWN_NAME);
        assert_eq!(BarcodeFormat::from_code(4096), Some(BarcodeFormat::Aztec));
        for format in BarcodeFormat::ALL {
            assert_eq!(BarcodeFormat::from_code(format.code()), Some(format));
        }
    }

    #[test]
    fn test_bounding_box_edges() {
        let bbox = BoundingBox::from_edges(10, 20, 40, 60);
        assert_eq!(bbox, BoundingBox::new(10, 20, 30, 40));
        assert_eq!(bbox.right(), 40);
        assert_eq!(bbox.bottom(), 60);
    }

    #[test]
    fn test_mapped_detection_serialization() {
        let payload = DetectionPayload::new("raw", "shown", BarcodeFormat::QrCode.code());
        let detection = MappedDetection::new(
            &payload,
            MappedBounds {
                origin: Origin { x: 1.5, y: 2.0 },
                size: Size {
                    width: 3.0,
                    height: 4.0,
                },
            },
        );

        let value = serde_json::to_value(&detection).unwrap();
        assert_eq!(value["data"], "shown");
        assert_eq!(value["rawData"], "raw");
        assert_eq!(value["type"], "QR_CODE");
        assert_eq!(value["bounds"]["origin"]["x"], 1.5);
        assert_eq!(value["bounds"]["origin"]["y"], 2.0);
        assert_eq!(value["bounds"]["size"]["width"], 3.0);
        assert_eq!(value["bounds"]["size"]["height"], 4.0);
    }
}
