// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for frame analysis
//!
//! This module provides command-line functionality for:
//! - Running one detection task over an image file
//! - Listing the barcode format table

use clap::Args;
use frame_detect::constants::rotation;
use frame_detect::errors::{AppError, AppResult};
use frame_detect::frame_processor::{
    BarcodeFormat, DetectionEvent, DetectionTask, Detector, ImageDimensions, QrDetector,
    TaskState, ViewGeometry, ViewPadding,
};
use frame_detect::{CameraFacing, Config, CropRect, Frame};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Options for `frame-detect analyze`
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file treated as the raw sensor frame
    pub image: PathBuf,

    /// Sensor rotation in degrees (0, 90, 180, 270 or negative forms)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    pub rotation: i32,

    /// Camera facing (front or back)
    #[arg(short, long, default_value = "back")]
    pub facing: CameraFacing,

    /// Display pixel density (defaults to the configured value)
    #[arg(long)]
    pub density: Option<f32>,

    /// Preview view width (defaults to the rotated image width times density)
    #[arg(long)]
    pub view_width: Option<u32>,

    /// Preview view height (defaults to the rotated image height times density)
    #[arg(long)]
    pub view_height: Option<u32>,

    /// Left view padding (defaults to the configured value)
    #[arg(long, allow_hyphen_values = true)]
    pub padding_left: Option<i32>,

    /// Top view padding (defaults to the configured value)
    #[arg(long, allow_hyphen_values = true)]
    pub padding_top: Option<i32>,

    /// Crop region as x,y,width,height in sensor orientation
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRect>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Parse `x,y,width,height`
fn parse_crop(value: &str) -> Result<CropRect, String> {
    let parts: Vec<u32> = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid crop '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRect::new(*x, *y, *width, *height)),
        _ => Err(format!("crop must be x,y,width,height, got '{}'", value)),
    }
}

/// Command-line padding overrides the configured padding per edge
fn resolve_padding(left: Option<i32>, top: Option<i32>, config: &Config) -> ViewPadding {
    let configured = config.view_padding();
    ViewPadding::new(
        left.unwrap_or(configured.left),
        top.unwrap_or(configured.top),
    )
}

/// Run one detection task over an image file and print its events as JSON lines
pub fn analyze(args: AnalyzeArgs) -> AppResult<()> {
    if !rotation::is_valid(args.rotation) {
        return Err(AppError::Other(format!(
            "Unsupported rotation {} (expected one of {:?})",
            args.rotation,
            rotation::VALID_DEGREES
        )));
    }

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let luma = image::open(&args.image)?.to_luma8();
    let (width, height) = luma.dimensions();

    let crop = args.crop.unwrap_or_else(|| CropRect::full(width, height));
    if crop.x.saturating_add(crop.width) > width || crop.y.saturating_add(crop.height) > height {
        return Err(AppError::Other(format!(
            "Crop {},{} {}x{} exceeds image {}x{}",
            crop.x, crop.y, crop.width, crop.height, width, height
        )));
    }

    let region = image::imageops::crop_imm(&luma, crop.x, crop.y, crop.width, crop.height)
        .to_image()
        .into_raw();
    let frame = Frame::new(region, width, height, crop, args.rotation, args.facing)?;

    let dimensions = ImageDimensions::compute(width, height, args.rotation, args.facing);
    let density = args.density.unwrap_or(config.density);
    let view_width = args
        .view_width
        .unwrap_or((dimensions.width() as f32 * density) as u32);
    let view_height = args
        .view_height
        .unwrap_or((dimensions.height() as f32 * density) as u32);
    let padding = resolve_padding(args.padding_left, args.padding_top, &config);
    let view = ViewGeometry::new(view_width, view_height, density, padding)?;

    info!(
        path = %args.image.display(),
        width,
        height,
        rotation = args.rotation,
        facing = %args.facing,
        view_width,
        view_height,
        density,
        "Analyzing frame"
    );

    let detector: Arc<dyn Detector> = Arc::new(QrDetector::with_max_dimension(
        config.qr_max_dimension,
    ));
    let task = DetectionTask::new(frame, view, Some(detector));

    let runtime = tokio::runtime::Runtime::new()?;
    let (state, events) = runtime.block_on(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DetectionEvent>();
        let (_handle, join) = task.spawn(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        let state = join
            .await
            .map_err(|e| AppError::Runtime(e.to_string()))?;
        Ok::<_, AppError>((state, events))
    })?;

    for event in &events {
        println!("{}", event.to_json());
    }

    info!(state = ?state, events = events.len(), "Analysis finished");

    if state == TaskState::Failed
        && let Some(DetectionEvent::Error(error)) = events.into_iter().next()
    {
        return Err(error.into());
    }

    Ok(())
}

/// Print the barcode format table
pub fn list_formats() -> AppResult<()> {
    println!("Barcode formats:");
    println!();
    for format in BarcodeFormat::ALL {
        println!("  {:>5}  {}", format.code(), format.name());
    }
    println!("  {:>5}  {}", "*", BarcodeFormat::UNKNOWN_NAME);
    Ok(())
}
