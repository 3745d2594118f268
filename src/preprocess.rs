//! Preprocessing plan.
//!
//! [`PreProcessSettings::plan`] turns the user's deinterlace/crop/resize
//! options into a fixed pipeline before any frame is decoded. The plan's
//! [`result`](PreProcessSettings::result) geometry is what the encoder is
//! opened with, so every frame leaving the pipeline matches it.
//!
//! Stages are planned in a fixed order:
//!
//! 1. **Deinterlace** is copied straight from the options.
//! 2. **Crop** takes a target height and derives the width from the source
//!    aspect ratio.
//! 3. **Resize** starts from whatever crop left behind, so the two compose:
//!    crop narrows the frame, then resize scales the cropped frame. A missing
//!    axis is derived from the current aspect ratio. Resize is also switched
//!    on implicitly when the encoder needs a different pixel format.
//!
//! Invalid crop or resize values are logged and the stage stays disabled;
//! they never abort the run.

use ffmpeg_next::format::Pixel;

use crate::configuration::ExtractOptions;
use crate::conversion::{height_for_width, width_for_height};

/// Pixel format and dimensions of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// Pixel format.
    pub format: Pixel,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameGeometry {
    /// Create a geometry value.
    pub fn new(format: Pixel, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
        }
    }

    /// Width divided by height, or `0.0` for an empty frame.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// Planned crop stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSettings {
    /// Whether the stage runs.
    pub enabled: bool,
    /// Width of the kept region.
    pub width: u32,
    /// Height of the kept region.
    pub height: u32,
}

/// Planned resize (scale and/or pixel-format conversion) stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSettings {
    /// Whether the stage runs.
    pub enabled: bool,
    /// Geometry of the frame leaving the stage.
    pub target: FrameGeometry,
}

/// The preprocessing pipeline for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreProcessSettings {
    /// Geometry of decoded frames.
    pub source: FrameGeometry,
    /// Geometry after every planned stage; the encoder is opened with it.
    pub result: FrameGeometry,
    /// Whether the deinterlace stage runs.
    pub deinterlace: bool,
    /// Crop stage.
    pub crop: CropSettings,
    /// Resize stage.
    pub resize: ResizeSettings,
}

impl PreProcessSettings {
    /// Plan the pipeline for frames of `source` geometry going to an encoder
    /// that expects `encoder_format`.
    pub fn plan(options: &ExtractOptions, source: FrameGeometry, encoder_format: Pixel) -> Self {
        let mut result = FrameGeometry::new(encoder_format, source.width, source.height);

        let mut crop = CropSettings {
            enabled: false,
            width: result.width,
            height: result.height,
        };
        if let Some(crop_height) = options.crop_height {
            if crop_height <= 0 {
                log::error!("Could not crop frame to negative or zero resolution ({crop_height})");
            } else if crop_height > result.height as i64 {
                log::error!(
                    "Could not crop frame to {crop_height} rows, source is only {} rows high",
                    result.height
                );
            } else {
                let height = crop_height as u32;
                crop = CropSettings {
                    enabled: true,
                    width: width_for_height(result.width, result.height, height),
                    height,
                };
                result.width = crop.width;
                result.height = crop.height;
                log::debug!("Planned crop to {}x{}", crop.width, crop.height);
            }
        }

        let mut resize = ResizeSettings {
            enabled: options.convert_pixel_format && result.format != source.format,
            target: result,
        };
        if options.has_resize() {
            let width = positive(options.resize_width);
            let height = positive(options.resize_height);
            match (width, height) {
                (None, None) => {
                    log::error!("Could not resize frame to negative or zero resolution");
                }
                (width, height) => {
                    let width = width.unwrap_or_else(|| {
                        width_for_height(result.width, result.height, height.unwrap_or(1))
                    });
                    let height = height
                        .unwrap_or_else(|| height_for_width(result.width, result.height, width));
                    resize.target = FrameGeometry::new(result.format, width, height);
                    resize.enabled = true;
                    result = resize.target;
                    log::debug!("Planned resize to {width}x{height}");
                }
            }
        }

        if resize.enabled && resize.target.format != source.format {
            log::debug!(
                "Frames will be converted from {:?} to {:?}",
                source.format,
                resize.target.format
            );
        }

        Self {
            source,
            result,
            deinterlace: options.deinterlace,
            crop,
            resize,
        }
    }

    /// Returns `true` if no stage runs, so frames pass through untouched.
    pub fn is_identity(&self) -> bool {
        !self.deinterlace && !self.crop.enabled && !self.resize.enabled
    }
}

fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|&v| v > 0)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}
