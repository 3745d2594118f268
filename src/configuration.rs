//! Extraction configuration.
//!
//! [`ExtractOptions`] is a builder holding everything one extraction run
//! needs: input path, output template, preprocessing switches and the list of
//! timestamps. It is built once (usually from command-line flags) and read
//! by [`ExtractionSession`](crate::ExtractionSession) for the whole run.
//!
//! # Example
//!
//! ```no_run
//! use stillshot::ExtractOptions;
//!
//! let options = ExtractOptions::new("input.mp4", "shot_%d.jpg")
//!     .with_deinterlace(true)
//!     .with_crop_height(480)
//!     .with_resize(Some(640), None)
//!     .with_timestamps([2, 5]);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StillshotError;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Configuration for one extraction run.
///
/// Crop and resize values are kept as signed integers exactly as the user
/// gave them; the [planner](crate::PreProcessSettings::plan) decides what to
/// do with non-positive values.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Source media file.
    pub input: PathBuf,
    /// Output file name template (see [`OutputTemplate`](crate::OutputTemplate)).
    pub output: String,
    /// Run the deinterlace stage on every frame.
    pub deinterlace: bool,
    /// Crop target height. The width is derived from the aspect ratio.
    pub crop_height: Option<i64>,
    /// Resize target width.
    pub resize_width: Option<i64>,
    /// Resize target height.
    pub resize_height: Option<i64>,
    /// Requested timestamps in whole seconds, in the order given.
    pub timestamps: Vec<u64>,
    /// When the encoder needs a different pixel format than the decoder
    /// produces, enable the resize stage to convert. Defaults to `true`.
    pub convert_pixel_format: bool,
    /// Replace output files that already exist. Defaults to `true`.
    pub overwrite: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("deinterlace", &self.deinterlace)
            .field("crop_height", &self.crop_height)
            .field("resize_width", &self.resize_width)
            .field("resize_height", &self.resize_height)
            .field("timestamps", &self.timestamps)
            .field("convert_pixel_format", &self.convert_pixel_format)
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

impl ExtractOptions {
    /// Create options for `input` writing to `output`, with every
    /// preprocessing stage disabled and no timestamps.
    pub fn new<P: AsRef<Path>>(input: P, output: impl Into<String>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.into(),
            deinterlace: false,
            crop_height: None,
            resize_width: None,
            resize_height: None,
            timestamps: Vec::new(),
            convert_pixel_format: true,
            overwrite: true,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Enable or disable deinterlacing.
    #[must_use]
    pub fn with_deinterlace(mut self, enabled: bool) -> Self {
        self.deinterlace = enabled;
        self
    }

    /// Crop every frame to `height`, keeping the aspect ratio.
    #[must_use]
    pub fn with_crop_height(mut self, height: i64) -> Self {
        self.crop_height = Some(height);
        self
    }

    /// Resize every frame. Leave one axis as `None` to derive it from the
    /// aspect ratio of the (possibly cropped) frame.
    #[must_use]
    pub fn with_resize(mut self, width: Option<i64>, height: Option<i64>) -> Self {
        self.resize_width = width;
        self.resize_height = height;
        self
    }

    /// Append one timestamp (seconds).
    #[must_use]
    pub fn with_timestamp(mut self, seconds: u64) -> Self {
        self.timestamps.push(seconds);
        self
    }

    /// Append several timestamps (seconds), keeping their order.
    #[must_use]
    pub fn with_timestamps<I: IntoIterator<Item = u64>>(mut self, timestamps: I) -> Self {
        self.timestamps.extend(timestamps);
        self
    }

    /// Control whether a pixel-format mismatch between decoder and encoder
    /// implicitly enables the resize stage.
    #[must_use]
    pub fn with_pixel_format_conversion(mut self, enabled: bool) -> Self {
        self.convert_pixel_format = enabled;
        self
    }

    /// Control whether existing output files are replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Attach a progress callback, invoked once per processed timestamp.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Returns `true` if either resize axis was given.
    pub fn has_resize(&self) -> bool {
        self.resize_width.is_some() || self.resize_height.is_some()
    }

    /// Check that the options describe a runnable extraction.
    ///
    /// # Errors
    ///
    /// - [`StillshotError::MissingOption`] for an empty input path or
    ///   output template.
    /// - [`StillshotError::NoTimestamps`] if no timestamp was given.
    pub fn validate(&self) -> Result<(), StillshotError> {
        if self.input.as_os_str().is_empty() {
            return Err(StillshotError::MissingOption("input file"));
        }
        if self.output.is_empty() {
            return Err(StillshotError::MissingOption("output file"));
        }
        if self.timestamps.is_empty() {
            return Err(StillshotError::NoTimestamps);
        }
        Ok(())
    }
}

/// Parse a timestamp argument in whole seconds.
///
/// Only the canonical decimal form of a non-negative integer is accepted:
/// `"5"` and `"120"` parse, while `"+5"`, `"05"`, `"5s"`, `" 5"` and `"-1"`
/// are rejected.
pub fn parse_timestamp(value: &str) -> Option<u64> {
    let seconds = value.parse::<u64>().ok()?;
    (seconds.to_string() == value).then_some(seconds)
}
