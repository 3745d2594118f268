//! Extraction session.
//!
//! [`ExtractionSession::open`] performs all fatal setup: validating the
//! options, opening the input and its decoder, resolving the output encoder
//! and planning the preprocessing pipeline. [`ExtractionSession::run`] then
//! processes every requested timestamp independently. A failure for one
//! timestamp is logged and recorded in the [`ExtractionReport`]; it never
//! stops the run.
//!
//! # Example
//!
//! ```no_run
//! use stillshot::{ExtractOptions, ExtractionSession};
//!
//! let options = ExtractOptions::new("input.mp4", "shot_%03d.jpg").with_timestamps([2, 5]);
//! let mut session = ExtractionSession::open(&options)?;
//! let report = session.run();
//! println!("{} written, {} skipped", report.written.len(), report.skipped.len());
//! # Ok::<(), stillshot::StillshotError>(())
//! ```

use std::path::PathBuf;

use ffmpeg_next::frame::Video as VideoFrame;

use crate::configuration::ExtractOptions;
use crate::error::StillshotError;
use crate::input::{InputSource, StreamInfo};
use crate::output::{FrameEncoder, OutputTarget};
use crate::pipeline::preprocess;
use crate::preprocess::PreProcessSettings;
use crate::progress::ProgressTracker;
use crate::scaler::ScalerCache;
use crate::template::OutputTemplate;

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Timestamps (seconds) that produced a file, with the file path.
    pub written: Vec<(u64, PathBuf)>,
    /// Timestamps (seconds) that were skipped, with the reason.
    pub skipped: Vec<(u64, String)>,
}

impl ExtractionReport {
    /// Returns `true` if every requested timestamp produced a file.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// An opened input/encoder pair ready to extract frames.
pub struct ExtractionSession {
    options: ExtractOptions,
    template: OutputTemplate,
    input: InputSource,
    encoder: FrameEncoder,
    settings: PreProcessSettings,
    scaler: ScalerCache,
    muxer: String,
    codec: String,
}

impl ExtractionSession {
    /// Validate `options` and perform every setup step.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: invalid options, an unparsable output
    /// template, or any failure opening the input, decoder or encoder.
    pub fn open(options: &ExtractOptions) -> Result<Self, StillshotError> {
        options.validate()?;

        let template = OutputTemplate::parse(&options.output)?;
        if !template.has_placeholder() {
            log::warn!(
                "Output template '{}' has no %d placeholder, every timestamp writes the same file",
                template
            );
        }

        let input = InputSource::open(&options.input)?;
        let source = input.source_geometry();

        let target = OutputTarget::guess(template.as_str(), source.format, input.frame_time_base())?;
        let muxer = target.format_name().to_string();
        let codec = target.codec_name().to_string();

        let settings = PreProcessSettings::plan(options, source, target.pixel_format());
        let encoder = target.open(settings.result.width, settings.result.height)?;

        log::debug!(
            "Session ready for {}: {}x{} {:?} -> {}x{} {:?} via {muxer}/{codec}",
            input.path().display(),
            settings.source.width,
            settings.source.height,
            settings.source.format,
            settings.result.width,
            settings.result.height,
            settings.result.format,
        );

        Ok(Self {
            options: options.clone(),
            template,
            input,
            encoder,
            settings,
            scaler: ScalerCache::new(),
            muxer,
            codec,
        })
    }

    /// Facts about the selected input stream.
    pub fn stream_info(&self) -> &StreamInfo {
        self.input.info()
    }

    /// The preprocessing plan every frame goes through.
    ///
    /// Deinterlacing reads as disabled once it has failed for a frame.
    pub fn settings(&self) -> &PreProcessSettings {
        &self.settings
    }

    /// Short name of the output muxer.
    pub fn muxer(&self) -> &str {
        &self.muxer
    }

    /// Name of the output encoder.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// Decode and preprocess the frame at `seconds` without writing it.
    ///
    /// # Errors
    ///
    /// Returns the per-timestamp error that stopped the frame: out of
    /// range, decode, crop or resize failures.
    pub fn frame_at(&mut self, seconds: u64) -> Result<VideoFrame, StillshotError> {
        let mut frame = self.input.acquire_frame(seconds)?;
        preprocess(&mut self.settings, &mut frame, &mut self.scaler)?;
        Ok(frame)
    }

    /// Extract the frame at `seconds` and write it to the expanded template.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::OutputExists`] when overwriting is disabled
    /// and the file exists, or any error from [`frame_at`](Self::frame_at)
    /// or the encoder.
    pub fn extract(&mut self, seconds: u64) -> Result<PathBuf, StillshotError> {
        let path = PathBuf::from(self.template.expand(seconds));
        if !self.options.overwrite && path.exists() {
            return Err(StillshotError::OutputExists(path));
        }

        let frame = self.frame_at(seconds)?;
        self.encoder.write_frame(&path, &frame)?;
        Ok(path)
    }

    /// Process every requested timestamp in order.
    pub fn run(&mut self) -> ExtractionReport {
        let timestamps = self.options.timestamps.clone();
        let mut tracker =
            ProgressTracker::new(self.options.progress.clone(), timestamps.len() as u64);
        let mut report = ExtractionReport::default();

        for seconds in timestamps {
            match self.extract(seconds) {
                Ok(path) => {
                    log::info!("Wrote frame at {seconds}s to {}", path.display());
                    tracker.advance(seconds, true);
                    report.written.push((seconds, path));
                }
                Err(error) => {
                    log::warn!("Skipping timestamp {seconds}s: {error}");
                    tracker.advance(seconds, false);
                    report.skipped.push((seconds, error.to_string()));
                }
            }
        }

        report
    }
}

/// Open a session for `options` and run it.
///
/// # Errors
///
/// Returns only fatal setup errors; per-timestamp failures are listed in the
/// report.
pub fn extract(options: &ExtractOptions) -> Result<ExtractionReport, StillshotError> {
    let mut session = ExtractionSession::open(options)?;
    Ok(session.run())
}
