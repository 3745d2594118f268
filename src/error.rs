//! Error types for the `stillshot` crate.
//!
//! This module defines [`StillshotError`], the unified error type returned by
//! all fallible operations in the crate. Variants fall into two groups: setup
//! errors that abort the whole run, and per-timestamp errors after which the
//! extraction loop moves on to the next requested timestamp. See
//! [`StillshotError::is_fatal`].

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `stillshot` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StillshotError {
    /// The input media file could not be opened or probed.
    #[error("Failed to open media file at {path}: {reason}")]
    InputOpen {
        /// Path that was passed to [`InputSource::open`](crate::InputSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The input contains no video stream.
    #[error("No video stream found in input file")]
    StreamNotFound,

    /// No decoder implementation exists for the video stream's codec.
    #[error("No decoder available for codec {0}")]
    DecoderUnavailable(String),

    /// The decoder rejected the stream parameters.
    #[error("Failed to open decoder: {0}")]
    DecoderOpen(String),

    /// No output container matches the output file name.
    #[error("Could not guess output format for {0}")]
    OutputFormatGuess(String),

    /// No encoder exists for the guessed output codec.
    #[error("No encoder found for codec {0}")]
    EncoderNotFound(String),

    /// The encoder supports no pixel format compatible with the source.
    #[error("No usable pixel format for encoder {codec}; stream cannot be encoded")]
    PixelFormatUnresolved {
        /// Name of the encoder.
        codec: String,
    },

    /// The encoder rejected its final configuration.
    #[error("Failed to open encoder: {0}")]
    EncoderOpen(String),

    /// A required option was not supplied.
    #[error("{0} must be specified")]
    MissingOption(&'static str),

    /// No valid timestamp was supplied.
    #[error("At least one timestamp must be specified")]
    NoTimestamps,

    /// The requested timestamp lies beyond the stream duration.
    #[error("Timestamp {seconds}s is out of duration")]
    TimestampOutOfRange {
        /// The requested timestamp in seconds.
        seconds: u64,
    },

    /// Decoding reached end of stream without producing any frame.
    #[error("No frame could be decoded at {seconds}s")]
    FrameUnavailable {
        /// The requested timestamp in seconds.
        seconds: u64,
    },

    /// A video packet could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// A filter graph (deinterlace, crop) could not be built or run.
    #[error("Filter graph error: {0}")]
    Filter(String),

    /// The scaler could not be created or failed to convert a frame.
    #[error("Scaling error: {0}")]
    Scale(String),

    /// Encoding or muxing a frame failed.
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// The output template contains an unsupported conversion.
    #[error("Invalid output template {template:?}: {reason}")]
    InvalidTemplate {
        /// The template as given.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The output file exists and overwriting is disabled.
    #[error("Output file {0} already exists")]
    OutputExists(PathBuf),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl StillshotError {
    /// Returns `true` for errors that abort the whole run rather than a
    /// single timestamp.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StillshotError::InputOpen { .. }
                | StillshotError::StreamNotFound
                | StillshotError::DecoderUnavailable(_)
                | StillshotError::DecoderOpen(_)
                | StillshotError::OutputFormatGuess(_)
                | StillshotError::EncoderNotFound(_)
                | StillshotError::PixelFormatUnresolved { .. }
                | StillshotError::EncoderOpen(_)
                | StillshotError::MissingOption(_)
                | StillshotError::NoTimestamps
                | StillshotError::InvalidTemplate { .. }
        )
    }
}

impl From<FfmpegError> for StillshotError {
    fn from(error: FfmpegError) -> Self {
        StillshotError::Ffmpeg(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_are_fatal() {
        assert!(StillshotError::StreamNotFound.is_fatal());
        assert!(StillshotError::EncoderNotFound("bmp".to_string()).is_fatal());
        assert!(StillshotError::MissingOption("input file").is_fatal());
    }

    #[test]
    fn timestamp_errors_are_recoverable() {
        assert!(!StillshotError::TimestampOutOfRange { seconds: 60 }.is_fatal());
        assert!(!StillshotError::FrameUnavailable { seconds: 3 }.is_fatal());
        assert!(!StillshotError::Decode("bad packet".to_string()).is_fatal());
    }

    #[test]
    fn messages_carry_context() {
        let error = StillshotError::MissingOption("output file");
        assert_eq!(error.to_string(), "output file must be specified");

        let error = StillshotError::TimestampOutOfRange { seconds: 42 };
        assert!(error.to_string().contains("42s"));
    }
}
