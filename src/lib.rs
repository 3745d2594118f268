//! # stillshot
//!
//! Extract still frames from video files at given timestamps.
//!
//! `stillshot` seeks to each requested second of a video, decodes the first
//! frame at or after it, optionally deinterlaces, crops and resizes it, and
//! encodes it to an image file named after a `%d` template. Demuxing,
//! decoding, filtering, scaling and encoding are all done by FFmpeg through
//! the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stillshot::{ExtractOptions, extract};
//!
//! let options = ExtractOptions::new("input.mp4", "shot_%03d.jpg")
//!     .with_crop_height(480)
//!     .with_resize(Some(640), None)
//!     .with_timestamps([2, 5]);
//!
//! let report = extract(&options).unwrap();
//! for (seconds, path) in &report.written {
//!     println!("{seconds}s -> {}", path.display());
//! }
//! ```
//!
//! ## Pipeline
//!
//! Setup is done once per run and any failure there is fatal:
//!
//! 1. open the input and the decoder of its best video stream;
//! 2. guess the output muxer and encoder from the template's extension and
//!    pick a pixel format the encoder accepts;
//! 3. plan the preprocessing stages ([`PreProcessSettings`]);
//! 4. open the encoder with the planned output geometry.
//!
//! Every timestamp is then processed independently: seek, flush, decode,
//! [`preprocess()`], encode into a fresh output file. A failure there skips
//! only that timestamp.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
mod conversion;
pub mod error;
pub mod ffmpeg;
mod filter;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod progress;
pub mod scaler;
pub mod session;
pub mod template;

pub use configuration::{ExtractOptions, parse_timestamp};
pub use error::StillshotError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use input::{InputSource, StreamInfo};
pub use output::{FrameEncoder, OutputTarget, choose_pixel_format};
pub use pipeline::{crop, deinterlace, preprocess, resize};
pub use preprocess::{CropSettings, FrameGeometry, PreProcessSettings, ResizeSettings};
pub use progress::{ProgressCallback, ProgressInfo};
pub use scaler::ScalerCache;
pub use session::{ExtractionReport, ExtractionSession, extract};
pub use template::OutputTemplate;
