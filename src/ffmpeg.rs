//! FFmpeg log level configuration.
//!
//! FFmpeg has its own internal logging system, separate from the Rust
//! [`log`](https://crates.io/crates/log) crate. This module wraps FFmpeg's
//! log-level API and maps the command line's numeric `--verbose` levels onto
//! both FFmpeg and `log` so a single knob controls all diagnostic output.
//!
//! # Example
//!
//! ```no_run
//! use stillshot::FfmpegLogLevel;
//!
//! // `--verbose=3` on the command line: errors only.
//! let level = FfmpegLogLevel::from_verbosity(3);
//! stillshot::set_ffmpeg_log_level(level);
//! assert_eq!(level.to_log_filter(), log::LevelFilter::Error);
//! ```

use std::os::raw::c_int;

use ffmpeg_next::util::log::Level;
use log::LevelFilter;

/// One of FFmpeg's `AV_LOG_*` levels, from silent to trace.
///
/// The variants are in verbosity order, `Quiet` being `0`; `--verbose=N`
/// selects variant `N` (see [`from_verbosity`](Self::from_verbosity)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// `AV_LOG_QUIET`, nothing is printed.
    Quiet,
    /// `AV_LOG_PANIC`.
    Panic,
    /// `AV_LOG_FATAL`.
    Fatal,
    /// `AV_LOG_ERROR`.
    Error,
    /// `AV_LOG_WARNING`.
    Warning,
    /// `AV_LOG_INFO`, FFmpeg's default and the command line's.
    Info,
    /// `AV_LOG_VERBOSE`. Also dumps the input format on open.
    Verbose,
    /// `AV_LOG_DEBUG`.
    Debug,
    /// `AV_LOG_TRACE`.
    Trace,
}

impl FfmpegLogLevel {
    /// Map a numeric verbosity level to an FFmpeg level.
    ///
    /// Level `N` selects the FFmpeg value `N * 8 - 8`, so `0` is quiet, `1`
    /// is panic, `5` is info and `8` (or anything larger) is trace.
    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => FfmpegLogLevel::Quiet,
            1 => FfmpegLogLevel::Panic,
            2 => FfmpegLogLevel::Fatal,
            3 => FfmpegLogLevel::Error,
            4 => FfmpegLogLevel::Warning,
            5 => FfmpegLogLevel::Info,
            6 => FfmpegLogLevel::Verbose,
            7 => FfmpegLogLevel::Debug,
            _ => FfmpegLogLevel::Trace,
        }
    }

    /// The Rust-side `log` filter matching this level.
    pub fn to_log_filter(self) -> LevelFilter {
        match self {
            FfmpegLogLevel::Quiet => LevelFilter::Off,
            FfmpegLogLevel::Panic | FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => {
                LevelFilter::Error
            }
            FfmpegLogLevel::Warning => LevelFilter::Warn,
            FfmpegLogLevel::Info => LevelFilter::Info,
            FfmpegLogLevel::Verbose | FfmpegLogLevel::Debug => LevelFilter::Debug,
            FfmpegLogLevel::Trace => LevelFilter::Trace,
        }
    }

    /// Returns `true` if this level shows at least FFmpeg's verbose output.
    pub fn is_verbose(self) -> bool {
        matches!(
            self,
            FfmpegLogLevel::Verbose | FfmpegLogLevel::Debug | FfmpegLogLevel::Trace
        )
    }

    /// The numeric verbosity selecting this level, `0` (quiet) to `8`
    /// (trace).
    pub fn verbosity(self) -> u8 {
        match self {
            FfmpegLogLevel::Quiet => 0,
            FfmpegLogLevel::Panic => 1,
            FfmpegLogLevel::Fatal => 2,
            FfmpegLogLevel::Error => 3,
            FfmpegLogLevel::Warning => 4,
            FfmpegLogLevel::Info => 5,
            FfmpegLogLevel::Verbose => 6,
            FfmpegLogLevel::Debug => 7,
            FfmpegLogLevel::Trace => 8,
        }
    }

    // AV_LOG_* values are spaced 8 apart, starting at AV_LOG_QUIET = -8.
    fn to_ffmpeg_level(self) -> Level {
        Level::try_from(c_int::from(self.verbosity()) * 8 - 8).unwrap_or(Level::Info)
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        let value: c_int = level.into();
        Self::from_verbosity(u8::try_from((value + 8) / 8).unwrap_or(0))
    }
}

/// Set the level FFmpeg itself logs at (to stderr).
///
/// The Rust-side `log` filter is configured separately, typically from
/// [`FfmpegLogLevel::to_log_filter`].
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// The level FFmpeg currently logs at, or `None` if FFmpeg reports a value
/// between the named levels.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}
