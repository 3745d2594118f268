//! Input opening and frame acquisition.
//!
//! [`InputSource`] owns the demuxer, the selected video stream and the one
//! decoder used for the whole run. [`InputSource::acquire_frame`] implements
//! seek → flush → decode-until-reached for a single timestamp.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Rational, codec::context::Context as CodecContext, decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    util::error::EAGAIN,
};
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AVSEEK_FLAG_BACKWARD};

use crate::conversion::{
    microseconds_to_stream_timestamp, pts_to_seconds, seconds_to_stream_timestamp,
};
use crate::error::StillshotError;
use crate::ffmpeg::get_ffmpeg_log_level;
use crate::preprocess::FrameGeometry;

/// Read-only facts about the selected video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Index of the stream inside the container.
    pub index: usize,
    /// Decoder name (e.g. `"h264"`).
    pub codec: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format the decoder produces.
    pub format: Pixel,
    /// Stream time base.
    pub time_base: Rational,
    /// Stream duration in time-base units, if the container records it.
    pub duration: Option<i64>,
    /// Presentation time of the first frame in time-base units, if known.
    pub start_time: Option<i64>,
    /// Container duration in microseconds, if known.
    pub container_duration: Option<i64>,
}

impl StreamInfo {
    /// Stream duration in time-base units, falling back to the container
    /// duration when the stream does not record one.
    pub fn effective_duration(&self) -> Option<i64> {
        self.duration.or_else(|| {
            self.container_duration
                .map(|micros| microseconds_to_stream_timestamp(micros, self.time_base))
        })
    }

    /// Compute the decode target for `seconds`, in stream time-base units.
    ///
    /// The stream start time is added when known.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::TimestampOutOfRange`] if `seconds` lies
    /// beyond the known duration.
    pub fn seek_target(&self, seconds: u64) -> Result<i64, StillshotError> {
        let timestamp = seconds_to_stream_timestamp(seconds, self.time_base);
        if let Some(duration) = self.effective_duration()
            && timestamp > duration
        {
            return Err(StillshotError::TimestampOutOfRange { seconds });
        }
        Ok(timestamp.saturating_add(self.start_time.unwrap_or(0)))
    }
}

/// An opened input file with its video decoder.
pub struct InputSource {
    input_context: Input,
    decoder: VideoDecoder,
    info: StreamInfo,
    path: PathBuf,
}

impl InputSource {
    /// Open `path`, select the best video stream and open its decoder.
    ///
    /// # Errors
    ///
    /// - [`StillshotError::InputOpen`] if the file cannot be opened or probed.
    /// - [`StillshotError::StreamNotFound`] if there is no video stream.
    /// - [`StillshotError::DecoderUnavailable`] if no decoder matches the codec.
    /// - [`StillshotError::DecoderOpen`] if the decoder rejects the stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StillshotError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening media file: {}", path.display());

        ffmpeg_next::init().map_err(|error| StillshotError::InputOpen {
            path: path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| StillshotError::InputOpen {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        if get_ffmpeg_log_level().is_some_and(|level| level.is_verbose()) {
            ffmpeg_next::format::context::input::dump(&input_context, 0, path.to_str());
        }

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(StillshotError::StreamNotFound)?;
        let index = stream.index();
        let time_base = stream.time_base();
        let duration = Some(stream.duration()).filter(|&d| d != AV_NOPTS_VALUE && d > 0);
        let start_time = Some(stream.start_time()).filter(|&t| t != AV_NOPTS_VALUE);
        let codec_parameters = stream.parameters();
        let codec_id = codec_parameters.id();

        let codec = ffmpeg_next::decoder::find(codec_id)
            .ok_or_else(|| StillshotError::DecoderUnavailable(codec_id.name().to_string()))?;
        let decoder = CodecContext::from_parameters(codec_parameters)
            .and_then(|context| context.decoder().open_as(codec))
            .and_then(|opened| opened.video())
            .map_err(|error| {
                StillshotError::DecoderOpen(format!("{}: {error}", codec.name()))
            })?;

        let container_duration =
            Some(input_context.duration()).filter(|&d| d != AV_NOPTS_VALUE && d > 0);

        let info = StreamInfo {
            index,
            codec: codec.name().to_string(),
            width: decoder.width(),
            height: decoder.height(),
            format: decoder.format(),
            time_base,
            duration,
            start_time,
            container_duration,
        };

        log::debug!(
            "Selected stream is {} ({} {}x{} {:?}, time base {}/{})",
            index,
            info.codec,
            info.width,
            info.height,
            info.format,
            time_base.numerator(),
            time_base.denominator(),
        );

        Ok(Self {
            input_context,
            decoder,
            info,
            path,
        })
    }

    /// Facts about the selected stream.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Path the input was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel format and dimensions the decoder reports.
    pub fn source_geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.info.format, self.info.width, self.info.height)
    }

    /// Time base for encoded frames: the decoder's, or the stream's when the
    /// decoder leaves it unset.
    pub fn frame_time_base(&self) -> Rational {
        let time_base = self.decoder.time_base();
        if time_base.numerator() > 0 && time_base.denominator() > 0 {
            time_base
        } else {
            self.info.time_base
        }
    }

    /// Seek to `seconds`, flush the decoder and decode forward until a frame
    /// at or after that time is reached.
    ///
    /// A failed seek is only logged; decoding continues from wherever the
    /// demuxer is. At end of stream the last decoded frame is returned.
    ///
    /// # Errors
    ///
    /// - [`StillshotError::TimestampOutOfRange`] if `seconds` exceeds the
    ///   stream duration.
    /// - [`StillshotError::Decode`] if the decoder rejects a packet or fails
    ///   to return a frame.
    /// - [`StillshotError::FrameUnavailable`] if nothing could be decoded.
    pub fn acquire_frame(&mut self, seconds: u64) -> Result<VideoFrame, StillshotError> {
        let target = self.info.seek_target(seconds)?;

        log::info!("seeking to {target} ({seconds}s)");
        self.seek(target);
        self.decoder.flush();

        let frame = self
            .decode_until(target)?
            .ok_or(StillshotError::FrameUnavailable { seconds })?;

        if let Some(timestamp) = frame.timestamp() {
            let start = self.info.start_time.unwrap_or(0);
            log::debug!(
                "Decoded frame at {:.3}s for request {seconds}s",
                pts_to_seconds(timestamp.saturating_sub(start), self.info.time_base)
            );
        }
        Ok(frame)
    }

    fn seek(&mut self, target: i64) {
        let result = unsafe {
            ffmpeg_sys_next::av_seek_frame(
                self.input_context.as_mut_ptr(),
                self.info.index as i32,
                target,
                AVSEEK_FLAG_BACKWARD as i32,
            )
        };
        if result < 0 {
            log::warn!(
                "Error while seeking to {target}: {}",
                ffmpeg_next::Error::from(result)
            );
        }
    }

    fn decode_until(&mut self, target: i64) -> Result<Option<VideoFrame>, StillshotError> {
        let stream_index = self.info.index;
        let mut decoded = VideoFrame::empty();
        let mut last_decoded = None;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != stream_index {
                continue;
            }
            log::trace!(
                "packet size:{} pts:{:?} dts:{:?} goal:{target}",
                packet.size(),
                packet.pts(),
                packet.dts(),
            );

            self.decoder
                .send_packet(&packet)
                .map_err(|e| StillshotError::Decode(e.to_string()))?;

            while frame_received(self.decoder.receive_frame(&mut decoded))? {
                log::trace!("got frame best-effort timestamp {:?}", decoded.timestamp());
                if decoded.timestamp().is_some_and(|ts| ts >= target) {
                    return Ok(Some(decoded));
                }
                last_decoded = Some(std::mem::replace(&mut decoded, VideoFrame::empty()));
            }
        }

        log::debug!("Reached end of stream before {target}, draining decoder");
        let _ = self.decoder.send_eof();
        while frame_received(self.decoder.receive_frame(&mut decoded))? {
            if decoded.timestamp().is_some_and(|ts| ts >= target) {
                return Ok(Some(decoded));
            }
            last_decoded = Some(std::mem::replace(&mut decoded, VideoFrame::empty()));
        }

        Ok(last_decoded)
    }
}

/// Map a `receive_frame` result to whether a frame is ready. Needing more
/// input and end of stream both end the receive loop.
fn frame_received(result: Result<(), ffmpeg_next::Error>) -> Result<bool, StillshotError> {
    match result {
        Ok(()) => Ok(true),
        Err(ffmpeg_next::Error::Other { errno }) if errno == EAGAIN => Ok(false),
        Err(ffmpeg_next::Error::Eof) => Ok(false),
        Err(error) => Err(StillshotError::Decode(error.to_string())),
    }
}
