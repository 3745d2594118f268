//! Output format guessing and single-frame encoding.
//!
//! Setup happens in two steps. [`OutputTarget::guess`] resolves the muxer and
//! encoder from the output filename and reconciles the pixel format; the
//! frame size is not known yet because it depends on the preprocessing plan,
//! which in turn depends on the chosen pixel format. [`OutputTarget::open`]
//! then opens one [`FrameEncoder`] that is reused for every written file.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;

use ffmpeg_next::{
    Codec, Dictionary, Packet, Rational,
    codec::{Capabilities, Id, context::Context as CodecContext},
    encoder::video::Encoder as VideoEncoder,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
};
use ffmpeg_sys_next::{
    AV_CODEC_FLAG_GLOBAL_HEADER, AVFMT_GLOBALHEADER, AVPixelFormat, FF_COMPLIANCE_UNOFFICIAL,
};

use crate::error::StillshotError;

const MJPEG_FORMATS: &[Pixel] = &[Pixel::YUVJ420P, Pixel::YUVJ422P, Pixel::YUV420P, Pixel::YUV422P];

const LJPEG_FORMATS: &[Pixel] = &[
    Pixel::YUVJ420P,
    Pixel::YUVJ422P,
    Pixel::YUVJ444P,
    Pixel::YUV420P,
    Pixel::YUV422P,
    Pixel::YUV444P,
    Pixel::BGRA,
];

/// Muxer and encoder resolved from the output filename, before the frame
/// size is known.
pub struct OutputTarget {
    format_name: String,
    global_header: bool,
    codec: Codec,
    pixel_format: Pixel,
    time_base: Rational,
}

impl OutputTarget {
    /// Guess the container and video codec for `filename` and pick the pixel
    /// format the encoder will be opened with.
    ///
    /// # Errors
    ///
    /// - [`StillshotError::OutputFormatGuess`] if no muxer matches `filename`.
    /// - [`StillshotError::EncoderNotFound`] if no encoder exists for the
    ///   guessed codec.
    /// - [`StillshotError::EncoderOpen`] if the encoder holds frames back
    ///   instead of emitting one packet per frame.
    /// - [`StillshotError::PixelFormatUnresolved`] if no compatible pixel
    ///   format exists.
    pub fn guess(
        filename: &str,
        source_format: Pixel,
        time_base: Rational,
    ) -> Result<Self, StillshotError> {
        let (format_name, global_header, codec_id) = guess_muxer(filename)?;

        let codec = ffmpeg_next::encoder::find(codec_id)
            .ok_or_else(|| StillshotError::EncoderNotFound(codec_id.name().to_string()))?;
        reject_delayed_encoder(codec.name(), codec.capabilities())?;

        let supported: Option<Vec<Pixel>> = codec
            .video()
            .ok()
            .and_then(|video| video.formats())
            .map(|formats| formats.collect());

        let pixel_format = choose_pixel_format(codec_id, supported.as_deref(), source_format, true)
            .ok_or_else(|| StillshotError::PixelFormatUnresolved {
                codec: codec.name().to_string(),
            })?;

        log::debug!(
            "Output muxer {format_name}, encoder {} ({pixel_format:?})",
            codec.name()
        );

        Ok(Self {
            format_name,
            global_header,
            codec,
            pixel_format,
            time_base,
        })
    }

    /// Pixel format the encoder expects.
    pub fn pixel_format(&self) -> Pixel {
        self.pixel_format
    }

    /// Short name of the guessed muxer (e.g. `"image2"`).
    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    /// Name of the chosen encoder.
    pub fn codec_name(&self) -> &str {
        self.codec.name()
    }

    /// Open the encoder for frames of `width × height`.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::EncoderOpen`] if the encoder rejects the
    /// configuration.
    pub fn open(self, width: u32, height: u32) -> Result<FrameEncoder, StillshotError> {
        let mut encoder = CodecContext::new_with_codec(self.codec)
            .encoder()
            .video()
            .map_err(|e| StillshotError::EncoderOpen(e.to_string()))?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(self.pixel_format);
        encoder.set_time_base(self.time_base);

        unsafe {
            let context = encoder.as_mut_ptr();
            if self.global_header {
                (*context).flags |= AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
            (*context).strict_std_compliance = FF_COMPLIANCE_UNOFFICIAL as i32;
        }

        let encoder = encoder.open_as(self.codec).map_err(|e| {
            StillshotError::EncoderOpen(format!(
                "{} {width}x{height} {:?}: {e}",
                self.codec.name(),
                self.pixel_format
            ))
        })?;

        log::debug!(
            "Opened encoder {} at {width}x{height} {:?}",
            self.codec.name(),
            self.pixel_format
        );

        Ok(FrameEncoder {
            encoder,
            codec: self.codec,
            format_name: self.format_name,
            time_base: self.time_base,
        })
    }
}

/// An opened encoder that writes one frame per output file.
pub struct FrameEncoder {
    encoder: VideoEncoder,
    codec: Codec,
    format_name: String,
    time_base: Rational,
}

impl FrameEncoder {
    /// Encode `frame` and write it as a complete file at `path`.
    ///
    /// Each call builds a fresh output container with a single stream, so a
    /// failure only affects this file.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::Encode`] naming `path` if the container
    /// cannot be written or the encoder produces no packet.
    pub fn write_frame(&mut self, path: &Path, frame: &VideoFrame) -> Result<(), StillshotError> {
        let describe = |stage: &str, error: ffmpeg_next::Error| {
            StillshotError::Encode(format!("{stage} for {}: {error}", path.display()))
        };

        let mut output = ffmpeg_next::format::output_as(&path, &self.format_name)
            .map_err(|e| describe("cannot create output", e))?;

        let stream_index = {
            let mut stream = output
                .add_stream(self.codec)
                .map_err(|e| describe("cannot add stream", e))?;
            stream.set_parameters(&self.encoder);
            stream.set_time_base(self.time_base);
            stream.index()
        };

        let mut options = Dictionary::new();
        options.set("update", "1");
        output
            .write_header_with(options)
            .map_err(|e| describe("cannot write header", e))?;

        self.encoder
            .send_frame(frame)
            .map_err(|e| describe("cannot encode frame", e))?;

        let mut packet = Packet::empty();
        let mut packets = 0usize;
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(stream_index);
            packet.set_pts(Some(0));
            packet.set_dts(Some(0));
            packet
                .write_interleaved(&mut output)
                .map_err(|e| describe("cannot write packet", e))?;
            packets += 1;
        }

        if packets == 0 {
            return Err(StillshotError::Encode(format!(
                "{} produced no packet for {}",
                self.codec.name(),
                path.display()
            )));
        }

        output
            .write_trailer()
            .map_err(|e| describe("cannot write trailer", e))?;

        log::debug!("Wrote {packets} packet(s) to {}", path.display());
        Ok(())
    }
}

/// The encoder is shared by every output file, so a frame it keeps buffered
/// would end up in a later file.
fn reject_delayed_encoder(name: &str, capabilities: Capabilities) -> Result<(), StillshotError> {
    if capabilities.contains(Capabilities::DELAY) {
        return Err(StillshotError::EncoderOpen(format!(
            "{name} delays its output and cannot write single-frame files"
        )));
    }
    Ok(())
}

fn guess_muxer(filename: &str) -> Result<(String, bool, Id), StillshotError> {
    let unguessable = || StillshotError::OutputFormatGuess(filename.to_string());
    let c_filename = CString::new(filename).map_err(|_| unguessable())?;

    unsafe {
        let format = ffmpeg_sys_next::av_guess_format(ptr::null(), c_filename.as_ptr(), ptr::null());
        if format.is_null() || (*format).name.is_null() {
            return Err(unguessable());
        }

        let name = CStr::from_ptr((*format).name).to_string_lossy().into_owned();
        let global_header = (*format).flags & AVFMT_GLOBALHEADER as i32 != 0;
        let codec_id = Id::from(ffmpeg_sys_next::av_guess_codec(
            format,
            ptr::null(),
            c_filename.as_ptr(),
            ptr::null(),
            Type::Video.into(),
        ));

        if codec_id == Id::None {
            return Err(StillshotError::EncoderNotFound(format!(
                "no video codec for muxer {name}"
            )));
        }

        Ok((name, global_header, codec_id))
    }
}

/// Pick the pixel format an encoder should be opened with for frames in
/// `source` format.
///
/// `supported` is the encoder's published list; `None` means the encoder
/// accepts anything and `source` is kept. With `unofficial_compliance`, the
/// JPEG encoders also consider their full-range YUV formats. Returns `None`
/// when no candidate is usable.
pub fn choose_pixel_format(
    codec: Id,
    supported: Option<&[Pixel]>,
    source: Pixel,
    unofficial_compliance: bool,
) -> Option<Pixel> {
    let Some(supported) = supported else {
        return Some(source);
    };
    if supported.contains(&source) {
        return Some(source);
    }

    let candidates = match codec {
        Id::MJPEG if unofficial_compliance => MJPEG_FORMATS,
        Id::LJPEG if unofficial_compliance => LJPEG_FORMATS,
        _ => supported,
    };

    let has_alpha = source
        .descriptor()
        .is_some_and(|descriptor| descriptor.nb_components() % 2 == 0);

    let best = candidates
        .iter()
        .fold(AVPixelFormat::AV_PIX_FMT_NONE, |best, &candidate| unsafe {
            ffmpeg_sys_next::avcodec_find_best_pix_fmt_of_2(
                best,
                candidate.into(),
                source.into(),
                i32::from(has_alpha),
                ptr::null_mut(),
            )
        });

    let chosen = Pixel::from(best);
    if chosen == Pixel::None {
        return None;
    }

    if chosen != source {
        log::warn!(
            "Incompatible pixel format '{source:?}' for codec '{codec:?}', auto-selecting format '{chosen:?}'"
        );
    }
    Some(chosen)
}
