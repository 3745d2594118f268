//! Frame preprocessing stages.
//!
//! Each stage takes the frame by `&mut` and either leaves it alone or swaps
//! in a new owned frame. The superseded frame is dropped on the spot, so no
//! stage has to track which buffers it allocated.
//!
//! [`preprocess`] runs the stages a [`PreProcessSettings`] plan enables, always
//! in the order deinterlace → crop → resize.

use ffmpeg_next::frame::Video as VideoFrame;

use crate::error::StillshotError;
use crate::filter::filter_single_frame;
use crate::preprocess::{FrameGeometry, PreProcessSettings};
use crate::scaler::ScalerCache;

const DEINTERLACE_FILTER: &str = "yadif=mode=send_frame:parity=auto:deint=all";

/// Deinterlace `frame` in place.
///
/// # Errors
///
/// Returns [`StillshotError::Filter`] if the `yadif` graph cannot be built
/// or produces no frame. `frame` is left unmodified in that case.
pub fn deinterlace(frame: &mut VideoFrame) -> Result<(), StillshotError> {
    let mut deinterlaced = filter_single_frame(frame, DEINTERLACE_FILTER)?;
    deinterlaced.set_pts(frame.pts());
    *frame = deinterlaced;
    Ok(())
}

/// Crop `frame` to its top-left `width × height` region.
///
/// The pixels are copied into a new frame with its own strides.
///
/// # Errors
///
/// Returns [`StillshotError::Filter`] if the crop filter fails.
pub fn crop(frame: &mut VideoFrame, width: u32, height: u32) -> Result<(), StillshotError> {
    if frame.width() == width && frame.height() == height {
        return Ok(());
    }
    let chain = format!("crop=w={width}:h={height}:x=0:y=0:exact=1");
    let mut cropped = filter_single_frame(frame, &chain)?;
    cropped.set_pts(frame.pts());
    *frame = cropped;
    Ok(())
}

/// Scale and/or convert `frame` to `target`.
///
/// # Errors
///
/// Returns [`StillshotError::Scale`] if the scaler cannot handle the
/// conversion.
pub fn resize(
    frame: &mut VideoFrame,
    target: FrameGeometry,
    scaler: &mut ScalerCache,
) -> Result<(), StillshotError> {
    *frame = scaler.scale(frame, target)?;
    Ok(())
}

/// Apply every stage enabled in `settings` to `frame`.
///
/// A deinterlace failure is logged once and switches the stage off in
/// `settings`, so later frames go through crop and resize only.
///
/// # Errors
///
/// Returns the first crop or resize error.
pub fn preprocess(
    settings: &mut PreProcessSettings,
    frame: &mut VideoFrame,
    scaler: &mut ScalerCache,
) -> Result<(), StillshotError> {
    if settings.deinterlace
        && let Err(error) = deinterlace(frame)
    {
        log::warn!("Deinterlacing failed, disabling it for the remaining frames: {error}");
        settings.deinterlace = false;
    }

    if settings.crop.enabled {
        crop(frame, settings.crop.width, settings.crop.height)?;
    }

    if settings.resize.enabled {
        resize(frame, settings.resize.target, scaler)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::format::Pixel;

    use super::*;
    use crate::configuration::ExtractOptions;

    fn gradient_frame(width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::new(Pixel::YUV420P, width, height);
        let stride = frame.stride(0);
        let luma = frame.data_mut(0);
        for row in 0..height as usize {
            for column in 0..width as usize {
                luma[row * stride + column] = (column % 256) as u8;
            }
        }
        frame.data_mut(1).fill(128);
        frame.data_mut(2).fill(128);
        frame
    }

    #[test]
    fn crop_keeps_top_left_pixels() {
        let mut frame = gradient_frame(64, 48);
        crop(&mut frame, 32, 24).unwrap();

        assert_eq!((frame.width(), frame.height()), (32, 24));
        assert_eq!(frame.format(), Pixel::YUV420P);
        let stride = frame.stride(0);
        let luma = frame.data(0);
        assert_eq!(luma[0], 0);
        assert_eq!(luma[31], 31);
        assert_eq!(luma[23 * stride + 5], 5);
    }

    fn interlaced_frame(width: u32, height: u32) -> VideoFrame {
        let mut frame = gradient_frame(width, height);
        let stride = frame.stride(0);
        let luma = frame.data_mut(0);
        for row in 0..height as usize {
            let value = if row % 2 == 0 { 16 } else { 235 };
            luma[row * stride..row * stride + width as usize].fill(value);
        }
        frame.set_pts(Some(0));
        frame
    }

    fn luma_rows(frame: &VideoFrame) -> Vec<Vec<u8>> {
        let stride = frame.stride(0);
        let width = frame.width() as usize;
        frame
            .data(0)
            .chunks(stride)
            .take(frame.height() as usize)
            .map(|row| row[..width].to_vec())
            .collect()
    }

    #[test]
    fn yadif_interpolates_one_field() {
        let frame = interlaced_frame(64, 48);
        let deinterlaced = filter_single_frame(&frame, DEINTERLACE_FILTER).unwrap();

        assert_eq!((deinterlaced.width(), deinterlaced.height()), (64, 48));
        assert_eq!(deinterlaced.format(), Pixel::YUV420P);
        assert_ne!(luma_rows(&deinterlaced), luma_rows(&frame));
    }

    #[test]
    fn deinterlace_replaces_frame_and_keeps_pts() {
        let mut frame = interlaced_frame(64, 48);
        let original = luma_rows(&frame);
        deinterlace(&mut frame).unwrap();

        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(frame.pts(), Some(0));
        assert_ne!(luma_rows(&frame), original);
    }

    #[test]
    fn failed_deinterlace_disables_stage() {
        // yadif rejects frames with fewer than three lines.
        let source = FrameGeometry::new(Pixel::YUV420P, 64, 2);
        let options = ExtractOptions::new("in.mp4", "%d.jpg").with_deinterlace(true);
        let mut settings = PreProcessSettings::plan(&options, source, Pixel::YUV420P);
        assert!(settings.deinterlace);

        let mut scaler = ScalerCache::new();
        let mut frame = gradient_frame(64, 2);
        assert!(deinterlace(&mut frame).is_err());
        preprocess(&mut settings, &mut frame, &mut scaler).unwrap();

        assert!(!settings.deinterlace);
        assert_eq!((frame.width(), frame.height()), (64, 2));
    }

    #[test]
    fn disabled_pipeline_is_identity() {
        let source = FrameGeometry::new(Pixel::YUV420P, 64, 48);
        let mut settings =
            PreProcessSettings::plan(&ExtractOptions::new("in.mp4", "%d.jpg"), source, Pixel::YUV420P);
        assert!(settings.is_identity());

        let mut frame = gradient_frame(64, 48);
        let mut scaler = ScalerCache::new();
        preprocess(&mut settings, &mut frame, &mut scaler).unwrap();

        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(frame.format(), Pixel::YUV420P);
        assert_eq!(scaler.contexts_created(), 0);
    }

    #[test]
    fn crop_then_resize_reaches_planned_geometry() {
        let source = FrameGeometry::new(Pixel::YUV420P, 64, 48);
        let options = ExtractOptions::new("in.mp4", "%d.jpg")
            .with_crop_height(24)
            .with_resize(Some(16), None);
        let mut settings = PreProcessSettings::plan(&options, source, Pixel::YUVJ420P);

        let mut frame = gradient_frame(64, 48);
        let mut scaler = ScalerCache::new();
        preprocess(&mut settings, &mut frame, &mut scaler).unwrap();

        assert_eq!(settings.result, FrameGeometry::new(Pixel::YUVJ420P, 16, 12));
        assert_eq!((frame.width(), frame.height()), (16, 12));
        assert_eq!(frame.format(), Pixel::YUVJ420P);
    }
}
