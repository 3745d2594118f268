//! Cached software scaler.
//!
//! [`ScalerCache`] keeps one `swscale` context and reuses it as long as the
//! source and destination geometry stay the same, recreating it when either
//! changes. It is owned by the extraction session rather than living in a
//! static.

use ffmpeg_next::{
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::error::StillshotError;
use crate::preprocess::FrameGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalerKey {
    source: FrameGeometry,
    destination: FrameGeometry,
}

/// A scaling context memoized on its source/destination parameters.
#[derive(Default)]
pub struct ScalerCache {
    cached: Option<(ScalerKey, ScalingContext)>,
    created: u64,
}

impl ScalerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale and/or convert `frame` into a newly allocated frame of `target`
    /// geometry, using bicubic interpolation.
    ///
    /// # Errors
    ///
    /// Returns [`StillshotError::Scale`] if no scaling context exists for the
    /// conversion or the conversion fails.
    pub fn scale(
        &mut self,
        frame: &VideoFrame,
        target: FrameGeometry,
    ) -> Result<VideoFrame, StillshotError> {
        let key = ScalerKey {
            source: FrameGeometry::new(frame.format(), frame.width(), frame.height()),
            destination: target,
        };

        let context = self.context_for(key)?;
        let mut scaled = VideoFrame::empty();
        context.run(frame, &mut scaled).map_err(|e| {
            StillshotError::Scale(format!(
                "conversion {:?} {}x{} -> {:?} {}x{} failed: {e}",
                key.source.format,
                key.source.width,
                key.source.height,
                target.format,
                target.width,
                target.height,
            ))
        })?;
        scaled.set_pts(frame.pts());
        Ok(scaled)
    }

    /// Number of scaling contexts created so far.
    pub fn contexts_created(&self) -> u64 {
        self.created
    }

    fn context_for(&mut self, key: ScalerKey) -> Result<&mut ScalingContext, StillshotError> {
        let reusable = matches!(&self.cached, Some((cached_key, _)) if *cached_key == key);
        if !reusable {
            let context = ScalingContext::get(
                key.source.format,
                key.source.width,
                key.source.height,
                key.destination.format,
                key.destination.width,
                key.destination.height,
                ScalingFlags::BICUBIC,
            )
            .map_err(|e| {
                StillshotError::Scale(format!(
                    "Impossible to create scale context for the conversion \
                     fmt:{:?} s:{}x{} -> fmt:{:?} s:{}x{}: {e}",
                    key.source.format,
                    key.source.width,
                    key.source.height,
                    key.destination.format,
                    key.destination.width,
                    key.destination.height,
                ))
            })?;
            log::debug!(
                "Created scaler {:?} {}x{} -> {:?} {}x{}",
                key.source.format,
                key.source.width,
                key.source.height,
                key.destination.format,
                key.destination.width,
                key.destination.height,
            );
            self.cached = Some((key, context));
            self.created += 1;
        }

        match &mut self.cached {
            Some((_, context)) => Ok(context),
            None => Err(StillshotError::Scale("scaler cache is empty".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use ffmpeg_next::format::Pixel;

    use super::*;

    fn blank_frame(format: Pixel, width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::new(format, width, height);
        for plane in 0..frame.planes() {
            frame.data_mut(plane).fill(16);
        }
        frame
    }

    #[test]
    fn reuses_context_for_identical_parameters() {
        let mut cache = ScalerCache::new();
        let frame = blank_frame(Pixel::YUV420P, 64, 48);
        let target = FrameGeometry::new(Pixel::RGB24, 32, 24);

        let first = cache.scale(&frame, target).unwrap();
        let second = cache.scale(&frame, target).unwrap();

        assert_eq!(cache.contexts_created(), 1);
        assert_eq!((first.width(), first.height()), (32, 24));
        assert_eq!(second.format(), Pixel::RGB24);
    }

    #[test]
    fn recreates_context_when_parameters_change() {
        let mut cache = ScalerCache::new();
        let frame = blank_frame(Pixel::YUV420P, 64, 48);

        cache
            .scale(&frame, FrameGeometry::new(Pixel::YUV420P, 32, 24))
            .unwrap();
        let scaled = cache
            .scale(&frame, FrameGeometry::new(Pixel::YUV420P, 16, 12))
            .unwrap();

        assert_eq!(cache.contexts_created(), 2);
        assert_eq!((scaled.width(), scaled.height()), (16, 12));
    }
}
