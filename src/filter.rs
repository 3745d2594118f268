//! Single-frame FFmpeg filter graphs.
//!
//! Deinterlacing and cropping are delegated to libavfilter. Each call builds
//! a fresh `buffer → <chain> → buffersink` graph, pushes one frame followed
//! by end-of-stream, and returns the first frame the sink produces. Graphs
//! are never reused: every requested timestamp is an independent frame, so
//! stateful filters such as `yadif` must not see the previous one.

use ffmpeg_next::{filter::Graph as FilterGraph, frame::Video as VideoFrame};
use ffmpeg_sys_next::AVPixelFormat;

use crate::error::StillshotError;

/// Run `frame` through the filter chain `chain` and return the filtered copy.
///
/// # Errors
///
/// Returns [`StillshotError::Filter`] if the graph cannot be built, rejects
/// the frame, or produces no output.
pub(crate) fn filter_single_frame(
    frame: &VideoFrame,
    chain: &str,
) -> Result<VideoFrame, StillshotError> {
    let mut graph = FilterGraph::new();

    let aspect = frame.aspect_ratio();
    let (aspect_numerator, aspect_denominator) =
        if aspect.numerator() > 0 && aspect.denominator() > 0 {
            (aspect.numerator(), aspect.denominator())
        } else {
            (1, 1)
        };

    let buffer_args = format!(
        "video_size={}x{}:pix_fmt={}:time_base=1/1:pixel_aspect={}/{}",
        frame.width(),
        frame.height(),
        AVPixelFormat::from(frame.format()) as i32,
        aspect_numerator,
        aspect_denominator,
    );

    graph
        .add(
            &ffmpeg_next::filter::find("buffer").ok_or_else(|| {
                StillshotError::Filter("FFmpeg 'buffer' filter not found".to_string())
            })?,
            "in",
            &buffer_args,
        )
        .map_err(|e| StillshotError::Filter(format!("Failed to add buffer filter: {e}")))?;

    graph
        .add(
            &ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
                StillshotError::Filter("FFmpeg 'buffersink' filter not found".to_string())
            })?,
            "out",
            "",
        )
        .map_err(|e| StillshotError::Filter(format!("Failed to add buffersink filter: {e}")))?;

    graph
        .output("in", 0)
        .map_err(|e| StillshotError::Filter(format!("Filter graph output error: {e}")))?
        .input("out", 0)
        .map_err(|e| StillshotError::Filter(format!("Filter graph input error: {e}")))?
        .parse(chain)
        .map_err(|e| StillshotError::Filter(format!("Filter graph parse error ({chain}): {e}")))?;

    graph
        .validate()
        .map_err(|e| StillshotError::Filter(format!("Filter graph validation: {e}")))?;

    {
        let mut input = graph
            .get("in")
            .ok_or_else(|| StillshotError::Filter("Filter 'in' not found".to_string()))?;
        let mut source = input.source();
        source
            .add(frame)
            .map_err(|e| StillshotError::Filter(format!("Failed to feed filter: {e}")))?;
        source
            .flush()
            .map_err(|e| StillshotError::Filter(format!("Failed to flush filter: {e}")))?;
    }

    let mut filtered = VideoFrame::empty();
    graph
        .get("out")
        .ok_or_else(|| StillshotError::Filter("Filter 'out' not found".to_string()))?
        .sink()
        .frame(&mut filtered)
        .map_err(|e| StillshotError::Filter(format!("Filter produced no frame ({chain}): {e}")))?;

    Ok(filtered)
}
