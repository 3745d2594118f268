//! Preprocessing planner tests.
//!
//! The planner is pure, so these run without any media fixture.

use ffmpeg_next::format::Pixel;
use stillshot::{ExtractOptions, FrameGeometry, PreProcessSettings};

fn hd_source() -> FrameGeometry {
    FrameGeometry::new(Pixel::YUV420P, 1280, 720)
}

fn options() -> ExtractOptions {
    ExtractOptions::new("input.mp4", "shot_%d.jpg").with_timestamp(1)
}

#[test]
fn nothing_requested_is_identity() {
    let settings = PreProcessSettings::plan(&options(), hd_source(), Pixel::YUV420P);

    assert!(settings.is_identity());
    assert_eq!(settings.result, hd_source());
}

#[test]
fn crop_derives_width_from_aspect_ratio() {
    let settings = PreProcessSettings::plan(
        &options().with_crop_height(480),
        hd_source(),
        Pixel::YUV420P,
    );

    assert!(settings.crop.enabled);
    assert_eq!((settings.crop.width, settings.crop.height), (853, 480));
    assert_eq!((settings.result.width, settings.result.height), (853, 480));
    assert!(!settings.resize.enabled);
}

#[test]
fn crop_keeps_aspect_within_one_rounding_unit() {
    let source = hd_source();
    for height in [1, 99, 240, 333, 481, 719, 720] {
        let settings =
            PreProcessSettings::plan(&options().with_crop_height(height), source, Pixel::YUV420P);
        let expected = source.aspect_ratio() * height as f64;
        let deviation = (settings.crop.width as f64 - expected).abs();
        assert!(deviation <= 0.5, "height {height}: width {} vs {expected}", settings.crop.width);
    }
}

#[test]
fn crop_then_resize_composes() {
    let settings = PreProcessSettings::plan(
        &options().with_crop_height(480).with_resize(Some(640), None),
        hd_source(),
        Pixel::YUV420P,
    );

    assert!(settings.crop.enabled);
    assert!(settings.resize.enabled);
    assert_eq!(settings.resize.target, FrameGeometry::new(Pixel::YUV420P, 640, 360));
    assert_eq!(settings.result, settings.resize.target);
}

#[test]
fn single_axis_resize_preserves_aspect() {
    let source = hd_source();

    let by_height = PreProcessSettings::plan(
        &options().with_resize(None, Some(360)),
        source,
        Pixel::YUV420P,
    );
    assert_eq!((by_height.result.width, by_height.result.height), (640, 360));

    let by_width = PreProcessSettings::plan(
        &options().with_resize(Some(320), None),
        source,
        Pixel::YUV420P,
    );
    assert_eq!((by_width.result.width, by_width.result.height), (320, 180));
}

#[test]
fn non_positive_axis_is_derived() {
    let settings = PreProcessSettings::plan(
        &options().with_resize(Some(0), Some(180)),
        hd_source(),
        Pixel::YUV420P,
    );

    assert!(settings.resize.enabled);
    assert_eq!((settings.result.width, settings.result.height), (320, 180));
}

#[test]
fn both_axes_non_positive_disables_resize() {
    let settings = PreProcessSettings::plan(
        &options().with_resize(Some(-4), Some(0)),
        hd_source(),
        Pixel::YUV420P,
    );

    assert!(!settings.resize.enabled);
    assert_eq!(settings.result, hd_source());
}

#[test]
fn invalid_crop_is_ignored() {
    for height in [0, -10, 721] {
        let settings = PreProcessSettings::plan(
            &options().with_crop_height(height),
            hd_source(),
            Pixel::YUV420P,
        );
        assert!(!settings.crop.enabled, "crop height {height} should be rejected");
        assert_eq!(settings.result, hd_source());
    }
}

#[test]
fn format_mismatch_enables_conversion() {
    let settings = PreProcessSettings::plan(&options(), hd_source(), Pixel::YUVJ420P);

    assert!(settings.resize.enabled);
    assert_eq!(settings.resize.target, FrameGeometry::new(Pixel::YUVJ420P, 1280, 720));
    assert_eq!(settings.result.format, Pixel::YUVJ420P);
}

#[test]
fn conversion_can_be_disabled() {
    let settings = PreProcessSettings::plan(
        &options().with_pixel_format_conversion(false),
        hd_source(),
        Pixel::YUVJ420P,
    );

    assert!(!settings.resize.enabled);
}

#[test]
fn deinterlace_flag_is_copied() {
    let settings =
        PreProcessSettings::plan(&options().with_deinterlace(true), hd_source(), Pixel::YUV420P);

    assert!(settings.deinterlace);
    assert!(!settings.is_identity());
}
