//! Timestamp and geometry conversions.
//!
//! Helpers for rescaling timestamps between seconds, microseconds and stream
//! time bases, and for deriving one frame dimension from the other while
//! keeping an aspect ratio.

use ffmpeg_next::Rational;

/// Convert whole seconds to a timestamp in the stream's time base.
///
/// Rounds to the nearest unit. A degenerate time base is treated as `1/1`.
pub fn seconds_to_stream_timestamp(seconds: u64, time_base: Rational) -> i64 {
    rescale(
        seconds as i128,
        1,
        time_base.numerator() as i128,
        time_base.denominator() as i128,
    )
}

/// Convert microseconds (FFmpeg's `AV_TIME_BASE`) to the stream's time base.
pub fn microseconds_to_stream_timestamp(microseconds: i64, time_base: Rational) -> i64 {
    rescale(
        microseconds as i128,
        1_000_000,
        time_base.numerator() as i128,
        time_base.denominator() as i128,
    )
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

// value / source_scale seconds → units of numerator/denominator seconds
fn rescale(value: i128, source_scale: i128, numerator: i128, denominator: i128) -> i64 {
    let (numerator, denominator) = if numerator <= 0 || denominator <= 0 {
        (1, 1)
    } else {
        (numerator, denominator)
    };
    let scaled = value * denominator;
    let divisor = source_scale * numerator;
    let rounded = if scaled >= 0 {
        (scaled + divisor / 2) / divisor
    } else {
        (scaled - divisor / 2) / divisor
    };
    rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Width that keeps the `source_width:source_height` aspect ratio at the
/// given height, rounded to the nearest pixel and at least one pixel.
pub fn width_for_height(source_width: u32, source_height: u32, height: u32) -> u32 {
    if source_height == 0 {
        return height.max(1);
    }
    let width = source_width as f64 / source_height as f64 * height as f64;
    (width.round() as u32).max(1)
}

/// Height that keeps the `source_width:source_height` aspect ratio at the
/// given width, rounded to the nearest pixel and at least one pixel.
pub fn height_for_width(source_width: u32, source_height: u32, width: u32) -> u32 {
    if source_width == 0 {
        return width.max(1);
    }
    let height = source_height as f64 / source_width as f64 * width as f64;
    (height.round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_to_common_time_bases() {
        assert_eq!(seconds_to_stream_timestamp(2, Rational::new(1, 90_000)), 180_000);
        assert_eq!(seconds_to_stream_timestamp(5, Rational::new(1, 15_360)), 76_800);
        assert_eq!(seconds_to_stream_timestamp(3, Rational::new(1001, 30_000)), 90);
        assert_eq!(seconds_to_stream_timestamp(0, Rational::new(1, 1000)), 0);
    }

    #[test]
    fn degenerate_time_base_is_identity() {
        assert_eq!(seconds_to_stream_timestamp(7, Rational::new(0, 1)), 7);
        assert_eq!(seconds_to_stream_timestamp(7, Rational::new(1, 0)), 7);
    }

    #[test]
    fn microseconds_rescale() {
        assert_eq!(
            microseconds_to_stream_timestamp(10_000_000, Rational::new(1, 90_000)),
            900_000,
        );
        assert_eq!(
            microseconds_to_stream_timestamp(1_500, Rational::new(1, 1000)),
            2,
        );
    }

    #[test]
    fn pts_seconds() {
        assert!((pts_to_seconds(180_000, Rational::new(1, 90_000)) - 2.0).abs() < 1e-9);
        assert_eq!(pts_to_seconds(10, Rational::new(1, 0)), 0.0);
    }

    #[test]
    fn aspect_derivation_rounds() {
        assert_eq!(width_for_height(1280, 720, 480), 853);
        assert_eq!(height_for_width(853, 480, 640), 360);
        assert_eq!(height_for_width(1920, 1080, 640), 360);
        assert_eq!(width_for_height(640, 480, 240), 320);
    }

    #[test]
    fn aspect_derivation_never_zero() {
        assert_eq!(height_for_width(4000, 1, 10), 1);
        assert_eq!(width_for_height(0, 0, 0), 1);
    }
}
