//! ## unreal-core::layout
//! **Largest-point-size fitting for the fixed-format time string**
//!
//! The time string is laid out in cells: every digit and the blank padding
//! share one fixed-width digit cell, while `:` and `.` keep their natural
//! widths. [`LayoutFitter::fit`] searches the largest integer point size
//! whose composed footprint fits a ceiling, by doubling until the footprint
//! overflows and then bisecting between the last fitting and the first
//! overflowing size. This is exact as long as glyph widths and line height
//! never shrink when the point size grows.
//!
//! ### Expectations:
//! - Logarithmic number of metric queries in the chosen point size
//! - Identical inputs always produce identical [`LayoutMetrics`]

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::format::MAX_SUBSECONDS;
use crate::ClockError;

/// Upper bound for the doubling phase, for fonts whose metrics stop growing.
pub const MAX_POINT_SIZE: u32 = 1 << 16;

/// Number of separators between hours, minutes and seconds.
const COLONS: u32 = 2;

/// Hour, minute and second digits.
const CLOCK_DIGITS: u32 = 6;

/// Font-metrics queries the fitter needs. Sizes are integer points, results pixels.
pub trait GlyphMetrics {
    fn glyph_width(&self, c: char, point_size: u32) -> u32;

    /// Rendered width of a whole run of text. Fonts that kern override this.
    fn text_width(&self, text: &str, point_size: u32) -> u32 {
        text.chars().map(|c| self.glyph_width(c, point_size)).sum()
    }

    fn line_height(&self, point_size: u32) -> u32;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("no point size fits a {}x{} area", .0.width, .0.height)]
    NoFit(Footprint),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both axes are within `ceiling`.
    pub fn fits_within(&self, ceiling: &Footprint) -> bool {
        self.width <= ceiling.width && self.height <= ceiling.height
    }
}

/// One axis of the colon nudge, decided once when the value is parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisOffset {
    /// Whole pixels.
    Absolute(i32),
    /// Fraction of the colon cell dimension on this axis.
    Relative(f64),
}

impl AxisOffset {
    /// Pixel offset for a cell of `dimension` pixels; fractions truncate toward zero.
    pub fn resolve(&self, dimension: u32) -> i32 {
        match *self {
            AxisOffset::Absolute(pixels) => pixels,
            AxisOffset::Relative(fraction) => (fraction * dimension as f64).trunc() as i32,
        }
    }
}

impl Default for AxisOffset {
    fn default() -> Self {
        AxisOffset::Absolute(0)
    }
}

impl FromStr for AxisOffset {
    type Err = ClockError;

    /// `3` and `-2` are pixels; `0.25`, `1.0` and `5e-1` are fractions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ClockError::InvalidOffset(s.to_string());
        if s.contains(['.', 'e', 'E']) {
            let fraction: f64 = s.parse().map_err(|_| invalid())?;
            if !fraction.is_finite() {
                return Err(invalid());
            }
            Ok(AxisOffset::Relative(fraction))
        } else {
            s.parse().map(AxisOffset::Absolute).map_err(|_| invalid())
        }
    }
}

impl fmt::Display for AxisOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisOffset::Absolute(pixels) => write!(f, "{pixels}"),
            AxisOffset::Relative(fraction) => write!(f, "{fraction:?}"),
        }
    }
}

impl Serialize for AxisOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            AxisOffset::Absolute(pixels) => serializer.serialize_i32(pixels),
            AxisOffset::Relative(fraction) => serializer.serialize_f64(fraction),
        }
    }
}

impl<'de> Deserialize<'de> for AxisOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OffsetVisitor;

        impl Visitor<'_> for OffsetVisitor {
            type Value = AxisOffset;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer pixel offset or a fractional cell offset")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<AxisOffset, E> {
                i32::try_from(v)
                    .map(AxisOffset::Absolute)
                    .map_err(|_| E::custom(format!("pixel offset {v} out of range")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<AxisOffset, E> {
                i32::try_from(v)
                    .map(AxisOffset::Absolute)
                    .map_err(|_| E::custom(format!("pixel offset {v} out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<AxisOffset, E> {
                Ok(AxisOffset::Relative(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AxisOffset, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(OffsetVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColonOffset {
    #[serde(default)]
    pub x: AxisOffset,
    #[serde(default)]
    pub y: AxisOffset,
}

/// The display options that influence layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRequest {
    pub subseconds: u8,
    pub colon_offset: ColonOffset,
}

/// Pixel layout of the time string at one point size.
///
/// Recomputed in full on every resize and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub point_size: u32,
    pub digit_cell_width: u32,
    pub digit_cell_height: u32,
    pub colon_width: u32,
    pub dot_width: u32,
    pub footprint: Footprint,
    pub colon_offset: ColonOffset,
}

impl LayoutMetrics {
    /// Measures the time string at `point_size`.
    pub fn measure<M: GlyphMetrics + ?Sized>(
        metrics: &M,
        point_size: u32,
        request: &LayoutRequest,
    ) -> Self {
        let widest_digit = ('0'..='9')
            .map(|c| metrics.glyph_width(c, point_size))
            .max()
            .unwrap_or(0);
        let widest_pair = (0..100)
            .map(|n| metrics.text_width(&format!("{n:02}"), point_size))
            .max()
            .unwrap_or(0);
        let digit_cell_width = widest_digit.max(widest_pair.div_ceil(2));

        let colon_width = metrics.glyph_width(':', point_size);
        let dot_width = metrics.glyph_width('.', point_size);
        let digit_cell_height = metrics.line_height(point_size);

        let subseconds = request.subseconds.min(MAX_SUBSECONDS) as u32;
        let digit_slots = CLOCK_DIGITS + subseconds;
        let width = digit_slots * digit_cell_width
            + COLONS * colon_width
            + if subseconds > 0 { dot_width } else { 0 };

        Self {
            point_size,
            digit_cell_width,
            digit_cell_height,
            colon_width,
            dot_width,
            footprint: Footprint::new(width, digit_cell_height),
            colon_offset: request.colon_offset,
        }
    }

    /// Horizontal advance of one character of a formatted time.
    pub fn advance_of(&self, c: char) -> u32 {
        match c {
            ':' => self.colon_width,
            '.' => self.dot_width,
            _ => self.digit_cell_width,
        }
    }

    /// Colon nudge in pixels, relative to the colon's own cell.
    pub fn colon_offset_pixels(&self) -> (i32, i32) {
        (
            self.colon_offset.x.resolve(self.colon_width),
            self.colon_offset.y.resolve(self.digit_cell_height),
        )
    }
}

pub struct LayoutFitter;

impl LayoutFitter {
    /// Finds the largest point size whose footprint fits `ceiling` on both axes.
    #[instrument(level = "debug", skip(metrics))]
    pub fn fit<M: GlyphMetrics + ?Sized>(
        metrics: &M,
        ceiling: Footprint,
        request: &LayoutRequest,
    ) -> Result<LayoutMetrics, LayoutError> {
        let mut size = 1u32;
        let mut under = 0u32;
        let mut over: Option<u32> = None;
        let mut best = None;

        loop {
            let candidate = LayoutMetrics::measure(metrics, size, request);
            if candidate.footprint.fits_within(&ceiling) {
                under = size;
                best = Some(candidate);
                match over {
                    Some(over) if over - under < 2 => break,
                    Some(over) => size = (under + over) / 2,
                    None if size >= MAX_POINT_SIZE => break,
                    None => size = (size * 2).min(MAX_POINT_SIZE),
                }
            } else {
                over = Some(size);
                if size - under < 2 {
                    break;
                }
                size = (under + size) / 2;
            }
        }

        match best {
            Some(layout) => {
                debug!(
                    point_size = layout.point_size,
                    width = layout.footprint.width,
                    height = layout.footprint.height,
                    "Layout fitted"
                );
                Ok(layout)
            }
            None => Err(LayoutError::NoFit(ceiling)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Monospace stub: every glyph is `advance * size / 10` wide.
    struct LinearFont {
        digit: u32,
        colon: u32,
        dot: u32,
        line: u32,
    }

    impl GlyphMetrics for LinearFont {
        fn glyph_width(&self, c: char, size: u32) -> u32 {
            let units = match c {
                ':' => self.colon,
                '.' => self.dot,
                _ => self.digit,
            };
            units * size / 10
        }

        fn line_height(&self, size: u32) -> u32 {
            self.line * size / 10
        }
    }

    /// Digits are 6 wide but "00".."99" pairs are kerned apart to 14.
    struct WidePairs;

    impl GlyphMetrics for WidePairs {
        fn glyph_width(&self, c: char, size: u32) -> u32 {
            match c {
                ':' | '.' => 2 * size,
                _ => 6 * size,
            }
        }

        fn text_width(&self, text: &str, size: u32) -> u32 {
            if text.len() == 2 {
                14 * size
            } else {
                text.chars().map(|c| self.glyph_width(c, size)).sum()
            }
        }

        fn line_height(&self, size: u32) -> u32 {
            10 * size
        }
    }

    fn font() -> LinearFont {
        LinearFont {
            digit: 6,
            colon: 3,
            dot: 2,
            line: 12,
        }
    }

    fn fits(m: &dyn GlyphMetrics, size: u32, ceiling: Footprint, request: &LayoutRequest) -> bool {
        LayoutMetrics::measure(m, size, request)
            .footprint
            .fits_within(&ceiling)
    }

    #[test]
    fn footprint_counts_cells_and_separators() {
        let request = LayoutRequest {
            subseconds: 2,
            ..Default::default()
        };
        let layout = LayoutMetrics::measure(&font(), 10, &request);
        assert_eq!(layout.digit_cell_width, 6);
        assert_eq!(layout.colon_width, 3);
        assert_eq!(layout.dot_width, 2);
        assert_eq!(layout.footprint, Footprint::new(8 * 6 + 2 * 3 + 2, 12));

        let no_fraction = LayoutMetrics::measure(&font(), 10, &LayoutRequest::default());
        assert_eq!(no_fraction.footprint.width, 6 * 6 + 2 * 3);
    }

    #[test]
    fn kerned_pairs_widen_the_digit_cell() {
        let layout = LayoutMetrics::measure(&WidePairs, 1, &LayoutRequest::default());
        assert_eq!(layout.digit_cell_width, 7);
    }

    #[test]
    fn finds_the_largest_fitting_size() {
        let request = LayoutRequest::default();
        let ceiling = Footprint::new(1000, 400);
        let layout = LayoutFitter::fit(&font(), ceiling, &request).unwrap();
        assert!(layout.footprint.fits_within(&ceiling));
        assert!(!fits(&font(), layout.point_size + 1, ceiling, &request));
    }

    #[test]
    fn height_can_be_the_binding_axis() {
        let request = LayoutRequest::default();
        let ceiling = Footprint::new(100_000, 120);
        let layout = LayoutFitter::fit(&font(), ceiling, &request).unwrap();
        assert_eq!(layout.point_size, 100);
        assert_eq!(layout.footprint.height, 120);
    }

    #[test]
    fn tiny_area_has_no_layout() {
        let err = LayoutFitter::fit(&WidePairs, Footprint::new(3, 3), &LayoutRequest::default())
            .unwrap_err();
        assert_eq!(err, LayoutError::NoFit(Footprint::new(3, 3)));
        assert_eq!(err.to_string(), "no point size fits a 3x3 area");
    }

    #[test]
    fn flat_metrics_stop_at_size_ceiling() {
        struct Flat;
        impl GlyphMetrics for Flat {
            fn glyph_width(&self, _: char, _: u32) -> u32 {
                1
            }
            fn line_height(&self, _: u32) -> u32 {
                1
            }
        }
        let layout =
            LayoutFitter::fit(&Flat, Footprint::new(100, 100), &LayoutRequest::default()).unwrap();
        assert_eq!(layout.point_size, MAX_POINT_SIZE);
    }

    #[test]
    fn resize_to_same_area_is_idempotent() {
        let request = LayoutRequest {
            subseconds: 3,
            colon_offset: ColonOffset {
                x: AxisOffset::Relative(0.5),
                y: AxisOffset::Absolute(-1),
            },
        };
        let ceiling = Footprint::new(640, 200);
        let first = LayoutFitter::fit(&font(), ceiling, &request).unwrap();
        let second = LayoutFitter::fit(&font(), ceiling, &request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn colon_offset_resolves_per_axis() {
        let request = LayoutRequest {
            subseconds: 0,
            colon_offset: ColonOffset {
                x: AxisOffset::Relative(0.5),
                y: AxisOffset::Absolute(-3),
            },
        };
        let layout = LayoutMetrics::measure(&font(), 20, &request);
        assert_eq!(layout.colon_width, 6);
        assert_eq!(layout.colon_offset_pixels(), (3, -3));

        let fractional_y = LayoutMetrics::measure(
            &font(),
            20,
            &LayoutRequest {
                subseconds: 0,
                colon_offset: ColonOffset {
                    x: AxisOffset::Absolute(2),
                    y: AxisOffset::Relative(-0.25),
                },
            },
        );
        assert_eq!(fractional_y.colon_offset_pixels(), (2, -6));
    }

    #[test]
    fn axis_offset_parsing_decides_the_kind() {
        assert_eq!("3".parse::<AxisOffset>().unwrap(), AxisOffset::Absolute(3));
        assert_eq!("-2".parse::<AxisOffset>().unwrap(), AxisOffset::Absolute(-2));
        assert_eq!("0.25".parse::<AxisOffset>().unwrap(), AxisOffset::Relative(0.25));
        assert_eq!("1.0".parse::<AxisOffset>().unwrap(), AxisOffset::Relative(1.0));
        assert_eq!("5e-1".parse::<AxisOffset>().unwrap(), AxisOffset::Relative(0.5));
        assert!("left".parse::<AxisOffset>().is_err());
        assert!("inf".parse::<AxisOffset>().is_err());
    }

    #[test]
    fn advance_matches_character_class() {
        let layout = LayoutMetrics::measure(&font(), 10, &LayoutRequest::default());
        assert_eq!(layout.advance_of('7'), 6);
        assert_eq!(layout.advance_of(' '), 6);
        assert_eq!(layout.advance_of(':'), 3);
        assert_eq!(layout.advance_of('.'), 2);
    }

    proptest! {
        #[test]
        fn fit_is_maximal(
            width in 0u32..5000,
            height in 0u32..2000,
            digit in 1u32..20,
            colon in 1u32..10,
            dot in 1u32..10,
            line in 1u32..30,
            subseconds in 0u8..=6,
        ) {
            let font = LinearFont { digit, colon, dot, line };
            let request = LayoutRequest { subseconds, ..Default::default() };
            let ceiling = Footprint::new(width, height);
            match LayoutFitter::fit(&font, ceiling, &request) {
                Ok(layout) => {
                    prop_assert!(layout.footprint.fits_within(&ceiling));
                    prop_assert!(!fits(&font, layout.point_size + 1, ceiling, &request));
                    prop_assert!(!fits(&font, layout.point_size + 2, ceiling, &request));
                }
                Err(LayoutError::NoFit(_)) => {
                    prop_assert!(!fits(&font, 1, ceiling, &request));
                }
            }
        }
    }
}
