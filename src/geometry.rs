//! Parsing and evaluation of `convert ... -trim info:` output.
//!
//! The `info:` pseudo-format prints a one-line description of the crop the
//! tool would perform, e.g.:
//!
//! ```text
//! rose.png PNG 150x100 200x200+25+50 8-bit sRGB 0.010u 0:00.009
//! ```
//!
//! Two tokens carry the geometry: `150x100` is the size the image would have
//! after trimming, and `200x200+25+50` is the original canvas with the crop
//! offset. The tokens are found by shape, not by position — exactly one `x`
//! and two `+` for the canvas, exactly one `x` and no `+` for the trimmed
//! size — so the parser survives the surrounding tokens changing.
//!
//! Parsing is pure text-in/struct-out and never touches a process, so the
//! whole format contract is unit-tested here.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The expected geometry token never appeared in the output.
    #[error("no {kind} geometry found in trim output")]
    Missing { kind: &'static str },
    /// A geometry field failed to parse as a non-negative integer.
    #[error("geometry value {value:?} is not a non-negative integer")]
    BadNumber { value: String },
    /// The original bounds are empty, so the trim ratio is undefined.
    #[error("original bounds are empty, trim ratio is undefined")]
    DegenerateBounds,
    /// Trimming would discard more of the image than the caller allows.
    #[error("trim keeps only {ratio}% of the image, below the {threshold}% threshold")]
    TooMuchTrimmed { ratio: u64, threshold: u32 },
    /// The computed crop equals the full image.
    #[error("trim bounds equal the full image, nothing to trim")]
    NothingToTrim,
}

/// The crop a trim operation would perform: origin plus size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrimRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TrimRect {
    /// X coordinate of the right edge (`x + width`).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge (`y + height`).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

impl fmt::Display for TrimRect {
    /// ImageMagick geometry syntax: `WxH+X+Y`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Raw geometry as reported by the tool, before any policy is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TrimGeometry {
    pub original_width: u32,
    pub original_height: u32,
    pub trimmed_width: u32,
    pub trimmed_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Scan the tool's output for the two geometry tokens and parse them.
///
/// When a token shape matches more than once the last match wins; parsing
/// happens only after the scan, so a stray `x`-bearing token (a filename,
/// say) only fails the call if nothing better follows it.
pub(crate) fn parse_trim_geometry(text: &str) -> Result<TrimGeometry, GeometryError> {
    let mut canvas: Option<(&str, &str, &str, &str)> = None;
    let mut size: Option<(&str, &str)> = None;

    for token in text.split_whitespace() {
        let plus_count = token.matches('+').count();
        let x_count = token.matches('x').count();
        if plus_count == 2 && x_count == 1 {
            let mut parts = token.split('+');
            let (Some(dimensions), Some(x), Some(y)) = (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            if let Some((width, height)) = dimensions.split_once('x') {
                canvas = Some((width, height, x, y));
            }
        } else if plus_count == 0 && x_count == 1 {
            size = token.split_once('x');
        }
    }

    let (original_width, original_height, offset_x, offset_y) =
        canvas.ok_or(GeometryError::Missing { kind: "canvas" })?;
    let (trimmed_width, trimmed_height) = size.ok_or(GeometryError::Missing { kind: "size" })?;

    Ok(TrimGeometry {
        original_width: parse_dimension(original_width)?,
        original_height: parse_dimension(original_height)?,
        trimmed_width: parse_dimension(trimmed_width)?,
        trimmed_height: parse_dimension(trimmed_height)?,
        offset_x: parse_dimension(offset_x)?,
        offset_y: parse_dimension(offset_y)?,
    })
}

/// Apply the caller's trim policy to a parsed geometry.
///
/// Fails when the kept area falls below `threshold` percent of the original,
/// or when the crop equals the full image. The threshold check runs first;
/// a full frame has a ratio of exactly 100, passes any threshold, and so
/// reports "nothing to trim" rather than "too much trimmed".
pub(crate) fn evaluate(geometry: TrimGeometry, threshold: u32) -> Result<TrimRect, GeometryError> {
    let original_area =
        u64::from(geometry.original_width) * u64::from(geometry.original_height);
    if original_area == 0 {
        return Err(GeometryError::DegenerateBounds);
    }
    let trimmed_area = u64::from(geometry.trimmed_width) * u64::from(geometry.trimmed_height);
    let ratio = trimmed_area.saturating_mul(100) / original_area;
    if ratio < u64::from(threshold) {
        return Err(GeometryError::TooMuchTrimmed { ratio, threshold });
    }

    if geometry.offset_x == 0
        && geometry.offset_y == 0
        && geometry.trimmed_width == geometry.original_width
        && geometry.trimmed_height == geometry.original_height
    {
        return Err(GeometryError::NothingToTrim);
    }

    Ok(TrimRect {
        x: geometry.offset_x,
        y: geometry.offset_y,
        width: geometry.trimmed_width,
        height: geometry.trimmed_height,
    })
}

fn parse_dimension(value: &str) -> Result<u32, GeometryError> {
    value.parse().map_err(|_| GeometryError::BadNumber {
        value: value.to_string(),
    })
}
