use crate::foundation::core::Resolution;
use crate::input::glyph::{FontSpec, Stroke};

/// Nominal distance between the frame's top edge and the highest text row.
pub const SAFE_TOP_MARGIN: u32 = 100;
/// Nominal distance between the frame's bottom edge and the lowest text row.
pub const SAFE_BOTTOM_MARGIN: u32 = 150;
/// The bottom margin is never shrunk below this, even for oversized text.
pub const MIN_BOTTOM_MARGIN: u32 = 40;
/// Default left/right safe margin.
pub const DEFAULT_SIDE_MARGIN: u32 = 120;
/// Minimum transparent border around the text canvas; effects never reach further than this.
pub const CANVAS_PADDING: u32 = 64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalPosition {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Visual style and safe-zone configuration of lyric text.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font: FontSpec,
    pub font_size: f32,
    /// Straight-alpha RGBA fill.
    pub color: [u8; 4],
    pub stroke: Option<Stroke>,
    pub align: HorizontalAlign,
    pub vertical: VerticalPosition,
    pub margin_left: u32,
    pub margin_right: u32,
    /// Fixed gap between adjacent words.
    pub word_spacing: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            font_size: 72.0,
            color: [255, 255, 255, 255],
            stroke: Some(Stroke {
                width: 3,
                color: [0, 0, 0, 255],
            }),
            align: HorizontalAlign::Center,
            vertical: VerticalPosition::Bottom,
            margin_left: DEFAULT_SIDE_MARGIN,
            margin_right: DEFAULT_SIDE_MARGIN,
            word_spacing: 24,
        }
    }
}

/// Top-left placement of one word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Vertical band text must stay inside: rows `[top, frame_height - bottom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SafeBand {
    pub top: u32,
    pub bottom: u32,
}

impl SafeBand {
    /// Smallest and largest legal `y` for a block of `height` rows.
    pub fn y_range(self, frame_height: u32, height: u32) -> (i32, i32) {
        let lo = self.top as i32;
        let hi = frame_height as i32 - self.bottom as i32 - height as i32;
        (lo, hi.max(lo))
    }

    /// Clamp a block's `y` into the band.
    pub fn clamp_y(self, y: i32, frame_height: u32, height: u32) -> i32 {
        let (lo, hi) = self.y_range(frame_height, height);
        y.clamp(lo, hi)
    }
}

/// Placement of a full lyric line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayout {
    /// Sum of word widths plus inter-word spacing.
    pub total_width: u32,
    /// Tallest word.
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub words: Vec<WordPlacement>,
    /// Effective band after any margin degradation.
    pub band: SafeBand,
}

/// Total line width including the fixed inter-word spacing.
pub fn line_width(sizes: &[(u32, u32)], word_spacing: u32) -> u32 {
    let words: u32 = sizes.iter().map(|&(w, _)| w).sum();
    words + word_spacing * sizes.len().saturating_sub(1) as u32
}

/// Left edge of a line of `total_width` pixels.
///
/// Lines wider than the space between the side margins start flush against the left margin
/// instead of being centered into negative coordinates.
pub fn horizontal_origin(total_width: u32, res: Resolution, style: &TextStyle) -> i32 {
    let left = style.margin_left as i64;
    let available = res.width as i64 - left - style.margin_right as i64;
    let total = total_width as i64;
    if total > available {
        return left as i32;
    }
    let x = match style.align {
        HorizontalAlign::Left => left,
        HorizontalAlign::Center => left + (available - total) / 2,
        HorizontalAlign::Right => res.width as i64 - style.margin_right as i64 - total,
    };
    x as i32
}

/// Effective safe band for a block of `height` rows.
///
/// When the block does not fit the nominal band, the top margin shrinks first, then the bottom
/// margin, which never drops below [`MIN_BOTTOM_MARGIN`].
pub fn safe_band(height: u32, res: Resolution) -> SafeBand {
    let mut top = SAFE_TOP_MARGIN.min(res.height);
    let mut bottom = SAFE_BOTTOM_MARGIN.min(res.height.saturating_sub(top));
    let available = res.height.saturating_sub(top + bottom);
    if height <= available {
        return SafeBand { top, bottom };
    }

    let mut need = height - available;
    let from_top = need.min(top);
    top -= from_top;
    need -= from_top;

    let shrinkable = bottom.saturating_sub(MIN_BOTTOM_MARGIN);
    let from_bottom = need.min(shrinkable);
    bottom -= from_bottom;
    need -= from_bottom;

    if need > 0 {
        // Taller than the frame minus the bottom floor; anchor at the top edge.
        top = 0;
    }
    SafeBand { top, bottom }
}

/// Top edge of a block of `height` rows for the requested vertical position, clamped into the
/// effective safe band.
pub fn vertical_origin(height: u32, res: Resolution, vertical: VerticalPosition) -> (i32, SafeBand) {
    let band = safe_band(height, res);
    let (lo, hi) = band.y_range(res.height, height);
    let preferred = match vertical {
        VerticalPosition::Top => lo,
        VerticalPosition::Center => (res.height as i32 - height as i32) / 2,
        VerticalPosition::Bottom => hi,
    };
    (band.clamp_y(preferred, res.height, height), band)
}

/// Place the words of one line, given each word's bitmap size.
pub fn layout_line(sizes: &[(u32, u32)], style: &TextStyle, res: Resolution) -> LineLayout {
    let total_width = line_width(sizes, style.word_spacing);
    let height = sizes.iter().map(|&(_, h)| h).max().unwrap_or(0);
    let x = horizontal_origin(total_width, res, style);
    let (y, band) = vertical_origin(height, res, style.vertical);

    let mut words = Vec::with_capacity(sizes.len());
    let mut cursor = x;
    for &(w, h) in sizes {
        words.push(WordPlacement {
            x: cursor,
            y: y + (height - h) as i32 / 2,
            width: w,
            height: h,
        });
        cursor += (w + style.word_spacing) as i32;
    }

    LineLayout {
        total_width,
        height,
        x,
        y,
        words,
        band,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
