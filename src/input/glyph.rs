use crate::foundation::error::{CadenceError, CadenceResult};
use crate::render::frame::{Frame, PixelFormat};

/// Font selection passed through to the rasterizer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
        }
    }
}

/// Outline drawn around glyphs.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stroke {
    pub width: u32,
    pub color: [u8; 4],
}

/// Text rasterization capability.
///
/// `rasterize` returns a straight-alpha RGBA bitmap on a transparent background whose height
/// covers full ascent and descent, so descenders are never clipped. `measure` must agree with the
/// bitmap size `rasterize` produces.
pub trait GlyphRasterizer {
    fn measure(&self, text: &str, font: &FontSpec, size: f32) -> (u32, u32);

    fn rasterize(
        &self,
        text: &str,
        font: &FontSpec,
        size: f32,
        color: [u8; 4],
        stroke: Option<Stroke>,
    ) -> CadenceResult<Frame>;
}

/// Draws every glyph as a solid cell. For previews and tests; ignores the font family.
///
/// Cells reach from cap height to the baseline, and down into the descent for `g j p q y`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockGlyphRasterizer;

impl BlockGlyphRasterizer {
    fn metrics(size: f32) -> (u32, u32, u32) {
        let advance = (size * 0.6).round().max(1.0) as u32;
        let ascent = (size * 0.8).round().max(1.0) as u32;
        let descent = (size * 0.25).round().max(1.0) as u32;
        (advance, ascent, descent)
    }
}

impl GlyphRasterizer for BlockGlyphRasterizer {
    fn measure(&self, text: &str, _font: &FontSpec, size: f32) -> (u32, u32) {
        let (advance, ascent, descent) = Self::metrics(size);
        let n = text.chars().count() as u32;
        (n.max(1) * advance, ascent + descent)
    }

    fn rasterize(
        &self,
        text: &str,
        font: &FontSpec,
        size: f32,
        color: [u8; 4],
        stroke: Option<Stroke>,
    ) -> CadenceResult<Frame> {
        if !size.is_finite() || size <= 0.0 {
            return Err(CadenceError::validation("font size must be > 0"));
        }
        let (advance, ascent, descent) = Self::metrics(size);
        let (w, h) = self.measure(text, font, size);
        let mut out = Frame::new(w, h, PixelFormat::Rgba8);
        let gap = (advance / 8).max(1);
        let cap_top = ascent / 4;

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x0 = i as u32 * advance + gap;
            let x1 = (i as u32 + 1) * advance - gap;
            let y1 = if matches!(ch, 'g' | 'j' | 'p' | 'q' | 'y') {
                ascent + descent
            } else {
                ascent
            };
            if let Some(s) = stroke
                && s.width > 0
            {
                fill_rect(
                    &mut out,
                    x0.saturating_sub(s.width),
                    cap_top.saturating_sub(s.width),
                    x1 + s.width,
                    y1 + s.width,
                    s.color,
                );
            }
            fill_rect(&mut out, x0, cap_top, x1, y1, color);
        }
        Ok(out)
    }
}

fn fill_rect(frame: &mut Frame, x0: u32, y0: u32, x1: u32, y1: u32, rgba: [u8; 4]) {
    let x1 = x1.min(frame.width);
    let y1 = y1.min(frame.height);
    for y in y0..y1 {
        for x in x0..x1 {
            let o = frame.offset(x, y);
            frame.data[o..o + 4].copy_from_slice(&rgba);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/glyph.rs"]
mod tests;
