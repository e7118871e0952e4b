use std::collections::HashMap;

use kurbo::{Affine, Point, Rect};

use crate::animation::ease::Ease;
use crate::animation::engine::{AnimationKind, AnimationParams, AnimationState, JitterSource, compute};
use crate::effects::stack::EffectStack;
use crate::foundation::core::{Resolution, Vec2};
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::input::audio::AudioFeatureSnapshot;
use crate::input::glyph::GlyphRasterizer;
use crate::input::lyrics::LyricLine;
use crate::render::blend::composite_layer;
use crate::render::frame::{Frame, Layer, PixelFormat};
use crate::text::layout::{CANVAS_PADDING, LineLayout, TextStyle, layout_line};

/// How words enter, leave and react to beats.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub entrance: AnimationKind,
    pub entrance_ease: Ease,
    /// Fraction of a word's progress spent on the entrance.
    pub entrance_span: f64,
    pub exit: Option<AnimationKind>,
    pub exit_ease: Ease,
    /// Fraction of the line's duration spent on the exit, at its end.
    pub exit_span: f64,
    /// Per-word progress stagger.
    pub word_delay: f64,
    pub amplitude: f64,
    /// Vertical travel of slide animations, in pixels.
    pub slide_distance: f64,
    /// Extra scale per unit energy on beats.
    pub beat_pulse: f64,
    /// Seed of the session's jitter source.
    pub jitter_seed: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            entrance: AnimationKind::SlideIn,
            entrance_ease: Ease::OutCubic,
            entrance_span: 0.25,
            exit: Some(AnimationKind::FadeOut),
            exit_ease: Ease::InQuad,
            exit_span: 0.1,
            word_delay: 0.1,
            amplitude: 1.0,
            slide_distance: 40.0,
            beat_pulse: 0.06,
            jitter_seed: 0x5eed,
        }
    }
}

/// Rasterized words and layouts, keyed by (line index, word index).
///
/// Words are rasterized once per line, not once per frame.
#[derive(Debug, Default)]
pub struct WordBitmapCache {
    words: HashMap<(usize, usize), Frame>,
    layouts: HashMap<usize, LineLayout>,
}

impl WordBitmapCache {
    pub fn word(&self, line: usize, word: usize) -> Option<&Frame> {
        self.words.get(&(line, word))
    }

    #[cfg(test)]
    pub fn layout(&self, line: usize) -> Option<&LineLayout> {
        self.layouts.get(&line)
    }

    pub fn cached_lines(&self) -> usize {
        self.layouts.len()
    }

    /// Drop lines before `line`; playback only moves forward.
    pub fn evict_before(&mut self, line: usize) {
        self.words.retain(|&(l, _), _| l >= line);
        self.layouts.retain(|&l, _| l >= line);
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.layouts.clear();
    }
}

/// A word after animation: its bitmap mapped through `transform`, cropped to `reveal_cols`.
struct PlacedWord {
    line: usize,
    word: usize,
    transform: Affine,
    reveal_cols: u32,
    opacity: f32,
    bbox: Rect,
}

/// Builds the per-frame text layer of the active lyric line.
pub struct TextRenderer {
    rasterizer: Box<dyn GlyphRasterizer>,
    style: TextStyle,
    animation: AnimationConfig,
    effects: EffectStack,
    resolution: Resolution,
    cache: WordBitmapCache,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("style", &self.style)
            .field("animation", &self.animation)
            .field("effects", &self.effects)
            .field("resolution", &self.resolution)
            .field("cached_lines", &self.cache.cached_lines())
            .finish_non_exhaustive()
    }
}

impl TextRenderer {
    pub fn new(
        rasterizer: Box<dyn GlyphRasterizer>,
        style: TextStyle,
        animation: AnimationConfig,
        effects: EffectStack,
        resolution: Resolution,
    ) -> Self {
        Self {
            rasterizer,
            style,
            animation,
            effects,
            resolution,
            cache: WordBitmapCache::default(),
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &WordBitmapCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Transparent border kept around the text so effects never clip.
    pub fn canvas_padding(&self) -> u32 {
        CANVAS_PADDING.max(self.effects.reach_px())
    }

    /// Rasterize and lay out `line` unless it is already cached.
    pub fn prepare_line(&mut self, line_idx: usize, line: &LyricLine) -> CadenceResult<&LineLayout> {
        if !self.cache.layouts.contains_key(&line_idx) {
            self.cache.evict_before(line_idx);
            let mut sizes = Vec::with_capacity(line.words.len());
            for (wi, word) in line.words.iter().enumerate() {
                let bitmap = self.rasterizer.rasterize(
                    &word.text,
                    &self.style.font,
                    self.style.font_size,
                    self.style.color,
                    self.style.stroke,
                )?;
                let bitmap = match bitmap.format {
                    PixelFormat::Rgba8 => bitmap,
                    _ => bitmap.into_rgba(),
                };
                sizes.push((bitmap.width, bitmap.height));
                self.cache.words.insert((line_idx, wi), bitmap);
            }
            let layout = layout_line(&sizes, &self.style, self.resolution);
            tracing::debug!(
                line = line_idx,
                words = sizes.len(),
                x = layout.x,
                y = layout.y,
                width = layout.total_width,
                "laid out lyric line"
            );
            self.cache.layouts.insert(line_idx, layout);
        }
        self.cache
            .layouts
            .get(&line_idx)
            .ok_or_else(|| CadenceError::evaluation("line layout missing from cache"))
    }

    /// Animated, effect-processed text layer for `line` at time `t`, positioned in frame
    /// coordinates. `None` when nothing is visible.
    pub fn build_layer(
        &mut self,
        line_idx: usize,
        line: &LyricLine,
        t: f64,
        features: &AudioFeatureSnapshot,
        jitter: &mut dyn JitterSource,
    ) -> CadenceResult<Option<Layer>> {
        let layout = self.prepare_line(line_idx, line)?.clone();
        let anim = &self.animation;
        let line_progress = line.progress_at(t);
        let pulse = if features.on_beat {
            1.0 + anim.beat_pulse * f64::from(features.energy())
        } else {
            1.0
        };

        let mut placed = Vec::with_capacity(layout.words.len());
        for (wi, slot) in layout.words.iter().enumerate() {
            let rest = Vec2::new(f64::from(slot.x), f64::from(slot.y));
            let travel = Vec2::new(0.0, anim.slide_distance);
            let word_progress = line.word_progress(wi, t, anim.word_delay);
            let entrance_progress = if anim.entrance_span > 0.0 {
                (word_progress / anim.entrance_span).min(1.0)
            } else {
                1.0
            };

            let mut state = compute(
                &AnimationParams {
                    kind: anim.entrance,
                    progress: entrance_progress,
                    ease: anim.entrance_ease,
                    start: rest + travel,
                    target: rest,
                    amplitude: anim.amplitude,
                },
                jitter,
            );

            if let Some(exit) = anim.exit
                && anim.exit_span > 0.0
            {
                let exit_progress =
                    ((line_progress - (1.0 - anim.exit_span)) / anim.exit_span).clamp(0.0, 1.0);
                if exit_progress > 0.0 {
                    let out = compute(
                        &AnimationParams {
                            kind: exit,
                            progress: exit_progress,
                            ease: anim.exit_ease,
                            start: rest,
                            target: rest - travel,
                            amplitude: anim.amplitude,
                        },
                        jitter,
                    );
                    state = AnimationState::lerp(&state, &out, exit_progress);
                }
            }
            state.scale *= pulse;

            if let Some(word) = place_word(line_idx, wi, slot.width, slot.height, &state) {
                placed.push(word);
            }
        }
        if placed.is_empty() {
            return Ok(None);
        }

        // Keep every animated word inside the safe band and the side margins. Lines too wide for
        // the margins are only held at the left one.
        let margin_left = i64::from(self.style.margin_left);
        let right_edge = i64::from(self.resolution.width) - i64::from(self.style.margin_right);
        let fits = i64::from(layout.total_width) <= right_edge - margin_left;
        for w in &mut placed {
            let top = w.bbox.y0.floor() as i32;
            let height = (w.bbox.y1.ceil() - w.bbox.y0.floor()) as u32;
            let dy = f64::from(layout.band.clamp_y(top, self.resolution.height, height) - top);

            let left = w.bbox.x0.floor() as i64;
            let width = w.bbox.x1.ceil() as i64 - left;
            let max_left = if fits { (right_edge - width).max(margin_left) } else { i64::MAX };
            let dx = (left.clamp(margin_left, max_left) - left) as f64;

            if dx != 0.0 || dy != 0.0 {
                w.transform = Affine::translate((dx, dy)) * w.transform;
                w.bbox = w.bbox + Vec2::new(dx, dy);
            }
        }
        let union = placed
            .iter()
            .map(|w| w.bbox)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);

        let pad = i64::from(self.canvas_padding());
        let origin_x = union.x0.floor() as i64 - pad;
        let origin_y = union.y0.floor() as i64 - pad;
        let canvas_w = (union.x1.ceil() as i64 - union.x0.floor() as i64 + 2 * pad).max(1) as u32;
        let canvas_h = (union.y1.ceil() as i64 - union.y0.floor() as i64 + 2 * pad).max(1) as u32;
        let mut canvas = Frame::new(canvas_w, canvas_h, PixelFormat::Rgba8);

        for word in &placed {
            let Some(bitmap) = self.cache.word(word.line, word.word) else {
                continue;
            };
            let Some((image, x, y)) = warp_word(bitmap, word) else {
                continue;
            };
            let mut layer = Layer::new(image, ((x - origin_x) as i32, (y - origin_y) as i32));
            layer.opacity = word.opacity;
            composite_layer(&mut canvas, &layer);
        }

        let canvas = self.effects.apply(canvas, features, t)?;
        Ok(Some(Layer::new(canvas, (origin_x as i32, origin_y as i32))))
    }
}

fn place_word(line: usize, word: usize, width: u32, height: u32, state: &AnimationState) -> Option<PlacedWord> {
    let visible = state.opacity > 0.0
        && state.reveal > 0.0
        && state.scale.x.abs() > 1e-6
        && state.scale.y.abs() > 1e-6
        && state.position.is_finite()
        && width > 0
        && height > 0;
    if !visible {
        return None;
    }
    let (w, h) = (f64::from(width), f64::from(height));
    let center = state.position + Vec2::new(w / 2.0, h / 2.0);
    let transform = Affine::translate(center)
        * Affine::rotate(state.rotation_deg.to_radians())
        * Affine::scale_non_uniform(state.scale.x, state.scale.y)
        * Affine::translate((-w / 2.0, -h / 2.0));
    let reveal_cols = (w * state.reveal).ceil().clamp(1.0, w) as u32;
    let bbox = transform.transform_rect_bbox(Rect::new(0.0, 0.0, f64::from(reveal_cols), h));
    Some(PlacedWord {
        line,
        word,
        transform,
        reveal_cols,
        opacity: state.opacity as f32,
        bbox,
    })
}

/// Resample `bitmap` through the word's transform. Returns the warped image and its top-left in
/// frame coordinates.
fn warp_word(bitmap: &Frame, word: &PlacedWord) -> Option<(Frame, i64, i64)> {
    let x0 = word.bbox.x0.floor() as i64;
    let y0 = word.bbox.y0.floor() as i64;
    let w = (word.bbox.x1.ceil() as i64 - x0).max(0) as u32;
    let h = (word.bbox.y1.ceil() as i64 - y0).max(0) as u32;
    if w == 0 || h == 0 || word.transform.determinant().abs() < 1e-12 {
        return None;
    }

    let inverse = word.transform.inverse();
    let mut out = Frame::new(w, h, PixelFormat::Rgba8);
    for y in 0..h {
        for x in 0..w {
            let p = inverse * Point::new((x0 + i64::from(x)) as f64 + 0.5, (y0 + i64::from(y)) as f64 + 0.5);
            let (sx, sy) = (p.x.floor(), p.y.floor());
            if sx < 0.0 || sy < 0.0 || sx >= f64::from(word.reveal_cols) || sy >= f64::from(bitmap.height) {
                continue;
            }
            let s = bitmap.offset(sx as u32, sy as u32);
            let d = out.offset(x, y);
            out.data[d..d + 4].copy_from_slice(&bitmap.data[s..s + 4]);
        }
    }
    Some((out, x0, y0))
}

#[cfg(test)]
#[path = "../../tests/unit/text/renderer.rs"]
mod tests;
