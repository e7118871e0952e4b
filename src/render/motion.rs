use std::collections::VecDeque;

use rayon::prelude::*;

use crate::foundation::math::{hsv_to_rgb, rgb_to_hsv, to_u8};
use crate::render::frame::{Frame, PixelFormat};

/// Maximum number of samples kept in a [`MotionHistory`].
pub const MOTION_HISTORY_LEN: usize = 10;
/// Motion (in output pixels per frame) that maps to a normalized magnitude of 1.
pub const MOTION_FULL_SCALE_PX: f32 = 24.0;

/// One inter-frame motion measurement, in output-resolution pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionSample {
    pub magnitude: f32,
    pub dx: f32,
    pub dy: f32,
}

impl MotionSample {
    /// Magnitude mapped into `[0, 1]`.
    pub fn normalized(&self) -> f32 {
        if self.magnitude.is_finite() {
            (self.magnitude / MOTION_FULL_SCALE_PX).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Bounded ring of recent motion samples.
#[derive(Clone, Debug, Default)]
pub struct MotionHistory {
    samples: VecDeque<MotionSample>,
}

impl MotionHistory {
    pub fn push(&mut self, sample: MotionSample) {
        if self.samples.len() == MOTION_HISTORY_LEN {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<MotionSample> {
        self.samples.back().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Mean of the retained samples; zero when empty.
    pub fn smoothed(&self) -> MotionSample {
        if self.samples.is_empty() {
            return MotionSample::default();
        }
        let n = self.samples.len() as f32;
        let (m, dx, dy) = self
            .samples
            .iter()
            .fold((0.0, 0.0, 0.0), |(m, dx, dy), s| {
                (m + s.magnitude, dx + s.dx, dy + s.dy)
            });
        MotionSample {
            magnitude: m / n,
            dx: dx / n,
            dy: dy / n,
        }
    }
}

/// Tuning for [`MotionEstimator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionEstimatorConfig {
    /// Width of the grayscale working image.
    pub work_width: u32,
    /// Upper bound on tracked feature points.
    pub max_points: usize,
    /// Block-matching search radius, in working pixels.
    pub search_radius: i32,
    /// Half size of the matched block, in working pixels.
    pub block_half: i32,
    /// Minimum gradient for a point to be tracked.
    pub min_gradient: u32,
}

impl Default for MotionEstimatorConfig {
    fn default() -> Self {
        Self {
            work_width: 160,
            max_points: 64,
            search_radius: 4,
            block_half: 3,
            min_gradient: 24,
        }
    }
}

#[derive(Clone, Debug)]
struct GrayImage {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

impl GrayImage {
    fn at(&self, x: i32, y: i32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }
}

/// Sparse feature tracker between consecutive background frames.
///
/// High-gradient points of the previous frame are matched into the current frame by
/// sum-of-absolute-differences block search on a downscaled grayscale copy.
#[derive(Clone, Debug, Default)]
pub struct MotionEstimator {
    config: MotionEstimatorConfig,
    prev: Option<GrayImage>,
}

impl MotionEstimator {
    pub fn new(config: MotionEstimatorConfig) -> Self {
        Self { config, prev: None }
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }

    /// Motion between the previous call's frame and `frame`; zero on the first call.
    pub fn estimate(&mut self, frame: &Frame) -> MotionSample {
        let Some(cur) = downscale_gray(frame, self.config.work_width) else {
            self.prev = None;
            return MotionSample::default();
        };
        let scale = frame.width as f32 / cur.width as f32;
        let sample = match &self.prev {
            Some(prev) if prev.width == cur.width && prev.height == cur.height => {
                track(&self.config, prev, &cur, scale)
            }
            _ => MotionSample::default(),
        };
        self.prev = Some(cur);
        sample
    }
}

fn downscale_gray(frame: &Frame, work_width: u32) -> Option<GrayImage> {
    if frame.width == 0 || frame.height == 0 || frame.format == PixelFormat::Gray8 {
        return None;
    }
    let w = work_width.clamp(1, frame.width);
    let h = ((u64::from(frame.height) * u64::from(w)) / u64::from(frame.width)).max(1) as u32;
    let ch = frame.channels();
    let mut data = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        let sy = (u64::from(y) * u64::from(frame.height) / u64::from(h)) as u32;
        for x in 0..w {
            let sx = (u64::from(x) * u64::from(frame.width) / u64::from(w)) as u32;
            let o = frame.offset(sx, sy);
            let px = &frame.data[o..o + ch];
            // Rec.601 luma, fixed point.
            let luma = (77 * u32::from(px[0]) + 150 * u32::from(px[1]) + 29 * u32::from(px[2])) >> 8;
            data.push(luma as u8);
        }
    }
    Some(GrayImage {
        width: w as i32,
        height: h as i32,
        data,
    })
}

fn track(cfg: &MotionEstimatorConfig, prev: &GrayImage, cur: &GrayImage, scale: f32) -> MotionSample {
    let margin = cfg.search_radius + cfg.block_half + 1;
    if prev.width <= 2 * margin || prev.height <= 2 * margin {
        return MotionSample::default();
    }

    let step = (cfg.block_half * 2 + 1).max(1) as usize;
    let mut candidates: Vec<(u32, i32, i32)> = Vec::new();
    for y in (margin..prev.height - margin).step_by(step) {
        for x in (margin..prev.width - margin).step_by(step) {
            let gx = i32::from(prev.at(x + 1, y)) - i32::from(prev.at(x - 1, y));
            let gy = i32::from(prev.at(x, y + 1)) - i32::from(prev.at(x, y - 1));
            let g = gx.unsigned_abs() + gy.unsigned_abs();
            if g >= cfg.min_gradient {
                candidates.push((g, x, y));
            }
        }
    }
    if candidates.is_empty() {
        return MotionSample::default();
    }
    // Strongest first; scan order breaks ties so the choice is deterministic.
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates.truncate(cfg.max_points);

    let vectors: Vec<(i32, i32)> = candidates
        .par_iter()
        .map(|&(_, x, y)| best_offset(cfg, prev, cur, x, y))
        .collect();

    let n = vectors.len() as f32;
    let (sx, sy, sm) = vectors.iter().fold((0.0f32, 0.0f32, 0.0f32), |(sx, sy, sm), &(dx, dy)| {
        let (dx, dy) = (dx as f32, dy as f32);
        (sx + dx, sy + dy, sm + (dx * dx + dy * dy).sqrt())
    });
    MotionSample {
        magnitude: sm / n * scale,
        dx: sx / n * scale,
        dy: sy / n * scale,
    }
}

fn best_offset(cfg: &MotionEstimatorConfig, prev: &GrayImage, cur: &GrayImage, x: i32, y: i32) -> (i32, i32) {
    let sad = |ox: i32, oy: i32| -> u32 {
        let mut acc = 0u32;
        for by in -cfg.block_half..=cfg.block_half {
            for bx in -cfg.block_half..=cfg.block_half {
                let a = prev.at(x + bx, y + by);
                let b = cur.at(x + bx + ox, y + by + oy);
                acc += u32::from(a.abs_diff(b));
            }
        }
        acc
    };

    let mut best = (0, 0);
    let mut best_sad = sad(0, 0);
    for oy in -cfg.search_radius..=cfg.search_radius {
        for ox in -cfg.search_radius..=cfg.search_radius {
            let s = sad(ox, oy);
            if s < best_sad {
                best_sad = s;
                best = (ox, oy);
            }
        }
    }
    best
}

/// Motion-driven background enhancement strength.
///
/// `level` (0..1) scales a saturation and brightness lift and a directional blur along the
/// motion vector.
pub fn enhance_background(frame: &mut Frame, motion: MotionSample, strength: f32) {
    let level = (motion.normalized() * strength).clamp(0.0, 1.0);
    if level <= 0.01 || frame.format == PixelFormat::Gray8 {
        return;
    }

    let ch = frame.channels();
    let sat_mul = 1.0 + 0.3 * level;
    let val_mul = 1.0 + 0.1 * level;
    frame.data.par_chunks_exact_mut(ch).for_each(|px| {
        let (h, s, v) = rgb_to_hsv(
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
        );
        let (r, g, b) = hsv_to_rgb(h, (s * sat_mul).min(1.0), (v * val_mul).min(1.0));
        px[0] = to_u8(r * 255.0);
        px[1] = to_u8(g * 255.0);
        px[2] = to_u8(b * 255.0);
    });

    let taps = (level * 8.0).round() as i32;
    let len = (motion.dx * motion.dx + motion.dy * motion.dy).sqrt();
    if taps < 2 || !len.is_finite() || len <= f32::EPSILON {
        return;
    }
    directional_blur(frame, motion.dx / len, motion.dy / len, taps);
}

fn directional_blur(frame: &mut Frame, ux: f32, uy: f32, taps: i32) {
    let src = frame.data.clone();
    let (w, h) = (frame.width as i32, frame.height as i32);
    let ch = frame.channels();
    let stride = frame.stride();
    let offsets: Vec<(i32, i32)> = (-taps / 2..=taps / 2)
        .map(|k| ((k as f32 * ux).round() as i32, (k as f32 * uy).round() as i32))
        .collect();
    let n = offsets.len() as u32;

    frame
        .data
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for x in 0..w {
                let mut acc = [0u32; 4];
                for &(ox, oy) in &offsets {
                    let sx = (x + ox).clamp(0, w - 1) as usize;
                    let sy = (y + oy).clamp(0, h - 1) as usize;
                    let o = sy * stride + sx * ch;
                    for c in 0..ch {
                        acc[c] += u32::from(src[o + c]);
                    }
                }
                let d = x as usize * ch;
                for c in 0..ch {
                    row[d + c] = ((acc[c] + n / 2) / n) as u8;
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/render/motion.rs"]
mod tests;
