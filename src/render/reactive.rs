use rayon::prelude::*;

use crate::effects::blur::gaussian_blur;
use crate::foundation::error::CadenceResult;
use crate::foundation::math::{hsv_to_rgb, rgb_to_hsv, to_u8};
use crate::input::audio::AudioFeatureSnapshot;
use crate::render::frame::{Frame, PixelFormat};

/// Loudness class driving frame-level effect intensity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnergyTier {
    Low,
    Medium,
    High,
    Intense,
}

impl EnergyTier {
    pub fn classify(energy: f32, cfg: &ReactiveConfig) -> Self {
        if energy > cfg.intense_threshold {
            Self::Intense
        } else if energy > cfg.high_threshold {
            Self::High
        } else if energy > cfg.medium_threshold {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Frame-level audio-reactive effects, applied after layer compositing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    pub enabled: bool,
    pub medium_threshold: f32,
    pub high_threshold: f32,
    pub intense_threshold: f32,
    /// Medium and above: saturation lift per unit energy.
    pub color_shift: bool,
    pub saturation_boost: f32,
    /// High and above: bloom of bright regions.
    pub glow: bool,
    pub bloom_threshold: u8,
    pub bloom_radius: u32,
    pub bloom_strength: f32,
    /// Intense: red/blue channel split.
    pub chromatic_aberration: bool,
    pub chroma_offset: u32,
    /// High and above, on beats: white flash over the frame plus a zoom punch of the background.
    pub beat_impact: bool,
    pub flash: f32,
    pub zoom_punch: f32,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            medium_threshold: 0.4,
            high_threshold: 0.6,
            intense_threshold: 0.8,
            color_shift: true,
            saturation_boost: 0.25,
            glow: true,
            bloom_threshold: 180,
            bloom_radius: 8,
            bloom_strength: 0.35,
            chromatic_aberration: true,
            chroma_offset: 3,
            beat_impact: true,
            flash: 0.2,
            zoom_punch: 0.04,
        }
    }
}

/// Apply the effects of the frame's energy tier in place. Returns the tier used.
pub fn apply_reactive(
    frame: &mut Frame,
    features: &AudioFeatureSnapshot,
    cfg: &ReactiveConfig,
) -> CadenceResult<EnergyTier> {
    let energy = features.energy();
    let tier = EnergyTier::classify(energy, cfg);
    if !cfg.enabled || tier == EnergyTier::Low || frame.format == PixelFormat::Gray8 {
        return Ok(tier);
    }

    if cfg.color_shift {
        saturate(frame, 1.0 + cfg.saturation_boost * energy);
    }
    if tier >= EnergyTier::High && cfg.glow {
        bloom(frame, cfg.bloom_threshold, cfg.bloom_radius, cfg.bloom_strength * energy)?;
    }
    if tier == EnergyTier::Intense && cfg.chromatic_aberration {
        channel_split(frame, cfg.chroma_offset);
    }
    if is_impact(tier, features, cfg) {
        flash(frame, cfg.flash);
    }
    Ok(tier)
}

/// Zoom punch of a beat impact, applied to the background before any text is composited.
/// Returns whether the frame was zoomed.
pub fn punch_background(frame: &mut Frame, features: &AudioFeatureSnapshot, cfg: &ReactiveConfig) -> bool {
    let tier = EnergyTier::classify(features.energy(), cfg);
    if !cfg.enabled || frame.format == PixelFormat::Gray8 || !is_impact(tier, features, cfg) {
        return false;
    }
    zoom(frame, 1.0 + cfg.zoom_punch)
}

fn is_impact(tier: EnergyTier, features: &AudioFeatureSnapshot, cfg: &ReactiveConfig) -> bool {
    tier >= EnergyTier::High && features.on_beat && cfg.beat_impact
}

fn saturate(frame: &mut Frame, mul: f32) {
    let ch = frame.channels();
    frame.data.par_chunks_exact_mut(ch).for_each(|px| {
        let (h, s, v) = rgb_to_hsv(
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
        );
        let (r, g, b) = hsv_to_rgb(h, (s * mul).min(1.0), v);
        px[0] = to_u8(r * 255.0);
        px[1] = to_u8(g * 255.0);
        px[2] = to_u8(b * 255.0);
    });
}

fn bloom(frame: &mut Frame, threshold: u8, radius: u32, strength: f32) -> CadenceResult<()> {
    if radius == 0 || strength <= 0.0 {
        return Ok(());
    }
    let ch = frame.channels();
    let bright: Vec<u8> = frame
        .data
        .chunks_exact(ch)
        .flat_map(|px| {
            let luma = (77 * u32::from(px[0]) + 150 * u32::from(px[1]) + 29 * u32::from(px[2])) >> 8;
            let keep = luma >= u32::from(threshold);
            [0, 1, 2].map(|i| if keep { px[i] } else { 0 })
        })
        .collect();
    let glow = gaussian_blur(&bright, frame.width, frame.height, 3, radius, radius as f32 / 2.0)?;
    for (px, g) in frame.data.chunks_exact_mut(ch).zip(glow.chunks_exact(3)) {
        for i in 0..3 {
            px[i] = to_u8(f32::from(px[i]) + f32::from(g[i]) * strength);
        }
    }
    Ok(())
}

fn channel_split(frame: &mut Frame, offset: u32) {
    if offset == 0 {
        return;
    }
    let src = frame.data.clone();
    let w = frame.width as i64;
    let k = i64::from(offset);
    let ch = frame.channels();
    let stride = frame.stride();
    frame
        .data
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let srow = &src[y * stride..(y + 1) * stride];
            for x in 0..w {
                let d = x as usize * ch;
                let rx = (x - k).clamp(0, w - 1) as usize * ch;
                let bx = (x + k).clamp(0, w - 1) as usize * ch;
                row[d] = srow[rx];
                row[d + 2] = srow[bx + 2];
            }
        });
}

/// Scale about the frame center by `factor`, nearest-neighbor.
fn zoom(frame: &mut Frame, factor: f32) -> bool {
    if !(factor.is_finite() && factor > 0.0) || factor == 1.0 {
        return false;
    }
    let src = frame.data.clone();
    let (w, h) = (frame.width as f32, frame.height as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let ch = frame.channels();
    let stride = frame.stride();
    let (wi, hi) = (frame.width as i64, frame.height as i64);
    frame
        .data
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let sy = ((y as f32 + 0.5 - cy) / factor + cy).floor() as i64;
            let sy = sy.clamp(0, hi - 1) as usize;
            for x in 0..wi {
                let sx = ((x as f32 + 0.5 - cx) / factor + cx).floor() as i64;
                let s = sy * stride + sx.clamp(0, wi - 1) as usize * ch;
                let d = x as usize * ch;
                row[d..d + 3].copy_from_slice(&src[s..s + 3]);
            }
        });
    true
}

fn flash(frame: &mut Frame, amount: f32) {
    let amount = amount.clamp(0.0, 1.0);
    if amount <= 0.0 {
        return;
    }
    let ch = frame.channels();
    for px in frame.data.chunks_exact_mut(ch) {
        for c in &mut px[..3] {
            let v = f32::from(*c);
            *c = to_u8(v + (255.0 - v) * amount);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/reactive.rs"]
mod tests;
