use std::f32::consts::PI;

use crate::effects::mask::{centroid, spatial_mask};
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::foundation::math::{hsv_to_rgb, rgb_to_hsv, to_u8};
use crate::input::audio::AudioFeatureSnapshot;
use crate::render::frame::{Frame, PixelFormat};

/// Intensity multiplier applied on beats.
pub const BEAT_BOOST: f32 = 3.0;
/// Number of concentric rings in the ambient glow.
pub const GLOW_RINGS: u32 = 3;

/// Which text-layer effects run, and how strongly.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub ambient_glow: bool,
    pub glow_color: [u8; 3],
    /// Radius of the innermost ring; outer rings are multiples of it.
    pub glow_radius: u32,
    pub glow_intensity: f32,

    pub dynamic_color: bool,
    /// Base hue (degrees) used to tint achromatic text.
    pub base_hue: f32,
    /// Hue drift in degrees per second.
    pub hue_speed: f32,
    pub saturation_boost: f32,
    pub tint: f32,

    pub radial_lighting: bool,
    pub lighting_strength: f32,

    pub wave_distortion: bool,
    pub wave_amplitude: f32,
    pub wave_length: f32,
    pub wave_speed: f32,

    pub chromatic_aberration: bool,
    pub chroma_offset: f32,

    pub energy_burst: bool,
    pub burst_color: [u8; 3],
    pub burst_rays: u32,
    pub burst_threshold: f32,
    pub burst_intensity: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            ambient_glow: true,
            glow_color: [120, 180, 255],
            glow_radius: 6,
            glow_intensity: 0.6,
            dynamic_color: true,
            base_hue: 200.0,
            hue_speed: 12.0,
            saturation_boost: 0.4,
            tint: 0.35,
            radial_lighting: true,
            lighting_strength: 0.35,
            wave_distortion: false,
            wave_amplitude: 6.0,
            wave_length: 48.0,
            wave_speed: 1.5,
            chromatic_aberration: false,
            chroma_offset: 2.0,
            energy_burst: false,
            burst_color: [255, 220, 160],
            burst_rays: 12,
            burst_threshold: 0.7,
            burst_intensity: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowParams {
    pub color: [u8; 3],
    pub radius: u32,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorShiftParams {
    pub base_hue: f32,
    pub hue_speed: f32,
    pub saturation_boost: f32,
    pub tint: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveParams {
    pub amplitude: f32,
    pub wavelength: f32,
    pub speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BurstParams {
    pub color: [u8; 3],
    pub rays: u32,
    pub threshold: f32,
    pub intensity: f32,
}

/// A reactive text-layer transform.
///
/// Every effect is a pure function of `(layer, features, timestamp)` and keeps no state between
/// calls. Effects derive their spatial footprint from the layer's alpha only.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    AmbientGlow(GlowParams),
    DynamicColor(ColorShiftParams),
    RadialLighting { strength: f32 },
    WaveDistortion(WaveParams),
    ChromaticAberration { offset: f32 },
    EnergyBurst(BurstParams),
}

impl Effect {
    /// Position in the fixed pipeline order.
    pub fn stage(&self) -> u8 {
        match self {
            Self::AmbientGlow(_) => 0,
            Self::DynamicColor(_) => 1,
            Self::RadialLighting { .. } => 2,
            Self::WaveDistortion(_) => 3,
            Self::ChromaticAberration { .. } => 4,
            Self::EnergyBurst(_) => 5,
        }
    }

    /// How far (in pixels) this effect can paint beyond the layer's opaque pixels.
    pub fn reach_px(&self) -> u32 {
        match self {
            Self::AmbientGlow(p) => {
                let outer = p.radius * GLOW_RINGS;
                outer / 2 + outer
            }
            Self::DynamicColor(_) | Self::RadialLighting { .. } => 0,
            Self::WaveDistortion(p) => (p.amplitude.abs() * BEAT_BOOST).ceil() as u32,
            Self::ChromaticAberration { offset } => (offset.abs() * 1.5 * BEAT_BOOST).ceil() as u32,
            Self::EnergyBurst(_) => BURST_SPREAD + BURST_SOFTNESS,
        }
    }

    /// Apply to a straight-alpha RGBA layer.
    pub fn apply(
        &self,
        layer: Frame,
        features: &AudioFeatureSnapshot,
        t: f64,
    ) -> CadenceResult<Frame> {
        match self {
            Self::AmbientGlow(p) => ambient_glow(p, layer, features),
            Self::DynamicColor(p) => Ok(dynamic_color(p, layer, features, t)),
            Self::RadialLighting { strength } => Ok(radial_lighting(*strength, layer, features)),
            Self::WaveDistortion(p) => Ok(wave_distortion(p, layer, features, t)),
            Self::ChromaticAberration { offset } => {
                Ok(chromatic_aberration(*offset, layer, features))
            }
            Self::EnergyBurst(p) => energy_burst(p, layer, features, t),
        }
    }
}

/// Ordered text-layer effect pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectStack {
    effects: Vec<Effect>,
}

impl EffectStack {
    /// Build a stack; effects are reordered into the fixed pipeline order.
    pub fn new(mut effects: Vec<Effect>) -> Self {
        effects.sort_by_key(Effect::stage);
        Self { effects }
    }

    pub fn from_config(cfg: &EffectsConfig) -> Self {
        let mut effects = Vec::new();
        if cfg.ambient_glow {
            effects.push(Effect::AmbientGlow(GlowParams {
                color: cfg.glow_color,
                radius: cfg.glow_radius,
                intensity: cfg.glow_intensity,
            }));
        }
        if cfg.dynamic_color {
            effects.push(Effect::DynamicColor(ColorShiftParams {
                base_hue: cfg.base_hue,
                hue_speed: cfg.hue_speed,
                saturation_boost: cfg.saturation_boost,
                tint: cfg.tint,
            }));
        }
        if cfg.radial_lighting {
            effects.push(Effect::RadialLighting {
                strength: cfg.lighting_strength,
            });
        }
        if cfg.wave_distortion {
            effects.push(Effect::WaveDistortion(WaveParams {
                amplitude: cfg.wave_amplitude,
                wavelength: cfg.wave_length,
                speed: cfg.wave_speed,
            }));
        }
        if cfg.chromatic_aberration {
            effects.push(Effect::ChromaticAberration {
                offset: cfg.chroma_offset,
            });
        }
        if cfg.energy_burst {
            effects.push(Effect::EnergyBurst(BurstParams {
                color: cfg.burst_color,
                rays: cfg.burst_rays,
                threshold: cfg.burst_threshold,
                intensity: cfg.burst_intensity,
            }));
        }
        Self::new(effects)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Largest reach of any effect in the stack.
    pub fn reach_px(&self) -> u32 {
        self.effects.iter().map(Effect::reach_px).max().unwrap_or(0)
    }

    /// Run every effect in order.
    pub fn apply(
        &self,
        layer: Frame,
        features: &AudioFeatureSnapshot,
        t: f64,
    ) -> CadenceResult<Frame> {
        if layer.format != PixelFormat::Rgba8 {
            return Err(CadenceError::validation(
                "effect stack expects an RGBA layer",
            ));
        }
        self.effects
            .iter()
            .try_fold(layer, |layer, effect| effect.apply(layer, features, t))
    }
}

fn beat_boost(f: &AudioFeatureSnapshot) -> f32 {
    if f.on_beat { BEAT_BOOST } else { 1.0 }
}

/// Paint `color` with per-pixel coverage `cover` behind the existing pixels (straight alpha).
fn paint_under(layer: &mut Frame, cover: &[f32], color: [u8; 3]) {
    let c = color.map(f32::from);
    for (px, &g) in layer.data.chunks_exact_mut(4).zip(cover) {
        if g <= 0.0 {
            continue;
        }
        let ta = f32::from(px[3]) / 255.0;
        let gb = g.clamp(0.0, 1.0) * (1.0 - ta);
        let out_a = ta + gb;
        if out_a <= 0.0 {
            continue;
        }
        for i in 0..3 {
            px[i] = to_u8((f32::from(px[i]) * ta + c[i] * gb) / out_a);
        }
        px[3] = to_u8(out_a * 255.0);
    }
}

fn ambient_glow(
    p: &GlowParams,
    mut layer: Frame,
    f: &AudioFeatureSnapshot,
) -> CadenceResult<Frame> {
    let intensity = p.intensity * (0.6 + 0.8 * f.energy()) * beat_boost(f);
    if intensity <= 0.0 || p.radius == 0 {
        return Ok(layer);
    }

    let mut acc = vec![0f32; layer.width as usize * layer.height as usize];
    let mut weights = 0.0f32;
    for ring in 1..=GLOW_RINGS {
        let r = p.radius * ring;
        let mask = spatial_mask(&layer, r / 2, r)?;
        let w = 1.0 / ring as f32;
        weights += w;
        for (a, &m) in acc.iter_mut().zip(&mask) {
            *a += w * f32::from(m) / 255.0;
        }
    }
    for a in &mut acc {
        *a = (*a / weights * intensity).clamp(0.0, 1.0);
    }
    paint_under(&mut layer, &acc, p.color);
    Ok(layer)
}

fn dynamic_color(
    p: &ColorShiftParams,
    mut layer: Frame,
    f: &AudioFeatureSnapshot,
    t: f64,
) -> Frame {
    let shift = p.hue_speed * t as f32 + f.brightness() * 60.0;
    let sat_mul = 1.0 + p.saturation_boost * f.energy() * beat_boost(f);
    let tint_amount = (p.tint * (0.5 + f.energy())).clamp(0.0, 1.0);

    for px in layer.data.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let (r, g, b) = (
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
        );
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r, g, b) = if s < 0.05 {
            let (tr, tg, tb) = hsv_to_rgb(p.base_hue + shift, 0.6, v);
            (
                r + (tr - r) * tint_amount,
                g + (tg - g) * tint_amount,
                b + (tb - b) * tint_amount,
            )
        } else {
            hsv_to_rgb(h + shift, (s * sat_mul).min(1.0), v)
        };
        px[0] = to_u8(r * 255.0);
        px[1] = to_u8(g * 255.0);
        px[2] = to_u8(b * 255.0);
    }
    layer
}

fn radial_lighting(strength: f32, mut layer: Frame, f: &AudioFeatureSnapshot) -> Frame {
    if strength == 0.0 {
        return layer;
    }
    let alpha = layer.alpha_mask();
    let (cx, cy) = centroid(&alpha.data, layer.width, layer.height);
    let dmax = ((layer.width as f32 / 2.0).powi(2) + (layer.height as f32 / 2.0).powi(2))
        .sqrt()
        .max(1.0);
    let lift = strength * (0.5 + f.energy());
    let width = layer.width as usize;

    for (i, px) in layer.data.chunks_exact_mut(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let dx = (i % width) as f32 - cx;
        let dy = (i / width) as f32 - cy;
        let d = ((dx * dx + dy * dy).sqrt() / dmax).min(1.0);
        let factor = 1.0 + lift * (1.0 - d).powi(2) - strength * 0.25 * d;
        for c in &mut px[..3] {
            *c = to_u8(f32::from(*c) * factor);
        }
    }
    layer
}

fn wave_distortion(p: &WaveParams, layer: Frame, f: &AudioFeatureSnapshot, t: f64) -> Frame {
    let amplitude = p.amplitude * (0.4 + 0.6 * f.energy()) * beat_boost(f);
    if amplitude == 0.0 || p.wavelength <= 0.0 {
        return layer;
    }
    let mut out = Frame::new(layer.width, layer.height, PixelFormat::Rgba8);
    let w = layer.width as i64;
    let stride = layer.stride();
    let phase = p.speed * t as f32;

    for y in 0..layer.height as usize {
        let dx = amplitude * (2.0 * PI * (y as f32 / p.wavelength + phase)).sin();
        let shift = if dx.is_finite() { dx.round() as i64 } else { 0 };
        let src = &layer.data[y * stride..(y + 1) * stride];
        let dst = &mut out.data[y * stride..(y + 1) * stride];
        for x in 0..w {
            let sx = x - shift;
            if (0..w).contains(&sx) {
                let (d, s) = (x as usize * 4, sx as usize * 4);
                dst[d..d + 4].copy_from_slice(&src[s..s + 4]);
            }
        }
    }
    out
}

fn chromatic_aberration(offset: f32, layer: Frame, f: &AudioFeatureSnapshot) -> Frame {
    let k = (offset * (0.5 + f.energy()) * beat_boost(f)).round();
    if k == 0.0 || !k.is_finite() {
        return layer;
    }
    let k = k as i64;
    let mut out = Frame::new(layer.width, layer.height, PixelFormat::Rgba8);
    let w = layer.width as i64;
    let stride = layer.stride();

    let sample = |row: &[u8], x: i64, c: usize| -> (f32, f32) {
        if (0..w).contains(&x) {
            let o = x as usize * 4;
            let a = f32::from(row[o + 3]) / 255.0;
            (f32::from(row[o + c]) * a, a)
        } else {
            (0.0, 0.0)
        }
    };

    for y in 0..layer.height as usize {
        let src = &layer.data[y * stride..(y + 1) * stride];
        let dst = &mut out.data[y * stride..(y + 1) * stride];
        for x in 0..w {
            let (r, ra) = sample(src, x - k, 0);
            let (g, ga) = sample(src, x, 1);
            let (b, ba) = sample(src, x + k, 2);
            let a = ra.max(ga).max(ba);
            if a <= 0.0 {
                continue;
            }
            let o = x as usize * 4;
            dst[o] = to_u8(r / a);
            dst[o + 1] = to_u8(g / a);
            dst[o + 2] = to_u8(b / a);
            dst[o + 3] = to_u8(a * 255.0);
        }
    }
    out
}

const BURST_SPREAD: u32 = 12;
const BURST_SOFTNESS: u32 = 24;

fn energy_burst(
    p: &BurstParams,
    mut layer: Frame,
    f: &AudioFeatureSnapshot,
    t: f64,
) -> CadenceResult<Frame> {
    let energy = f.energy();
    let drive = if f.on_beat {
        1.0
    } else if energy >= p.threshold && p.threshold < 1.0 {
        (energy - p.threshold) / (1.0 - p.threshold)
    } else {
        return Ok(layer);
    };
    let strength = (p.intensity * drive * beat_boost(f)).clamp(0.0, 1.0);
    if strength <= 0.0 || p.rays == 0 {
        return Ok(layer);
    }

    let field = spatial_mask(&layer, BURST_SPREAD, BURST_SOFTNESS)?;
    let alpha = layer.alpha_mask();
    let (cx, cy) = centroid(&alpha.data, layer.width, layer.height);
    let spin = 0.6 * t as f32;
    let width = layer.width as usize;

    let cover: Vec<f32> = field
        .iter()
        .enumerate()
        .map(|(i, &m)| {
            if m == 0 {
                return 0.0;
            }
            let dx = (i % width) as f32 - cx;
            let dy = (i / width) as f32 - cy;
            let theta = dy.atan2(dx);
            let ray = (p.rays as f32 * theta + spin).cos().max(0.0).powi(8);
            f32::from(m) / 255.0 * ray * strength
        })
        .collect();
    paint_under(&mut layer, &cover, p.color);
    Ok(layer)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/stack.rs"]
mod tests;
