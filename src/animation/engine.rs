use std::f64::consts::PI;

use crate::animation::ease::Ease;
use crate::foundation::core::Vec2;

/// Pixel offset of a full-amplitude `wave`.
pub const WAVE_BASE_PX: f64 = 12.0;
/// Pixel offset of a full-amplitude `shake` at progress 0.
pub const SHAKE_BASE_PX: f64 = 6.0;
/// Starting rotation of a full-amplitude `rotate_in`.
pub const ROTATE_BASE_DEG: f64 = 90.0;
/// Peak extra scale of a full-amplitude `glow_pulse`.
pub const GLOW_PULSE_BASE: f64 = 0.08;

/// Text animation kinds.
///
/// Every kind maps eased progress `p` to an [`AnimationState`]; fields not listed stay at
/// identity (position = target, scale 1, rotation 0, opacity 1, reveal 1).
///
/// | kind | mapping | p = 0 | p = 1 |
/// |---|---|---|---|
/// | `fade_in` | opacity = p | 0 | 1 |
/// | `fade_out` | opacity = 1 − p | 1 | 0 |
/// | `slide_in` | position = lerp(start, target, p), opacity = p | start, 0 | target, 1 |
/// | `slide_out` | position = lerp(start, target, p), opacity = 1 − p | start, 1 | target, 0 |
/// | `scale_in` | scale = p, opacity = p | 0 | 1 |
/// | `scale_out` | scale = 1 − p, opacity = 1 − p | 1 | 0 |
/// | `rotate_in` | rotation = 90°·A·(1 − p), opacity = p | 90°·A, 0 | 0°, 1 |
/// | `typewriter` | reveal = p | 0 | 1 |
/// | `bounce_in` | scale = bounce(p), opacity = p | 0 | 1 |
/// | `elastic_in` | scale = elastic(p), opacity = p | 0 | 1 |
/// | `wave` | y += −12·A·sin(2πp) | 0 | 0 |
/// | `shake` | (x, y) += 6·A·(1 − p)·jitter | ±6·A | 0 |
/// | `glow_pulse` | scale = 1 + 0.08·A·sin(πp) | 1 | 1 |
///
/// `A` is the amplitude. Opacity and reveal are clamped to `[0, 1]` even when an overshooting
/// easing pushes `p` past the endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    FadeIn,
    FadeOut,
    SlideIn,
    SlideOut,
    ScaleIn,
    ScaleOut,
    RotateIn,
    Typewriter,
    BounceIn,
    ElasticIn,
    Wave,
    /// The only kind that consumes randomness, drawn from the caller's [`JitterSource`].
    Shake,
    GlowPulse,
}

impl AnimationKind {
    /// Every kind, in declaration order.
    pub const ALL: [AnimationKind; 13] = [
        AnimationKind::FadeIn,
        AnimationKind::FadeOut,
        AnimationKind::SlideIn,
        AnimationKind::SlideOut,
        AnimationKind::ScaleIn,
        AnimationKind::ScaleOut,
        AnimationKind::RotateIn,
        AnimationKind::Typewriter,
        AnimationKind::BounceIn,
        AnimationKind::ElasticIn,
        AnimationKind::Wave,
        AnimationKind::Shake,
        AnimationKind::GlowPulse,
    ];
}

/// Uniform random source for `shake`.
///
/// This is the sole source of per-frame randomness in the render core. Sessions own one seeded
/// instance so a restarted render replays the same jitter.
pub trait JitterSource {
    /// Next uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl JitterSource for fastrand::Rng {
    fn next_unit(&mut self) -> f64 {
        self.f64()
    }
}

/// Fixed jitter for tests and previews: always returns the same sample.
#[derive(Clone, Copy, Debug)]
pub struct ConstantJitter(pub f64);

impl JitterSource for ConstantJitter {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// Per-frame transform derived from an animation. Has no identity; recomputed every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    pub position: Vec2,
    pub scale: Vec2,
    pub rotation_deg: f64,
    pub opacity: f64,
    /// Fraction of the word's columns revealed (typewriter).
    pub reveal: f64,
}

impl AnimationState {
    /// Identity transform resting at `position`.
    pub fn identity(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::new(1.0, 1.0),
            rotation_deg: 0.0,
            opacity: 1.0,
            reveal: 1.0,
        }
    }

    /// Per-field linear interpolation; `t = 0` yields `a`, `t = 1` yields `b`.
    pub fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn mix(a: f64, b: f64, t: f64) -> f64 {
            a + (b - a) * t
        }
        Self {
            position: Vec2::new(
                mix(a.position.x, b.position.x, t),
                mix(a.position.y, b.position.y, t),
            ),
            scale: Vec2::new(mix(a.scale.x, b.scale.x, t), mix(a.scale.y, b.scale.y, t)),
            rotation_deg: mix(a.rotation_deg, b.rotation_deg, t),
            opacity: mix(a.opacity, b.opacity, t),
            reveal: mix(a.reveal, b.reveal, t),
        }
    }

    /// Offset of this state relative to `rest`.
    pub fn offset_from(&self, rest: Vec2) -> Vec2 {
        self.position - rest
    }
}

/// Inputs of a single animation evaluation.
#[derive(Clone, Copy, Debug)]
pub struct AnimationParams {
    pub kind: AnimationKind,
    /// Linear progress; callers keep it in `[0, 1]`.
    pub progress: f64,
    pub ease: Ease,
    pub start: Vec2,
    pub target: Vec2,
    pub amplitude: f64,
}

/// Evaluate an animation.
///
/// Side-effect free for every kind except [`AnimationKind::Shake`], which draws two samples from
/// `jitter`.
pub fn compute(params: &AnimationParams, jitter: &mut dyn JitterSource) -> AnimationState {
    let p = params.ease.apply(params.progress);
    let amp = params.amplitude;
    let mut s = AnimationState::identity(params.target);

    match params.kind {
        AnimationKind::FadeIn => s.opacity = p,
        AnimationKind::FadeOut => s.opacity = 1.0 - p,
        AnimationKind::SlideIn => {
            s.position = lerp_vec(params.start, params.target, p);
            s.opacity = p;
        }
        AnimationKind::SlideOut => {
            s.position = lerp_vec(params.start, params.target, p);
            s.opacity = 1.0 - p;
        }
        AnimationKind::ScaleIn => {
            s.scale = Vec2::new(p, p);
            s.opacity = p;
        }
        AnimationKind::ScaleOut => {
            s.scale = Vec2::new(1.0 - p, 1.0 - p);
            s.opacity = 1.0 - p;
        }
        AnimationKind::RotateIn => {
            s.rotation_deg = ROTATE_BASE_DEG * amp * (1.0 - p);
            s.opacity = p;
        }
        AnimationKind::Typewriter => s.reveal = p,
        AnimationKind::BounceIn => {
            let k = Ease::Bounce.apply(p);
            s.scale = Vec2::new(k, k);
            s.opacity = p;
        }
        AnimationKind::ElasticIn => {
            let k = Ease::Elastic.apply(p);
            s.scale = Vec2::new(k, k);
            s.opacity = p;
        }
        AnimationKind::Wave => {
            s.position.y -= WAVE_BASE_PX * amp * (2.0 * PI * p).sin();
        }
        AnimationKind::Shake => {
            let falloff = SHAKE_BASE_PX * amp * (1.0 - p).max(0.0);
            let jx = jitter.next_unit() * 2.0 - 1.0;
            let jy = jitter.next_unit() * 2.0 - 1.0;
            s.position += Vec2::new(jx * falloff, jy * falloff);
        }
        AnimationKind::GlowPulse => {
            let k = 1.0 + GLOW_PULSE_BASE * amp * (PI * p).sin();
            s.scale = Vec2::new(k, k);
        }
    }

    s.opacity = s.opacity.clamp(0.0, 1.0);
    s.reveal = s.reveal.clamp(0.0, 1.0);
    s
}

fn lerp_vec(a: Vec2, b: Vec2, t: f64) -> Vec2 {
    Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/engine.rs"]
mod tests;
