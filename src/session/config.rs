use crate::effects::stack::EffectsConfig;
use crate::encode::adaptive::EncodeConfig;
use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::render::background::BackgroundConfig;
use crate::render::reactive::ReactiveConfig;
use crate::text::layout::TextStyle;
use crate::text::renderer::AnimationConfig;

/// Everything that shapes a render, minus the inputs themselves.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub resolution: Resolution,
    pub fps: Fps,
    /// Seconds rendered past the end of the audio.
    pub padding_secs: f64,
    pub text: TextStyle,
    pub animation: AnimationConfig,
    pub effects: EffectsConfig,
    pub reactive: ReactiveConfig,
    pub background: BackgroundConfig,
    /// Output buffers kept for reuse.
    pub pool_capacity: usize,
    pub encode: EncodeConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: Fps::default(),
            padding_secs: 2.0,
            text: TextStyle::default(),
            animation: AnimationConfig::default(),
            effects: EffectsConfig::default(),
            reactive: ReactiveConfig::default(),
            background: BackgroundConfig::default(),
            pool_capacity: 4,
            encode: EncodeConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Reject configurations no render could succeed with.
    pub fn validate(&self) -> CadenceResult<()> {
        let Resolution { width, height } = self.resolution;
        if width == 0 || height == 0 {
            return Err(CadenceError::validation(
                "resolution width/height must be positive",
            ));
        }
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(CadenceError::validation(
                "resolution width/height must be even",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(CadenceError::validation("fps must be non-zero"));
        }
        if !self.padding_secs.is_finite() || self.padding_secs < 0.0 {
            return Err(CadenceError::validation(
                "padding_secs must be finite and >= 0",
            ));
        }
        if !self.text.font_size.is_finite() || self.text.font_size <= 0.0 {
            return Err(CadenceError::validation("font_size must be finite and > 0"));
        }

        let anim = &self.animation;
        for (name, v) in [
            ("word_delay", anim.word_delay),
            ("amplitude", anim.amplitude),
            ("slide_distance", anim.slide_distance),
            ("beat_pulse", anim.beat_pulse),
        ] {
            if !v.is_finite() {
                return Err(CadenceError::validation(format!("{name} must be finite")));
            }
        }
        if anim.word_delay < 0.0 {
            return Err(CadenceError::validation("word_delay must be >= 0"));
        }
        for (name, v) in [
            ("entrance_span", anim.entrance_span),
            ("exit_span", anim.exit_span),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CadenceError::validation(format!(
                    "{name} must be within [0, 1]"
                )));
            }
        }

        let r = &self.reactive;
        let thresholds = [r.medium_threshold, r.high_threshold, r.intense_threshold];
        if thresholds.iter().any(|t| !t.is_finite())
            || !(r.medium_threshold <= r.high_threshold && r.high_threshold <= r.intense_threshold)
        {
            return Err(CadenceError::validation(
                "reactive thresholds must be finite and ascending",
            ));
        }
        if !self.background.motion_enhancement.is_finite() || self.background.motion_enhancement < 0.0 {
            return Err(CadenceError::validation(
                "motion_enhancement must be finite and >= 0",
            ));
        }
        if !self.background.min_switch_interval.is_finite() || self.background.min_switch_interval < 0.0 {
            return Err(CadenceError::validation(
                "min_switch_interval must be finite and >= 0",
            ));
        }
        if self.encode.progress_every == 0 {
            return Err(CadenceError::validation("progress_every must be > 0"));
        }
        if !self.encode.hardware_timeout_secs.is_finite() || self.encode.hardware_timeout_secs < 0.0 {
            return Err(CadenceError::validation(
                "hardware_timeout_secs must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
