use std::collections::BTreeMap;

use crate::foundation::error::{CadenceError, CadenceResult};

/// Half-width of the window in which a listed beat marks a timestamp as `on_beat`.
pub const BEAT_WINDOW_SECS: f64 = 0.05;

/// A named feature value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeatureValue {
    Float(f32),
    Bool(bool),
}

/// Audio features at one timestamp. Read-only to the render core.
///
/// Well-known features are typed fields; anything else an upstream analyzer produces lives in
/// `extra` and is reachable through [`AudioFeatureSnapshot::get`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioFeatureSnapshot {
    /// Normalized loudness in `[0, 1]`.
    pub rms_energy: f32,
    /// Normalized spectral centroid in `[0, 1]` (0 = dark, 1 = bright).
    pub spectral_centroid: f32,
    pub onset_strength: f32,
    pub on_beat: bool,
    pub bass_energy: f32,
    pub mid_energy: f32,
    pub treble_energy: f32,
    /// Smoothed background motion, filled in by the compositor rather than by analysis.
    pub motion_magnitude: f32,
    pub extra: BTreeMap<String, f32>,
}

impl AudioFeatureSnapshot {
    /// Look up a feature by its analysis name.
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        let v = match name {
            "rms_energy" => FeatureValue::Float(self.rms_energy),
            "spectral_centroid" => FeatureValue::Float(self.spectral_centroid),
            "onset_strength" => FeatureValue::Float(self.onset_strength),
            "on_beat" => FeatureValue::Bool(self.on_beat),
            "bass_energy" => FeatureValue::Float(self.bass_energy),
            "mid_energy" => FeatureValue::Float(self.mid_energy),
            "treble_energy" => FeatureValue::Float(self.treble_energy),
            "motion_magnitude" => FeatureValue::Float(self.motion_magnitude),
            other => FeatureValue::Float(*self.extra.get(other)?),
        };
        Some(v)
    }

    /// Loudness clamped into `[0, 1]`; non-finite input reads as silence.
    pub fn energy(&self) -> f32 {
        if self.rms_energy.is_finite() {
            self.rms_energy.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Spectral centroid clamped into `[0, 1]`.
    pub fn brightness(&self) -> f32 {
        if self.spectral_centroid.is_finite() {
            self.spectral_centroid.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Source of per-timestamp audio features.
pub trait AudioFeatureProvider {
    /// Features at time `t` seconds.
    fn features_at(&self, t: f64) -> AudioFeatureSnapshot;
    /// Audio duration in seconds.
    fn duration(&self) -> f64;
    /// Beat timestamps in ascending order.
    fn beat_times(&self) -> &[f64];
}

/// One sampled point of a [`FeatureTimeline`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimedSnapshot {
    pub time: f64,
    #[serde(flatten)]
    pub features: AudioFeatureSnapshot,
}

/// Pre-analyzed feature track: sorted samples looked up with nearest-previous semantics.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct FeatureTimeline {
    pub duration: f64,
    #[serde(default)]
    pub beat_times: Vec<f64>,
    #[serde(default)]
    pub samples: Vec<TimedSnapshot>,
}

impl FeatureTimeline {
    /// Build a validated timeline.
    pub fn new(
        duration: f64,
        beat_times: Vec<f64>,
        samples: Vec<TimedSnapshot>,
    ) -> CadenceResult<Self> {
        let tl = Self {
            duration,
            beat_times,
            samples,
        };
        tl.validate()?;
        Ok(tl)
    }

    pub fn validate(&self) -> CadenceResult<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(CadenceError::validation(
                "feature timeline duration must be finite and >= 0",
            ));
        }
        if !self.beat_times.windows(2).all(|w| w[0] <= w[1]) {
            return Err(CadenceError::validation("beat times must be sorted"));
        }
        if !self.samples.windows(2).all(|w| w[0].time <= w[1].time) {
            return Err(CadenceError::validation(
                "feature samples must be sorted by time",
            ));
        }
        Ok(())
    }

    /// Whether a listed beat falls within [`BEAT_WINDOW_SECS`] of `t`.
    pub fn is_near_beat(&self, t: f64) -> bool {
        let idx = self
            .beat_times
            .partition_point(|&b| b < t - BEAT_WINDOW_SECS);
        self.beat_times
            .get(idx)
            .is_some_and(|&b| b <= t + BEAT_WINDOW_SECS)
    }
}

impl AudioFeatureProvider for FeatureTimeline {
    fn features_at(&self, t: f64) -> AudioFeatureSnapshot {
        let idx = self.samples.partition_point(|s| s.time <= t);
        let mut snap = match idx {
            0 => self
                .samples
                .first()
                .map(|s| s.features.clone())
                .unwrap_or_default(),
            i => self.samples[i - 1].features.clone(),
        };
        snap.on_beat = snap.on_beat || self.is_near_beat(t);
        snap
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn beat_times(&self) -> &[f64] {
        &self.beat_times
    }
}

#[cfg(test)]
#[path = "../../tests/unit/input/audio.rs"]
mod tests;
