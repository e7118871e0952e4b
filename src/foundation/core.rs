use crate::foundation::error::{CadenceError, CadenceResult};

pub use kurbo::Vec2;

/// Absolute 0-based output frame index.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> CadenceResult<Self> {
        if den == 0 {
            return Err(CadenceError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(CadenceError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Timestamp of frame `idx`, `idx / fps`.
    pub fn frame_to_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Convert seconds to a frame count using ceil semantics.
    ///
    /// A tiny epsilon absorbs float noise so that e.g. `12.1 s @ 30 fps` yields 363, not 364.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        let frames = secs * self.as_f64();
        (frames - 1e-9).ceil().max(0.0) as u64
    }
}

/// Number of output frames for a session: `ceil((audio_duration + padding) * fps)`.
pub fn total_frames(audio_duration_secs: f64, padding_secs: f64, fps: Fps) -> u64 {
    fps.secs_to_frames_ceil(audio_duration_secs.max(0.0) + padding_secs.max(0.0))
}

/// Output frame dimensions in pixels. Fixed for a render session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Resolution {
    /// Create a validated resolution with positive dimensions.
    pub fn new(width: u32, height: u32) -> CadenceResult<Self> {
        if width == 0 || height == 0 {
            return Err(CadenceError::validation(
                "resolution width/height must be positive",
            ));
        }
        Ok(Self { width, height })
    }

    /// Total number of pixels.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
