use crate::foundation::error::CadenceResult;
use crate::input::audio::AudioFeatureSnapshot;
use crate::render::background::BackgroundManager;
use crate::render::blend::composite_all;
use crate::render::frame::{Frame, Layer, PixelFormat};
use crate::render::motion::{MotionEstimator, MotionHistory, MotionSample, enhance_background};
use crate::render::pool::{FrameBufferPool, FramePoolStats};
use crate::render::reactive::{EnergyTier, ReactiveConfig, apply_reactive, punch_background};

/// Background frame plus the motion measured on it.
#[derive(Debug)]
pub struct PreparedBase {
    pub frame: Frame,
    /// Smoothed motion over the recent history.
    pub motion: MotionSample,
}

/// Owns every piece of cross-frame rendering state of a session: the buffer pool, the background
/// clip rotation and the motion history.
#[derive(Debug)]
pub struct Compositor {
    pool: FrameBufferPool,
    background: BackgroundManager,
    motion: MotionEstimator,
    history: MotionHistory,
    reactive: ReactiveConfig,
}

impl Compositor {
    pub fn new(pool: FrameBufferPool, background: BackgroundManager, reactive: ReactiveConfig) -> Self {
        Self {
            pool,
            background,
            motion: MotionEstimator::default(),
            history: MotionHistory::default(),
            reactive,
        }
    }

    /// Check out an output buffer and fill it with the background for `t`.
    ///
    /// Motion is estimated against the previous background and the frame is enhanced
    /// proportionally. Audio-only sessions skip motion entirely.
    pub fn prepare_base(&mut self, t: f64) -> CadenceResult<PreparedBase> {
        let mut frame = self.pool.checkout(PixelFormat::Rgb8)?;
        self.background.fill(t, &mut frame);

        if self.background.is_audio_only() {
            return Ok(PreparedBase {
                frame,
                motion: MotionSample::default(),
            });
        }

        let sample = self.motion.estimate(&frame);
        self.history.push(sample);
        let motion = self.history.smoothed();
        enhance_background(&mut frame, motion, self.background.config().motion_enhancement);
        tracing::trace!(t, magnitude = motion.magnitude, "background motion");
        Ok(PreparedBase { frame, motion })
    }

    /// Beat-impact zoom of the background. Must run before any layer is composited.
    pub fn punch(&self, base: &mut Frame, features: &AudioFeatureSnapshot) -> bool {
        punch_background(base, features, &self.reactive)
    }

    /// Blend `layers` onto `base` in order; unsupported layers are skipped.
    pub fn composite(&self, base: &mut Frame, layers: &[Layer]) -> usize {
        composite_all(base, layers)
    }

    /// Frame-level reactive effects.
    pub fn finish(&self, frame: &mut Frame, features: &AudioFeatureSnapshot) -> CadenceResult<EnergyTier> {
        apply_reactive(frame, features, &self.reactive)
    }

    /// Hand a frame back to the pool once its consumer is done with it.
    pub fn recycle(&mut self, frame: Frame) {
        self.pool.release(frame);
    }

    /// Forget all cross-frame state so the timeline can be replayed from the start.
    pub fn reset(&mut self) {
        self.background.reset();
        self.motion.reset();
        self.history.clear();
    }

    #[cfg(test)]
    pub fn history(&self) -> &MotionHistory {
        &self.history
    }

    #[cfg(test)]
    pub fn clip_state(&self) -> &crate::render::background::BackgroundClipState {
        self.background.state()
    }

    pub fn pool_stats(&self) -> FramePoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
