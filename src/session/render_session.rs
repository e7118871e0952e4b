use crate::effects::stack::EffectStack;
use crate::foundation::core::{Fps, FrameIndex, Resolution, total_frames};
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::input::audio::{AudioFeatureProvider, AudioFeatureSnapshot};
use crate::input::background::BackgroundSource;
use crate::input::glyph::GlyphRasterizer;
use crate::input::lyrics::{LyricLine, LyricProvider, active_line, filter_lines};
use crate::render::background::{BackgroundManager, BackgroundMode};
use crate::render::compositor::{Compositor, PreparedBase};
use crate::render::frame::Frame;
use crate::render::motion::MotionSample;
use crate::render::pool::{FrameBufferPool, FramePoolStats};
use crate::render::reactive::EnergyTier;
use crate::session::config::RenderConfig;
use crate::session::frame_loop::FrameSynthesisLoop;
use crate::text::renderer::TextRenderer;

enum BackgroundInput {
    Mode(BackgroundMode),
    /// Clips rotated on the audio provider's beats.
    OnBeats(Vec<Box<dyn BackgroundSource>>),
}

/// Collects the collaborators of a [`RenderSession`].
pub struct RenderSessionBuilder {
    config: RenderConfig,
    audio: Option<Box<dyn AudioFeatureProvider>>,
    lyrics: Option<Box<dyn LyricProvider>>,
    rasterizer: Option<Box<dyn GlyphRasterizer>>,
    background: BackgroundInput,
}

impl RenderSessionBuilder {
    fn new() -> Self {
        Self {
            config: RenderConfig::default(),
            audio: None,
            lyrics: None,
            rasterizer: None,
            background: BackgroundInput::Mode(BackgroundMode::None),
        }
    }

    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn audio(mut self, audio: impl AudioFeatureProvider + 'static) -> Self {
        self.audio = Some(Box::new(audio));
        self
    }

    pub fn lyrics(mut self, lyrics: impl LyricProvider + 'static) -> Self {
        self.lyrics = Some(Box::new(lyrics));
        self
    }

    pub fn rasterizer(mut self, rasterizer: impl GlyphRasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    /// Background behavior. Defaults to audio-only.
    pub fn background(mut self, mode: BackgroundMode) -> Self {
        self.background = BackgroundInput::Mode(mode);
        self
    }

    /// Rotate `clips` on the beats reported by the audio provider.
    pub fn beat_switched_clips(mut self, clips: Vec<Box<dyn BackgroundSource>>) -> Self {
        self.background = BackgroundInput::OnBeats(clips);
        self
    }

    /// Validate the configuration, reserve the frame pool and filter the lyric lines.
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> CadenceResult<RenderSession> {
        self.config.validate()?;
        let audio = self
            .audio
            .ok_or_else(|| CadenceError::missing_input("no audio feature provider"))?;
        let lyrics = self
            .lyrics
            .ok_or_else(|| CadenceError::missing_input("no lyric provider"))?;
        let rasterizer = self
            .rasterizer
            .ok_or_else(|| CadenceError::missing_input("no glyph rasterizer"))?;

        let config = self.config;
        let duration = audio.duration();
        if !duration.is_finite() || duration < 0.0 {
            return Err(CadenceError::validation(
                "audio duration must be finite and >= 0",
            ));
        }
        let horizon = duration + config.padding_secs;
        let all_lines = lyrics.lines();
        let lines = filter_lines(all_lines, horizon);
        if lines.len() < all_lines.len() {
            tracing::debug!(
                dropped = all_lines.len() - lines.len(),
                "dropped empty or out-of-range lyric lines"
            );
        }

        let mode = match self.background {
            BackgroundInput::Mode(mode) => mode,
            BackgroundInput::OnBeats(clips) => BackgroundMode::BeatSwitched {
                clips,
                beat_times: audio.beat_times().to_vec(),
            },
        };
        let pool = FrameBufferPool::new(config.resolution, config.pool_capacity)?;
        let background = BackgroundManager::new(mode, config.resolution, config.background.clone())?;
        let compositor = Compositor::new(pool, background, config.reactive.clone());
        let text = TextRenderer::new(
            rasterizer,
            config.text.clone(),
            config.animation.clone(),
            EffectStack::from_config(&config.effects),
            config.resolution,
        );

        let total_frames = total_frames(duration, config.padding_secs, config.fps);
        tracing::info!(
            duration,
            fps = config.fps.as_f64(),
            total_frames,
            lines = lines.len(),
            "render session ready"
        );

        Ok(RenderSession {
            jitter: fastrand::Rng::with_seed(config.animation.jitter_seed),
            config,
            audio,
            lines,
            compositor,
            text,
            total_frames,
        })
    }
}

/// Owns every piece of state of one render: the compositor (pool, background rotation and motion
/// history), the word-bitmap cache and the jitter source.
///
/// Frames are synthesized strictly in order through [`RenderSession::frames`]; the sequence can
/// only be restarted from the beginning.
pub struct RenderSession {
    config: RenderConfig,
    audio: Box<dyn AudioFeatureProvider>,
    lines: Vec<LyricLine>,
    compositor: Compositor,
    text: TextRenderer,
    jitter: fastrand::Rng,
    total_frames: u64,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("resolution", &self.config.resolution)
            .field("fps", &self.config.fps)
            .field("lines", &self.lines.len())
            .field("total_frames", &self.total_frames)
            .finish_non_exhaustive()
    }
}

impl RenderSession {
    pub fn builder() -> RenderSessionBuilder {
        RenderSessionBuilder::new()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    pub fn fps(&self) -> Fps {
        self.config.fps
    }

    /// `ceil((audio_duration + padding) * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Lyric lines kept after setup filtering, in provider order.
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn pool_stats(&self) -> FramePoolStats {
        self.compositor.pool_stats()
    }

    /// Lazy, in-order frame sequence starting at frame 0.
    pub fn frames(&mut self) -> FrameSynthesisLoop<'_> {
        self.reset();
        FrameSynthesisLoop::new(self)
    }

    /// Render frame `idx` on its own, for previews. The background is sought to the frame's time,
    /// but motion history starts fresh, so motion enhancement is not reflected.
    pub fn render_frame(&mut self, idx: FrameIndex) -> CadenceResult<Frame> {
        self.reset();
        let frame = self.synthesize(idx);
        self.reset();
        frame
    }

    /// Hand a frame produced by this session back to its pool.
    pub fn recycle(&mut self, frame: Frame) {
        self.compositor.recycle(frame);
    }

    /// Forget all cross-frame state and reseed the jitter source.
    pub(crate) fn reset(&mut self) {
        self.compositor.reset();
        self.text.clear_cache();
        self.jitter = fastrand::Rng::with_seed(self.config.animation.jitter_seed);
    }

    /// Produce output frame `idx`. Must be called in increasing order to keep motion and
    /// background rotation coherent.
    pub(crate) fn synthesize(&mut self, idx: FrameIndex) -> CadenceResult<Frame> {
        if idx.0 >= self.total_frames {
            return Err(CadenceError::validation(format!(
                "frame {} is past the end of the render ({} frames)",
                idx.0, self.total_frames
            )));
        }
        let t = self.config.fps.frame_to_secs(idx);
        let PreparedBase { mut frame, motion } = self.compositor.prepare_base(t)?;
        match self.decorate(&mut frame, t, motion) {
            Ok(tier) => {
                tracing::trace!(frame = idx.0, t, ?tier, "synthesized frame");
                Ok(frame)
            }
            Err(err) => {
                self.compositor.recycle(frame);
                Err(err)
            }
        }
    }

    fn decorate(&mut self, frame: &mut Frame, t: f64, motion: MotionSample) -> CadenceResult<EnergyTier> {
        let features = AudioFeatureSnapshot {
            motion_magnitude: motion.normalized(),
            ..self.audio.features_at(t)
        };
        if self.compositor.punch(frame, &features) {
            tracing::trace!(t, "beat impact");
        }

        if let Some(line_idx) = active_line(&self.lines, t) {
            let line = &self.lines[line_idx];
            let layer = self
                .text
                .build_layer(line_idx, line, t, &features, &mut self.jitter)?;
            if let Some(layer) = layer {
                self.compositor.composite(frame, std::slice::from_ref(&layer));
            }
        }

        self.compositor.finish(frame, &features)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
