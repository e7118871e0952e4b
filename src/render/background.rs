use image::{RgbImage, imageops};

use crate::foundation::core::Resolution;
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::input::background::BackgroundSource;
use crate::render::frame::{Frame, PixelFormat};

/// Default minimum gap between two beat-triggered clip switches.
pub const DEFAULT_SWITCH_INTERVAL_SECS: f64 = 2.0;

/// Background behavior of a render session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Minimum seconds between clip switches when rotating on beats.
    pub min_switch_interval: f64,
    /// Scale of the motion-driven enhancement; 0 disables it.
    pub motion_enhancement: f32,
    /// Fill color used in audio-only mode.
    pub fill: [u8; 3],
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            min_switch_interval: DEFAULT_SWITCH_INTERVAL_SECS,
            motion_enhancement: 0.6,
            fill: [0, 0, 0],
        }
    }
}

/// Where background frames come from.
pub enum BackgroundMode {
    /// Audio-only render: a solid fill.
    None,
    /// One clip, looped.
    Single(Box<dyn BackgroundSource>),
    /// Several clips rotated on beat boundaries.
    BeatSwitched {
        clips: Vec<Box<dyn BackgroundSource>>,
        beat_times: Vec<f64>,
    },
}

impl std::fmt::Debug for BackgroundMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Single(_) => f.write_str("Single(..)"),
            Self::BeatSwitched { clips, beat_times } => f
                .debug_struct("BeatSwitched")
                .field("clips", &clips.len())
                .field("beats", &beat_times.len())
                .finish(),
        }
    }
}

/// Clip rotation state. Each clip keeps its own playback cursor, which only advances while the
/// clip is on screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackgroundClipState {
    pub clip_index: usize,
    pub cursors: Vec<f64>,
    pub last_switch_time: f64,
    last_time: Option<f64>,
}

impl BackgroundClipState {
    fn new(clips: usize) -> Self {
        Self {
            cursors: vec![0.0; clips.max(1)],
            ..Self::default()
        }
    }
}

/// Resolves the background frame for each output timestamp.
#[derive(Debug)]
pub struct BackgroundManager {
    mode: BackgroundMode,
    state: BackgroundClipState,
    resolution: Resolution,
    config: BackgroundConfig,
}

impl BackgroundManager {
    pub fn new(mode: BackgroundMode, resolution: Resolution, config: BackgroundConfig) -> CadenceResult<Self> {
        if let BackgroundMode::BeatSwitched { clips, beat_times } = &mode {
            if clips.is_empty() {
                return Err(CadenceError::validation(
                    "beat-switched background needs at least one clip",
                ));
            }
            if beat_times.windows(2).any(|w| w[0] > w[1]) {
                return Err(CadenceError::validation("beat times must be ascending"));
            }
        }
        if !config.min_switch_interval.is_finite() || config.min_switch_interval < 0.0 {
            return Err(CadenceError::validation(
                "min_switch_interval must be finite and >= 0",
            ));
        }
        let clips = match &mode {
            BackgroundMode::BeatSwitched { clips, .. } => clips.len(),
            _ => 1,
        };
        Ok(Self {
            mode,
            state: BackgroundClipState::new(clips),
            resolution,
            config,
        })
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self.mode, BackgroundMode::None)
    }

    #[cfg(test)]
    pub fn state(&self) -> &BackgroundClipState {
        &self.state
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    /// Return to the start of the timeline.
    pub fn reset(&mut self) {
        let clips = self.state.cursors.len();
        self.state = BackgroundClipState::new(clips);
    }

    /// Replay clip rotation from time 0 to `t`, switching at beat times.
    fn seek(&mut self, t: f64) {
        let t = t.max(0.0);
        match &self.mode {
            BackgroundMode::None => {}
            BackgroundMode::Single(_) => self.state.cursors[0] = t,
            BackgroundMode::BeatSwitched { clips, beat_times } => {
                let mut shown_since = 0.0;
                for &beat in beat_times.iter().take_while(|&&b| b <= t) {
                    if beat - self.state.last_switch_time < self.config.min_switch_interval {
                        continue;
                    }
                    self.state.cursors[self.state.clip_index] += beat - shown_since;
                    self.state.clip_index = (self.state.clip_index + 1) % clips.len();
                    self.state.last_switch_time = beat;
                    shown_since = beat;
                }
                self.state.cursors[self.state.clip_index] += t - shown_since;
            }
        }
        if t > 0.0 {
            tracing::debug!(t, clip = self.state.clip_index, "background seeked");
        }
    }

    /// Write the background for output time `t` into `out` (an RGB frame at session resolution).
    ///
    /// A missing frame or a source error is replaced by black. The first call after construction or [`reset`](Self::reset) seeks straight to `t`, so a
    /// timeline entered mid-way shows the clip and cursor it would have reached by playing.
    pub fn fill(&mut self, t: f64, out: &mut Frame) {
        let dt = match self.state.last_time {
            Some(prev) if t >= prev => t - prev,
            Some(_) => 0.0,
            None => {
                self.seek(t);
                0.0
            }
        };
        self.state.last_time = Some(t);

        let fetched = match &mut self.mode {
            BackgroundMode::None => {
                fill_rgb(out, self.config.fill);
                return;
            }
            BackgroundMode::Single(source) => {
                self.state.cursors[0] += dt;
                source.frame_at(self.state.cursors[0])
            }
            BackgroundMode::BeatSwitched { clips, beat_times } => {
                let prev = t - dt;
                let crossed = dt > 0.0 && beat_times.iter().any(|&b| b > prev && b <= t);
                if crossed && t - self.state.last_switch_time >= self.config.min_switch_interval {
                    self.state.clip_index = (self.state.clip_index + 1) % clips.len();
                    self.state.last_switch_time = t;
                    tracing::debug!(t, clip = self.state.clip_index, "background switched on beat");
                } else {
                    self.state.cursors[self.state.clip_index] += dt;
                }
                let idx = self.state.clip_index;
                clips[idx].frame_at(self.state.cursors[idx])
            }
        };

        match fetched {
            Ok(Some(frame)) => {
                if let Err(err) = blit_resized(&frame, self.resolution, out) {
                    tracing::warn!(t, error = %err, "background frame unusable, substituting black");
                    fill_rgb(out, [0, 0, 0]);
                }
            }
            Ok(None) => {
                tracing::warn!(t, "background source returned no frame, substituting black");
                fill_rgb(out, [0, 0, 0]);
            }
            Err(err) => {
                tracing::warn!(t, error = %err, "background read failed, substituting black");
                fill_rgb(out, [0, 0, 0]);
            }
        }
    }
}

fn fill_rgb(out: &mut Frame, rgb: [u8; 3]) {
    let ch = out.channels();
    for px in out.data.chunks_exact_mut(ch) {
        px[..3.min(ch)].copy_from_slice(&rgb[..3.min(ch)]);
        if ch == 4 {
            px[3] = 255;
        }
    }
}

/// Copy `src` into `out`, converting to RGB and resizing to `res` when needed.
fn blit_resized(src: &Frame, res: Resolution, out: &mut Frame) -> CadenceResult<()> {
    if out.format != PixelFormat::Rgb8 || out.resolution() != res {
        return Err(CadenceError::evaluation(
            "background target must be an RGB frame at session resolution",
        ));
    }
    let rgb = to_rgb(src);
    if rgb.width == res.width && rgb.height == res.height {
        out.data.copy_from_slice(&rgb.data);
        return Ok(());
    }
    let img = RgbImage::from_raw(rgb.width, rgb.height, rgb.data)
        .ok_or_else(|| CadenceError::evaluation("background buffer does not match its size"))?;
    let resized = imageops::resize(&img, res.width, res.height, imageops::FilterType::Triangle);
    out.data.copy_from_slice(resized.as_raw());
    Ok(())
}

fn to_rgb(src: &Frame) -> Frame {
    match src.format {
        PixelFormat::Rgb8 => src.clone(),
        PixelFormat::Rgba8 => {
            let mut out = Frame::new(src.width, src.height, PixelFormat::Rgb8);
            for (d, s) in out.data.chunks_exact_mut(3).zip(src.data.chunks_exact(4)) {
                d.copy_from_slice(&s[..3]);
            }
            out
        }
        PixelFormat::Gray8 => {
            let mut out = Frame::new(src.width, src.height, PixelFormat::Rgb8);
            for (d, &g) in out.data.chunks_exact_mut(3).zip(&src.data) {
                d.fill(g);
            }
            out
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
