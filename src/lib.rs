//! Cadence is the frame-synthesis core of an audio-reactive lyric video generator.
//!
//! The public API is session-oriented:
//!
//! - Describe the render with a [`RenderConfig`]
//! - Build a [`RenderSession`] from an [`AudioFeatureProvider`], a [`LyricProvider`], a
//!   [`GlyphRasterizer`] and an optional background
//! - Pull frames from [`RenderSession::frames`], or hand the sequence to an [`AdaptiveEncoder`]
//!   which streams it into the probed hardware encoder and falls back to software once
//!
//! Audio analysis, lyric alignment and font rasterization are collaborators behind traits; the
//! crate ships small reference implementations of each for previews and tests.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod effects;
pub(crate) mod encode;
pub(crate) mod input;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod text;

pub use crate::foundation::core::{Fps, FrameIndex, Resolution, Vec2, total_frames};
pub use crate::foundation::error::{CadenceError, CadenceResult, EncodeStage};

pub use crate::animation::ease::Ease;
pub use crate::animation::engine::{
    AnimationKind, AnimationParams, AnimationState, ConstantJitter, JitterSource, compute,
};
pub use crate::effects::stack::{Effect, EffectStack, EffectsConfig};
pub use crate::encode::adaptive::{
    AdaptiveEncoder, CancelToken, EncodeConfig, EncodeReport, FfmpegSinkFactory, Muxer,
    SinkFactory,
};
pub use crate::encode::ffmpeg::{FfmpegMuxer, FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::probe::{
    AcceleratorVendor, CapabilitySource, EncoderRecommendation, HardwareCapabilityProbe,
    RateControl, SystemCapabilities,
};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, flatten_to_rgb};
pub use crate::input::audio::{
    AudioFeatureProvider, AudioFeatureSnapshot, FeatureTimeline, FeatureValue, TimedSnapshot,
};
pub use crate::input::background::{
    BackgroundSource, ImageSequenceSource, SolidColorSource, StillImageSource,
};
pub use crate::input::glyph::{BlockGlyphRasterizer, FontSpec, GlyphRasterizer, Stroke};
pub use crate::input::lyrics::{LyricLine, LyricProvider, LyricSheet, LyricWord};
pub use crate::render::background::{BackgroundConfig, BackgroundMode};
pub use crate::render::frame::{BlendMode, Frame, Layer, PixelFormat};
pub use crate::render::pool::FramePoolStats;
pub use crate::render::reactive::{EnergyTier, ReactiveConfig};
pub use crate::session::config::RenderConfig;
pub use crate::session::frame_loop::{FrameStream, FrameSynthesisLoop};
pub use crate::session::render_session::{RenderSession, RenderSessionBuilder};
pub use crate::text::layout::{HorizontalAlign, TextStyle, VerticalPosition};
pub use crate::text::renderer::AnimationConfig;
