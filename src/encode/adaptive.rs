use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::encode::ffmpeg::{FfmpegMuxer, FfmpegSink, FfmpegSinkOpts};
use crate::encode::probe::EncoderRecommendation;
use crate::encode::sink::{FrameSink, SinkConfig, flatten_to_rgb};
use crate::foundation::error::{CadenceError, CadenceResult, EncodeStage};
use crate::render::frame::{Frame, PixelFormat};
use crate::session::frame_loop::FrameStream;

/// Encoding behavior of a render session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Try the probed hardware encoder before software.
    pub allow_hardware: bool,
    /// Stall limit for the hardware encoder; software runs without one.
    pub hardware_timeout_secs: f64,
    /// Log progress every N frames.
    pub progress_every: u64,
    pub crf: u8,
    pub preset: String,
    pub audio_bitrate: String,
    pub overwrite: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            allow_hardware: true,
            hardware_timeout_secs: 10.0,
            progress_every: 100,
            crf: 18,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            overwrite: true,
        }
    }
}

/// Creates the sink used for one encoding attempt.
pub trait SinkFactory {
    fn make_sink(
        &mut self,
        rec: &EncoderRecommendation,
        path: &Path,
    ) -> CadenceResult<Box<dyn FrameSink>>;
}

/// Combines the silent video with the song.
pub trait Muxer {
    fn mux(&mut self, video: &Path, audio: &Path, out: &Path) -> CadenceResult<()>;
}

/// Spawns an [`FfmpegSink`] per attempt.
#[derive(Clone, Debug)]
pub struct FfmpegSinkFactory {
    pub overwrite: bool,
    pub hardware_timeout: Option<Duration>,
}

impl FfmpegSinkFactory {
    pub fn from_config(cfg: &EncodeConfig) -> Self {
        let timeout = (cfg.hardware_timeout_secs.is_finite() && cfg.hardware_timeout_secs > 0.0)
            .then(|| Duration::from_secs_f64(cfg.hardware_timeout_secs));
        Self {
            overwrite: cfg.overwrite,
            hardware_timeout: timeout,
        }
    }
}

impl SinkFactory for FfmpegSinkFactory {
    fn make_sink(
        &mut self,
        rec: &EncoderRecommendation,
        path: &Path,
    ) -> CadenceResult<Box<dyn FrameSink>> {
        let mut opts = FfmpegSinkOpts::new(path, rec.clone());
        opts.overwrite = self.overwrite;
        opts.timeout = if rec.accelerated {
            self.hardware_timeout
        } else {
            None
        };
        Ok(Box::new(FfmpegSink::new(opts)))
    }
}

/// Shared flag a caller flips to stop an in-flight encode.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of a finished encode.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeReport {
    /// Encoder that produced the output.
    pub encoder: String,
    pub accelerated: bool,
    /// Why the hardware attempt was abandoned, if it was.
    pub fallback_reason: Option<String>,
    pub frames_written: u64,
    pub output: PathBuf,
}

/// Drives a [`FrameStream`] into an encoder, falling back from hardware to software once.
pub struct AdaptiveEncoder {
    config: EncodeConfig,
    factory: Box<dyn SinkFactory>,
    muxer: Box<dyn Muxer>,
    cancel: CancelToken,
}

impl std::fmt::Debug for AdaptiveEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveEncoder")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl AdaptiveEncoder {
    pub fn new(config: EncodeConfig, factory: Box<dyn SinkFactory>, muxer: Box<dyn Muxer>) -> Self {
        Self {
            config,
            factory,
            muxer,
            cancel: CancelToken::new(),
        }
    }

    /// Encoder writing through the system `ffmpeg`.
    pub fn ffmpeg(config: EncodeConfig) -> Self {
        let factory = FfmpegSinkFactory::from_config(&config);
        let muxer = FfmpegMuxer {
            audio_bitrate: config.audio_bitrate.clone(),
            overwrite: config.overwrite,
        };
        Self::new(config, Box::new(factory), Box::new(muxer))
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Encode every frame of `stream` into `output`, muxing `audio` in when given.
    ///
    /// The hardware encoder is tried first when `rec` is accelerated and hardware is allowed.
    /// Any encoder-stage failure there triggers one restart of the stream into the software
    /// encoder. Frame synthesis errors and cancellation are never retried.
    #[tracing::instrument(skip_all, fields(encoder = %rec.encoder, output = %output.display()))]
    pub fn encode(
        &mut self,
        stream: &mut dyn FrameStream,
        rec: &EncoderRecommendation,
        audio: Option<&Path>,
        output: &Path,
    ) -> CadenceResult<EncodeReport> {
        let video_path = match audio {
            Some(_) => silent_path(output),
            None => output.to_path_buf(),
        };
        let preexisting = video_path.exists();

        let mut hardware_failure = None;
        let mut used = None;
        let mut frames_written = 0;

        if rec.accelerated && self.config.allow_hardware {
            match self.run_attempt(stream, rec, &video_path) {
                Ok(n) => {
                    used = Some(rec.clone());
                    frames_written = n;
                }
                Err(err @ CadenceError::Encode { .. }) => {
                    tracing::warn!(error = %err, "hardware encoding failed, falling back to software");
                    hardware_failure = Some(err.to_string());
                    discard_partial(&video_path, preexisting);
                    stream.restart()?;
                }
                Err(err) => return Err(err),
            }
        }

        let used = match used {
            Some(rec) => rec,
            None => {
                let software = EncoderRecommendation::software(self.config.crf, &self.config.preset);
                match self.run_attempt(stream, &software, &video_path) {
                    Ok(n) => {
                        frames_written = n;
                        software
                    }
                    Err(err @ CadenceError::Encode { .. }) => {
                        return Err(CadenceError::EncoderExhausted {
                            hardware: hardware_failure,
                            software: err.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        if let Some(audio) = audio {
            let muxed = self.muxer.mux(&video_path, audio, output);
            if let Err(err) = std::fs::remove_file(&video_path) {
                tracing::debug!(path = %video_path.display(), error = %err, "could not remove silent video");
            }
            muxed?;
        }

        tracing::info!(
            encoder = %used.encoder,
            accelerated = used.accelerated,
            frames = frames_written,
            "encode finished"
        );
        Ok(EncodeReport {
            encoder: used.encoder,
            accelerated: used.accelerated,
            fallback_reason: hardware_failure,
            frames_written,
            output: output.to_path_buf(),
        })
    }

    fn run_attempt(
        &mut self,
        stream: &mut dyn FrameStream,
        rec: &EncoderRecommendation,
        path: &Path,
    ) -> CadenceResult<u64> {
        let stage = if rec.accelerated {
            EncodeStage::Hardware
        } else {
            EncodeStage::Software
        };
        let as_encode = |err: CadenceError| match err {
            CadenceError::Encode { .. } => err,
            other => CadenceError::encode(stage, other.to_string()),
        };

        let res = stream.resolution();
        let mut sink = self.factory.make_sink(rec, path).map_err(as_encode)?;
        sink.begin(SinkConfig {
            width: res.width,
            height: res.height,
            fps: stream.fps(),
        })
        .map_err(as_encode)?;

        let total = stream.total_frames();
        let mut scratch = Frame::new(res.width, res.height, PixelFormat::Rgb8);
        let mut written = 0u64;
        while let Some(next) = stream.next_frame() {
            if self.cancel.is_cancelled() {
                if let Ok((_, frame)) = next {
                    stream.recycle(frame);
                }
                sink.abort();
                tracing::info!(written, "encode cancelled");
                return Err(CadenceError::Cancelled);
            }
            let (idx, frame) = match next {
                Ok(v) => v,
                Err(err) => {
                    sink.abort();
                    return Err(err);
                }
            };

            let pushed = match frame.format {
                PixelFormat::Rgb8 => sink.push_frame(idx, &frame),
                _ => flatten_to_rgb(&frame, &mut scratch).and_then(|()| sink.push_frame(idx, &scratch)),
            };
            stream.recycle(frame);
            if let Err(err) = pushed {
                sink.abort();
                return Err(as_encode(err));
            }

            written += 1;
            if self.config.progress_every > 0 && written.is_multiple_of(self.config.progress_every) {
                tracing::info!(written, total, encoder = %rec.encoder, "encoding");
            }
        }

        sink.end().map_err(as_encode)?;
        Ok(written)
    }
}

/// Remove what a failed attempt left at `path`. A file that existed before the encode is kept.
fn discard_partial(path: &Path, preexisting: bool) {
    if preexisting || !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial hardware output"),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not remove partial hardware output")
        }
    }
}

/// Temporary video-only output next to `output`.
fn silent_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}.silent.mp4"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/adaptive.rs"]
mod tests;
