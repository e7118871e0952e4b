use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, RecvTimeoutError, SyncSender};
use std::time::{Duration, Instant};

use crate::encode::adaptive::Muxer;
use crate::encode::probe::EncoderRecommendation;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CadenceError, CadenceResult, EncodeStage};
use crate::render::frame::{Frame, PixelFormat};

/// Options for [`FfmpegSink`] silent MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Encoder and quality settings.
    pub recommendation: EncoderRecommendation,
    /// Upper bound on a single frame write and on the final flush. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>, recommendation: EncoderRecommendation) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            recommendation,
            timeout: None,
        }
    }
}

type WriteAck = std::io::Result<Vec<u8>>;

/// Sink that spawns the system `ffmpeg` and streams raw RGB frames to its stdin.
///
/// Writes happen on a helper thread so a stalled encoder surfaces as a timeout instead of a hang.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    frames_tx: Option<SyncSender<Vec<u8>>>,
    acks_rx: Option<Receiver<WriteAck>>,
    writer: Option<std::thread::JoinHandle<()>>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            frames_tx: None,
            acks_rx: None,
            writer: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn stage(&self) -> EncodeStage {
        if self.opts.recommendation.accelerated {
            EncodeStage::Hardware
        } else {
            EncodeStage::Software
        }
    }

    fn fail(&self, msg: impl Into<String>) -> CadenceError {
        CadenceError::encode(self.stage(), msg)
    }

    /// Full ffmpeg argument list for `cfg`.
    pub fn command_args(&self, cfg: &SinkConfig) -> Vec<String> {
        let mut args: Vec<String> = vec![
            (if self.opts.overwrite { "-y" } else { "-n" }).into(),
            "-loglevel".into(),
            "error".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "rgb24".into(),
            "-s".into(),
            format!("{}x{}", cfg.width, cfg.height),
            // rawvideo input rate goes before `-i`
            "-r".into(),
            format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i".into(),
            "pipe:0".into(),
            "-an".into(),
        ];
        args.extend(self.opts.recommendation.codec_args());
        args.extend(["-movflags".into(), "+faststart".into()]);
        args.push(self.opts.out_path.to_string_lossy().into_owned());
        args
    }

    fn kill_child(&mut self) {
        self.frames_tx = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
        if let Some(drain) = self.stderr_drain.take() {
            let _ = drain.join();
        }
        self.acks_rx = None;
        self.cfg = None;
    }

    fn stderr_text(&mut self) -> String {
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            _ => String::new(),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> CadenceResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(CadenceError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(CadenceError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(CadenceError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(CadenceError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let mut child = Command::new("ffmpeg")
            .args(self.command_args(&cfg))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                self.fail(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.fail("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| self.fail("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (frames_tx, frames_rx) = std::sync::mpsc::sync_channel::<Vec<u8>>(1);
        let (acks_tx, acks_rx) = std::sync::mpsc::channel::<WriteAck>();
        let writer = std::thread::spawn(move || {
            for buf in frames_rx {
                let res = stdin.write_all(&buf).map(|()| buf);
                let failed = res.is_err();
                if acks_tx.send(res).is_err() || failed {
                    break;
                }
            }
        });

        tracing::debug!(
            encoder = %self.opts.recommendation.encoder,
            out = %self.opts.out_path.display(),
            "spawned ffmpeg"
        );

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 3];
        self.child = Some(child);
        self.frames_tx = Some(frames_tx);
        self.acks_rx = Some(acks_rx);
        self.writer = Some(writer);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> CadenceResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CadenceError::evaluation("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(CadenceError::evaluation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.format != PixelFormat::Rgb8 {
            return Err(CadenceError::validation("ffmpeg sink expects RGB frames"));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(CadenceError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        let mut buf = std::mem::take(&mut self.scratch);
        buf.clear();
        buf.extend_from_slice(&frame.data);

        let sent = self.frames_tx.as_ref().map(|tx| tx.send(buf).is_ok());
        if sent != Some(true) {
            let stderr = self.stderr_text();
            self.kill_child();
            return Err(self.fail(format!("ffmpeg stopped accepting frames: {stderr}")));
        }

        let Some(acks) = self.acks_rx.as_ref() else {
            return Err(CadenceError::evaluation("ffmpeg sink is already finalized"));
        };
        let ack = match self.opts.timeout {
            Some(timeout) => acks.recv_timeout(timeout),
            None => acks.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match ack {
            Ok(Ok(buf)) => {
                self.scratch = buf;
                Ok(())
            }
            Ok(Err(e)) => {
                let stderr = self.stderr_text();
                self.kill_child();
                Err(self.fail(format!("failed to write frame {} to ffmpeg: {e}: {stderr}", idx.0)))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.kill_child();
                Err(self.fail(format!("ffmpeg stalled on frame {}", idx.0)))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let stderr = self.stderr_text();
                self.kill_child();
                Err(self.fail(format!("ffmpeg writer exited early: {stderr}")))
            }
        }
    }

    fn end(&mut self) -> CadenceResult<()> {
        drop(self.frames_tx.take());
        if let Some(writer) = self.writer.take() {
            writer
                .join()
                .map_err(|_| CadenceError::evaluation("ffmpeg writer thread panicked"))?;
        }
        let mut child = self
            .child
            .take()
            .ok_or_else(|| CadenceError::evaluation("ffmpeg sink not started"))?;

        let deadline = self.opts.timeout.map(|t| Instant::now() + t);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => return Err(self.fail(format!("failed to wait for ffmpeg to finish: {e}"))),
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                let _ = child.kill();
                let _ = child.wait();
                self.kill_child();
                return Err(self.fail("ffmpeg did not finish within the timeout"));
            }
            std::thread::sleep(Duration::from_millis(20));
        };

        let stderr = self.stderr_text();
        self.acks_rx = None;
        self.cfg = None;
        if !status.success() {
            return Err(self.fail(format!("ffmpeg exited with status {status}: {stderr}")));
        }
        Ok(())
    }

    fn abort(&mut self) {
        if self.child.is_some() {
            tracing::debug!(out = %self.opts.out_path.display(), "aborting ffmpeg");
        }
        self.kill_child();
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill_child();
        }
    }
}

/// Combines a silent video with an audio track using stream copy for video.
#[derive(Clone, Debug)]
pub struct FfmpegMuxer {
    pub audio_bitrate: String,
    pub overwrite: bool,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self {
            audio_bitrate: "192k".to_string(),
            overwrite: true,
        }
    }
}

impl FfmpegMuxer {
    pub fn command_args(&self, video: &Path, audio: &Path, out: &Path) -> Vec<String> {
        vec![
            (if self.overwrite { "-y" } else { "-n" }).into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            video.to_string_lossy().into_owned(),
            "-i".into(),
            audio.to_string_lossy().into_owned(),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.audio_bitrate.clone(),
            "-shortest".into(),
            "-movflags".into(),
            "+faststart".into(),
            out.to_string_lossy().into_owned(),
        ]
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&mut self, video: &Path, audio: &Path, out: &Path) -> CadenceResult<()> {
        ensure_parent_dir(out)?;
        let output = Command::new("ffmpeg")
            .args(self.command_args(video, audio, out))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CadenceError::encode(EncodeStage::Mux, format!("failed to spawn ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(CadenceError::encode(
                EncodeStage::Mux,
                format!(
                    "ffmpeg exited with status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CadenceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
