use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{CadenceError, CadenceResult};
use crate::render::frame::{Frame, PixelFormat};

/// Source of background video frames.
///
/// Implementations loop internally: any non-negative timestamp maps to a frame. `Ok(None)` means
/// "no frame for this timestamp"; the compositor substitutes black for both `None` and errors.
pub trait BackgroundSource {
    /// RGB frame at `t` seconds of this source's own timeline.
    fn frame_at(&mut self, t: f64) -> CadenceResult<Option<Frame>>;
}

/// Uniform color background.
#[derive(Clone, Debug)]
pub struct SolidColorSource {
    frame: Frame,
}

impl SolidColorSource {
    pub fn new(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self {
            frame: Frame::filled_rgb(width, height, rgb),
        }
    }
}

impl BackgroundSource for SolidColorSource {
    fn frame_at(&mut self, _t: f64) -> CadenceResult<Option<Frame>> {
        Ok(Some(self.frame.clone()))
    }
}

/// Single decoded image shown for the whole timeline.
#[derive(Clone, Debug)]
pub struct StillImageSource {
    frame: Frame,
}

impl StillImageSource {
    pub fn open(path: &Path) -> CadenceResult<Self> {
        Ok(Self {
            frame: decode_rgb(path)?,
        })
    }
}

impl BackgroundSource for StillImageSource {
    fn frame_at(&mut self, _t: f64) -> CadenceResult<Option<Frame>> {
        Ok(Some(self.frame.clone()))
    }
}

/// Numbered image files played back at a fixed rate and looped.
///
/// Frames are decoded on demand; the most recently decoded frame is kept so that output rates
/// above the sequence rate do not decode twice.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    fps: f64,
    last: Option<(usize, Frame)>,
}

impl ImageSequenceSource {
    pub fn new(paths: Vec<PathBuf>, fps: f64) -> CadenceResult<Self> {
        if paths.is_empty() {
            return Err(CadenceError::validation("image sequence must not be empty"));
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(CadenceError::validation("image sequence fps must be > 0"));
        }
        Ok(Self {
            paths,
            fps,
            last: None,
        })
    }

    /// Collect every `png`/`jpg`/`jpeg` file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path, fps: f64) -> CadenceResult<Self> {
        let mut paths = Vec::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read background directory '{}'", dir.display()))?;
        for entry in entries {
            let path = entry.context("read background directory entry")?.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            if matches!(ext.as_deref(), Some("png" | "jpg" | "jpeg")) {
                paths.push(path);
            }
        }
        paths.sort();
        Self::new(paths, fps)
    }

    /// Looped frame index for `t`.
    pub fn index_at(&self, t: f64) -> usize {
        let i = (t.max(0.0) * self.fps).floor() as usize;
        i % self.paths.len()
    }
}

impl BackgroundSource for ImageSequenceSource {
    fn frame_at(&mut self, t: f64) -> CadenceResult<Option<Frame>> {
        let idx = self.index_at(t);
        if let Some((cached, frame)) = self.last.as_ref()
            && *cached == idx
        {
            return Ok(Some(frame.clone()));
        }
        let frame = decode_rgb(&self.paths[idx])?;
        self.last = Some((idx, frame.clone()));
        Ok(Some(frame))
    }
}

fn decode_rgb(path: &Path) -> CadenceResult<Frame> {
    let img = image::open(path)
        .with_context(|| format!("decode background image '{}'", path.display()))?
        .to_rgb8();
    let (w, h) = img.dimensions();
    Frame::from_raw(w, h, PixelFormat::Rgb8, img.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/input/background.rs"]
mod tests;
