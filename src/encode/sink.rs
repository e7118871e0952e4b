use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::frame::{Frame, PixelFormat};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Consumer of encoded-ready RGB frames in timeline order.
///
/// `push_frame` is called in strictly increasing [`FrameIndex`] order. Either `end` or `abort`
/// is called exactly once after a successful `begin`; both must release any external process or
/// pipe the sink holds.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> CadenceResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> CadenceResult<()>;
    fn end(&mut self) -> CadenceResult<()>;
    /// Tear down after a failure or cancellation. Output is left in an unspecified state.
    fn abort(&mut self) {}
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Frame)>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> CadenceResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> CadenceResult<()> {
        if self.cfg.is_none() {
            return Err(CadenceError::evaluation("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(CadenceError::evaluation(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> CadenceResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

/// Normalize `frame` to opaque RGB in `dst`, flattening straight alpha over black.
pub fn flatten_to_rgb(frame: &Frame, dst: &mut Frame) -> CadenceResult<()> {
    if dst.format != PixelFormat::Rgb8 || dst.width != frame.width || dst.height != frame.height {
        return Err(CadenceError::validation(
            "flatten target must be an RGB frame of the same size",
        ));
    }
    match frame.format {
        PixelFormat::Rgb8 => dst.data.copy_from_slice(&frame.data),
        PixelFormat::Rgba8 => {
            for (d, s) in dst.data.chunks_exact_mut(3).zip(frame.data.chunks_exact(4)) {
                let a = u16::from(s[3]);
                for i in 0..3 {
                    d[i] = mul_div255_u8(u16::from(s[i]), a);
                }
            }
        }
        PixelFormat::Gray8 => {
            return Err(CadenceError::validation(
                "cannot encode a single-channel frame",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
