use crate::foundation::core::{Fps, FrameIndex, Resolution};
use crate::foundation::error::CadenceResult;
use crate::render::frame::Frame;
use crate::session::render_session::RenderSession;

/// Finite, in-order sequence of output frames that can be replayed from the start.
pub trait FrameStream {
    fn resolution(&self) -> Resolution;
    fn fps(&self) -> Fps;
    fn total_frames(&self) -> u64;
    /// Next frame in order, or `None` once every frame has been produced.
    fn next_frame(&mut self) -> Option<CadenceResult<(FrameIndex, Frame)>>;
    /// Return a consumed frame so its buffer can be reused.
    fn recycle(&mut self, frame: Frame);
    /// Go back to frame 0 with all cross-frame state reset.
    fn restart(&mut self) -> CadenceResult<()>;
}

/// Per-frame driver over a [`RenderSession`], yielding frames `0..total_frames`.
///
/// Every frame is produced; background failures are healed inside the session. A frame error
/// ends the sequence.
#[derive(Debug)]
pub struct FrameSynthesisLoop<'s> {
    session: &'s mut RenderSession,
    next: u64,
    failed: bool,
}

impl<'s> FrameSynthesisLoop<'s> {
    pub(crate) fn new(session: &'s mut RenderSession) -> Self {
        Self {
            session,
            next: 0,
            failed: false,
        }
    }

    /// Index of the next frame to be produced.
    pub fn position(&self) -> FrameIndex {
        FrameIndex(self.next)
    }

    pub fn session(&self) -> &RenderSession {
        self.session
    }
}

impl FrameStream for FrameSynthesisLoop<'_> {
    fn resolution(&self) -> Resolution {
        self.session.resolution()
    }

    fn fps(&self) -> Fps {
        self.session.fps()
    }

    fn total_frames(&self) -> u64 {
        self.session.total_frames()
    }

    fn next_frame(&mut self) -> Option<CadenceResult<(FrameIndex, Frame)>> {
        if self.failed || self.next >= self.session.total_frames() {
            return None;
        }
        let idx = FrameIndex(self.next);
        self.next += 1;
        match self.session.synthesize(idx) {
            Ok(frame) => Some(Ok((idx, frame))),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    fn recycle(&mut self, frame: Frame) {
        self.session.recycle(frame);
    }

    fn restart(&mut self) -> CadenceResult<()> {
        tracing::debug!(at = self.next, "restarting frame sequence");
        self.session.reset();
        self.next = 0;
        self.failed = false;
        Ok(())
    }
}

impl Iterator for FrameSynthesisLoop<'_> {
    type Item = CadenceResult<(FrameIndex, Frame)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = self.session.total_frames().saturating_sub(self.next);
        let left = usize::try_from(left).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/frame_loop.rs"]
mod tests;
