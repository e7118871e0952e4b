use crate::foundation::core::Resolution;
use crate::foundation::error::{CadenceError, CadenceResult};
use crate::render::frame::{Frame, PixelFormat, byte_len};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FramePoolStats {
    pub retained: usize,
    pub checked_out: usize,
    pub alloc_frames: u64,
    pub reused_frames: u64,
    pub dropped_on_release: u64,
}

/// Bounded pool of session-sized frame buffers.
///
/// A buffer is either retained here or owned by exactly one caller. Ownership moves out on
/// [`FrameBufferPool::checkout`] and back on [`FrameBufferPool::release`]; released buffers are
/// zero-filled before they can be handed out again.
#[derive(Debug)]
pub struct FrameBufferPool {
    resolution: Resolution,
    capacity: usize,
    rgb: Vec<Frame>,
    rgba: Vec<Frame>,
    stats: FramePoolStats,
}

impl FrameBufferPool {
    /// Pre-allocate `capacity` RGB buffers at `resolution`.
    ///
    /// Failure to reserve the initial buffers is fatal for a session.
    pub fn new(resolution: Resolution, capacity: usize) -> CadenceResult<Self> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(CadenceError::allocation(
                "frame pool resolution must be non-zero",
            ));
        }
        let capacity = capacity.max(1);
        let mut rgb = Vec::new();
        rgb.try_reserve_exact(capacity)
            .map_err(|e| CadenceError::allocation(format!("frame pool slots: {e}")))?;
        for _ in 0..capacity {
            rgb.push(Frame::try_new(resolution, PixelFormat::Rgb8)?);
        }

        Ok(Self {
            resolution,
            capacity,
            rgb,
            rgba: Vec::new(),
            stats: FramePoolStats {
                retained: capacity,
                alloc_frames: capacity as u64,
                ..FramePoolStats::default()
            },
        })
    }

    #[cfg(test)]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn stats(&self) -> FramePoolStats {
        self.stats.clone()
    }

    /// Take ownership of a zeroed buffer in `format`.
    pub fn checkout(&mut self, format: PixelFormat) -> CadenceResult<Frame> {
        if format == PixelFormat::Gray8 {
            return Err(CadenceError::validation(
                "frame pool only serves RGB/RGBA buffers",
            ));
        }
        self.stats.checked_out = self.stats.checked_out.saturating_add(1);
        let bucket = self.bucket_mut(format);
        if let Some(frame) = bucket.pop() {
            self.stats.retained = self.stats.retained.saturating_sub(1);
            self.stats.reused_frames = self.stats.reused_frames.saturating_add(1);
            return Ok(frame);
        }

        self.stats.alloc_frames = self.stats.alloc_frames.saturating_add(1);
        Frame::try_new(self.resolution, format)
    }

    /// Return a buffer. Foreign-sized buffers and buffers beyond capacity are dropped.
    pub fn release(&mut self, mut frame: Frame) {
        self.stats.checked_out = self.stats.checked_out.saturating_sub(1);

        if frame.width != self.resolution.width
            || frame.height != self.resolution.height
            || frame.format == PixelFormat::Gray8
            || frame.data.len() != byte_len(frame.width, frame.height, frame.format)
            || self.stats.retained >= self.capacity
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        frame.data.fill(0);
        let format = frame.format;
        self.bucket_mut(format).push(frame);
        self.stats.retained = self.stats.retained.saturating_add(1);
    }

    fn bucket_mut(&mut self, format: PixelFormat) -> &mut Vec<Frame> {
        match format {
            PixelFormat::Rgba8 => &mut self.rgba,
            PixelFormat::Rgb8 | PixelFormat::Gray8 => &mut self.rgb,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
