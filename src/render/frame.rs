use crate::foundation::core::Resolution;
use crate::foundation::error::{CadenceError, CadenceResult};

/// Channel layout of a [`Frame`]. All formats are 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single-channel coverage/mask buffer.
    Gray8,
    /// Opaque RGB.
    Rgb8,
    /// RGB with straight (non-premultiplied) alpha.
    Rgba8,
}

impl PixelFormat {
    /// Number of interleaved channels.
    pub fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Row-major, tightly packed 8-bit pixel buffer.
///
/// A frame has exactly one owner at a time; stages take it by value, mutate, and hand it on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Channel layout of `data`.
    pub format: PixelFormat,
    /// `width * height * channels` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Allocate a zero-filled frame.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = byte_len(width, height, format);
        Self {
            width,
            height,
            format,
            data: vec![0u8; len],
        }
    }

    /// Allocate a zero-filled frame sized to `res`, reporting allocation failure instead of
    /// aborting.
    pub fn try_new(res: Resolution, format: PixelFormat) -> CadenceResult<Self> {
        let len = byte_len(res.width, res.height, format);
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            CadenceError::allocation(format!(
                "cannot reserve {len} bytes for a {}x{} frame: {e}",
                res.width, res.height
            ))
        })?;
        data.resize(len, 0);
        Ok(Self {
            width: res.width,
            height: res.height,
            format,
            data,
        })
    }

    /// Wrap existing bytes, validating their length.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> CadenceResult<Self> {
        if data.len() != byte_len(width, height, format) {
            return Err(CadenceError::validation(format!(
                "frame data length {} does not match {}x{}x{}",
                data.len(),
                width,
                height,
                format.channels()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Frame filled with a single RGBA color.
    pub fn filled_rgba(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut f = Self::new(width, height, PixelFormat::Rgba8);
        for px in f.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        f
    }

    /// Frame filled with a single RGB color.
    pub fn filled_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut f = Self::new(width, height, PixelFormat::Rgb8);
        for px in f.data.chunks_exact_mut(3) {
            px.copy_from_slice(&rgb);
        }
        f
    }

    /// Channel count of this frame.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Byte length of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Dimensions as a [`Resolution`].
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels()
    }

    /// Borrow the channels of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let o = self.offset(x, y);
        &self.data[o..o + self.channels()]
    }

    /// Extract the alpha channel as a `Gray8` frame. Non-alpha formats yield full coverage.
    pub fn alpha_mask(&self) -> Frame {
        let mut mask = Frame::new(self.width, self.height, PixelFormat::Gray8);
        match self.format {
            PixelFormat::Rgba8 => {
                for (m, px) in mask.data.iter_mut().zip(self.data.chunks_exact(4)) {
                    *m = px[3];
                }
            }
            PixelFormat::Gray8 => mask.data.copy_from_slice(&self.data),
            PixelFormat::Rgb8 => mask.data.fill(255),
        }
        mask
    }

    /// Convert to RGBA8. RGB gains opaque alpha; gray is replicated.
    pub fn into_rgba(self) -> Frame {
        match self.format {
            PixelFormat::Rgba8 => self,
            PixelFormat::Rgb8 => {
                let mut out = Vec::with_capacity(self.data.len() / 3 * 4);
                for px in self.data.chunks_exact(3) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                Frame {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Rgba8,
                    data: out,
                }
            }
            PixelFormat::Gray8 => {
                let mut out = Vec::with_capacity(self.data.len() * 4);
                for &v in &self.data {
                    out.extend_from_slice(&[v, v, v, 255]);
                }
                Frame {
                    width: self.width,
                    height: self.height,
                    format: PixelFormat::Rgba8,
                    data: out,
                }
            }
        }
    }
}

pub(crate) fn byte_len(width: u32, height: u32, format: PixelFormat) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(format.channels())
}

/// Compositing mode for a [`Layer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Straight-alpha "over".
    #[default]
    Normal,
    /// Additive light, scaled by layer alpha.
    Add,
    /// Darken by multiplication, scaled by layer alpha.
    Multiply,
}

/// A positioned, partially transparent image to be blended onto a frame.
#[derive(Clone, Debug)]
pub struct Layer {
    /// Layer pixels, normally RGBA.
    pub image: Frame,
    /// Top-left offset on the base frame; may be negative.
    pub position: (i32, i32),
    /// Global opacity in `[0, 1]`.
    pub opacity: f32,
    /// Blend mode.
    pub blend: BlendMode,
}

impl Layer {
    /// Normal-blended layer at full opacity.
    pub fn new(image: Frame, position: (i32, i32)) -> Self {
        Self {
            image,
            position,
            opacity: 1.0,
            blend: BlendMode::Normal,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
