use crate::effects::blur::gaussian_blur;
use crate::foundation::error::CadenceResult;
use crate::render::frame::Frame;

/// Separable max filter over a single-channel buffer.
pub fn dilate(mask: &[u8], width: u32, height: u32, radius: u32) -> Vec<u8> {
    if radius == 0 || width == 0 || height == 0 {
        return mask.to_vec();
    }
    let (w, h, r) = (width as usize, height as usize, radius as usize);

    let mut tmp = vec![0u8; mask.len()];
    for y in 0..h {
        let row = &mask[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            tmp[y * w + x] = row[lo..=hi].iter().copied().max().unwrap_or(0);
        }
    }

    let mut out = vec![0u8; mask.len()];
    for x in 0..w {
        for y in 0..h {
            let lo = y.saturating_sub(r);
            let hi = (y + r).min(h - 1);
            out[y * w + x] = (lo..=hi).map(|yy| tmp[yy * w + x]).max().unwrap_or(0);
        }
    }
    out
}

/// Soft spatial mask derived from a layer's alpha: dilate by `spread`, then blur by `softness`.
pub fn spatial_mask(layer: &Frame, spread: u32, softness: u32) -> CadenceResult<Vec<u8>> {
    let alpha = layer.alpha_mask();
    let grown = dilate(&alpha.data, layer.width, layer.height, spread);
    if softness == 0 {
        return Ok(grown);
    }
    let sigma = (softness as f32 / 2.0).max(0.5);
    gaussian_blur(&grown, layer.width, layer.height, 1, softness, sigma)
}

/// Intensity-weighted centroid of a mask, or the buffer center when it is empty.
pub fn centroid(mask: &[u8], width: u32, height: u32) -> (f32, f32) {
    let (mut sx, mut sy, mut sw) = (0f64, 0f64, 0f64);
    for (i, &m) in mask.iter().enumerate() {
        if m == 0 {
            continue;
        }
        let w = f64::from(m);
        sx += (i % width as usize) as f64 * w;
        sy += (i / width as usize) as f64 * w;
        sw += w;
    }
    if sw == 0.0 {
        return (width as f32 / 2.0, height as f32 / 2.0);
    }
    ((sx / sw) as f32, (sy / sw) as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/mask.rs"]
mod tests;
