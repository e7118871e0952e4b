use rayon::prelude::*;

use crate::foundation::error::{CadenceError, CadenceResult};

/// Separable gaussian blur over an interleaved 8-bit buffer with `channels` channels.
///
/// Edges clamp. Weights are Q16 fixed point so results are identical across platforms and
/// thread counts.
pub fn gaussian_blur(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    radius: u32,
    sigma: f32,
) -> CadenceResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| CadenceError::evaluation("blur buffer size overflow"))?;
    if src.len() != expected_len || channels == 0 {
        return Err(CadenceError::evaluation(
            "gaussian_blur expects src matching width*height*channels",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, channels, &kernel);
    vertical_pass(&tmp, &mut out, width, height, channels, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CadenceResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CadenceError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(CadenceError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, channels: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let stride = width as usize * channels;
    dst.par_chunks_exact_mut(stride)
        .zip(src.par_chunks_exact(stride))
        .for_each(|(drow, srow)| {
            let mut acc = vec![0u64; channels];
            for x in 0..w {
                acc.fill(0);
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1) as usize;
                    for c in 0..channels {
                        acc[c] += u64::from(kw) * u64::from(srow[sx * channels + c]);
                    }
                }
                let o = x as usize * channels;
                for c in 0..channels {
                    drow[o + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, channels: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let h = height as i32;
    let stride = width as usize * channels;
    dst.par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, drow)| {
            let mut acc = vec![0u64; stride];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y as i32 + ki as i32 - radius).clamp(0, h - 1) as usize;
                let srow = &src[sy * stride..(sy + 1) * stride];
                for (a, &s) in acc.iter_mut().zip(srow) {
                    *a += u64::from(kw) * u64::from(s);
                }
            }
            for (d, a) in drow.iter_mut().zip(acc) {
                *d = q16_to_u8(a);
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
