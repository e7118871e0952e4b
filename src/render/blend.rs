use crate::foundation::math::to_u8;
use crate::render::frame::{BlendMode, Frame, Layer};

/// Blend `layer` onto `base`, clipped to the base bounds.
///
/// Colors are straight alpha. The effective layer alpha is `alpha / 255 * opacity` for RGBA
/// layers and `opacity` for RGB layers. Returns `false` when the channel combination is not
/// supported and the layer was skipped.
pub fn composite_layer(base: &mut Frame, layer: &Layer) -> bool {
    let lc = layer.image.channels();
    let bc = base.channels();
    if !matches!(lc, 3 | 4) || !matches!(bc, 3 | 4) {
        tracing::warn!(
            layer_channels = lc,
            base_channels = bc,
            "skipping layer with unsupported channel combination"
        );
        return false;
    }

    let opacity = if layer.opacity.is_finite() {
        layer.opacity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if opacity <= 0.0 {
        return true;
    }

    let (lx, ly) = (i64::from(layer.position.0), i64::from(layer.position.1));
    let x0 = lx.max(0);
    let y0 = ly.max(0);
    let x1 = (lx + i64::from(layer.image.width)).min(i64::from(base.width));
    let y1 = (ly + i64::from(layer.image.height)).min(i64::from(base.height));
    if x0 >= x1 || y0 >= y1 {
        return true;
    }

    let src_stride = layer.image.stride();
    let dst_stride = base.stride();
    for y in y0..y1 {
        let sy = (y - ly) as usize;
        let src_row = &layer.image.data[sy * src_stride..(sy + 1) * src_stride];
        let dst_row = &mut base.data[y as usize * dst_stride..(y as usize + 1) * dst_stride];
        for x in x0..x1 {
            let so = (x - lx) as usize * lc;
            let d = x as usize * bc;
            blend_pixel(
                &mut dst_row[d..d + bc],
                &src_row[so..so + lc],
                opacity,
                layer.blend,
            );
        }
    }
    true
}

/// Blend every layer in order; returns how many were composited.
pub fn composite_all(base: &mut Frame, layers: &[Layer]) -> usize {
    layers
        .iter()
        .filter(|layer| composite_layer(base, layer))
        .count()
}

fn blend_pixel(dst: &mut [u8], src: &[u8], opacity: f32, mode: BlendMode) {
    let a = match src.get(3) {
        Some(&alpha) => f32::from(alpha) / 255.0 * opacity,
        None => opacity,
    };
    if a <= 0.0 {
        return;
    }
    let inv = 1.0 - a;

    match dst.len() {
        4 => {
            let da = f32::from(dst[3]) / 255.0;
            let under = da * inv;
            let out_a = a + under;
            for i in 0..3 {
                let fg = mix(f32::from(src[i]), f32::from(dst[i]), mode);
                dst[i] = to_u8((fg * a + f32::from(dst[i]) * under) / out_a);
            }
            dst[3] = to_u8(out_a * 255.0);
        }
        _ => {
            for i in 0..3 {
                let bg = f32::from(dst[i]);
                let fg = mix(f32::from(src[i]), bg, mode);
                dst[i] = to_u8(a * fg + inv * bg);
            }
        }
    }
}

/// Layer color after the blend mode, before alpha weighting.
fn mix(fg: f32, bg: f32, mode: BlendMode) -> f32 {
    match mode {
        BlendMode::Normal => fg,
        BlendMode::Add => (fg + bg).min(255.0),
        BlendMode::Multiply => fg * bg / 255.0,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
