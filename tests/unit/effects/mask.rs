use super::*;
use crate::render::frame::Frame;

fn dot_layer(w: u32, h: u32, x: u32, y: u32) -> Frame {
    let mut f = Frame::filled_rgba(w, h, [255, 255, 255, 0]);
    let o = f.offset(x, y);
    f.data[o + 3] = 255;
    f
}

#[test]
fn dilate_grows_by_radius() {
    let mut mask = vec![0u8; 25];
    mask[12] = 200;
    let out = dilate(&mask, 5, 5, 1);
    let lit = out.iter().filter(|&&v| v == 200).count();
    assert_eq!(lit, 9);
    assert_eq!(out[0], 0);
}

#[test]
fn dilate_radius_0_is_identity() {
    let mask = vec![0u8, 9, 0, 3];
    assert_eq!(dilate(&mask, 2, 2, 0), mask);
}

#[test]
fn spatial_mask_without_softness_is_the_dilated_alpha() {
    let layer = dot_layer(9, 9, 4, 4);
    let m = spatial_mask(&layer, 2, 0).unwrap();
    assert_eq!(m.iter().filter(|&&v| v == 255).count(), 25);
}

#[test]
fn spatial_mask_softness_feathers_the_edge() {
    let layer = dot_layer(21, 21, 10, 10);
    let hard = spatial_mask(&layer, 2, 0).unwrap();
    let soft = spatial_mask(&layer, 2, 4).unwrap();
    let partial = soft.iter().filter(|&&v| v > 0 && v < 255).count();
    assert!(partial > 0);
    // the feathered mask reaches further than the hard one
    let reach = |m: &[u8]| m.iter().filter(|&&v| v > 0).count();
    assert!(reach(&soft) > reach(&hard));
}

#[test]
fn centroid_of_single_pixel() {
    let mut mask = vec![0u8; 20];
    mask[3 * 5 + 1] = 255;
    assert_eq!(centroid(&mask, 5, 4), (1.0, 3.0));
}

#[test]
fn centroid_of_empty_mask_is_center() {
    let mask = vec![0u8; 12];
    assert_eq!(centroid(&mask, 4, 3), (2.0, 1.5));
}
