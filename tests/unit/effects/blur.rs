use super::*;

#[test]
fn radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6];
    let out = gaussian_blur(&src, 1, 2, 3, 0, 1.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn constant_image_is_identity() {
    let (w, h) = (4u32, 3u32);
    let px = [10u8, 20, 30, 40];
    let src = px.repeat((w * h) as usize);
    let out = gaussian_blur(&src, w, h, 4, 3, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn single_pixel_spreads_and_conserves_energy() {
    let (w, h) = (7u32, 7u32);
    let mut src = vec![0u8; (w * h) as usize];
    src[(3 * w + 3) as usize] = 255;

    let out = gaussian_blur(&src, w, h, 1, 2, 1.2).unwrap();

    assert!(out.iter().filter(|&&v| v != 0).count() > 1);
    let sum: i32 = out.iter().map(|&v| i32::from(v)).sum();
    assert!((sum - 255).abs() <= 16, "sum={sum}");
    assert!(out[(3 * w + 3) as usize] < 255);
}

#[test]
fn mismatched_length_is_rejected() {
    assert!(gaussian_blur(&[0u8; 5], 2, 2, 1, 1, 1.0).is_err());
}

#[test]
fn invalid_sigma_is_rejected() {
    let src = vec![0u8; 4];
    assert!(gaussian_blur(&src, 2, 2, 1, 1, 0.0).is_err());
    assert!(gaussian_blur(&src, 2, 2, 1, 1, f32::NAN).is_err());
}

#[test]
fn output_is_deterministic() {
    let src: Vec<u8> = (0..(16 * 9 * 3)).map(|i| (i * 37 % 251) as u8).collect();
    let a = gaussian_blur(&src, 16, 9, 3, 4, 2.5).unwrap();
    let b = gaussian_blur(&src, 16, 9, 3, 4, 2.5).unwrap();
    assert_eq!(a, b);
}
