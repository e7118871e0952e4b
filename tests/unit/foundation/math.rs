use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
}

#[test]
fn to_u8_clamps_and_handles_nan() {
    assert_eq!(to_u8(-3.0), 0);
    assert_eq!(to_u8(300.0), 255);
    assert_eq!(to_u8(f32::NAN), 0);
    assert_eq!(to_u8(127.6), 128);
}

#[test]
fn hsv_roundtrip_primary_colors() {
    for (r, g, b) in [(1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0), (0.5, 0.25, 0.75)] {
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r2, g2, b2) = hsv_to_rgb(h, s, v);
        assert!((r - r2).abs() < 1e-5);
        assert!((g - g2).abs() < 1e-5);
        assert!((b - b2).abs() < 1e-5);
    }
}
