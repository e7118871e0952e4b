use super::*;

fn noise(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    (h >> 24) as u8
}

fn textured(w: u32, h: u32, shift_x: u32) -> Frame {
    let mut f = Frame::new(w, h, PixelFormat::Rgb8);
    for y in 0..h {
        for x in 0..w {
            let v = noise(x.saturating_sub(shift_x), y);
            let o = f.offset(x, y);
            f.data[o..o + 3].copy_from_slice(&[v, v, v]);
        }
    }
    f
}

#[test]
fn history_is_bounded_and_smoothed() {
    let mut history = MotionHistory::default();
    for i in 0..15 {
        history.push(MotionSample {
            magnitude: i as f32,
            dx: 1.0,
            dy: -1.0,
        });
    }
    assert_eq!(history.len(), MOTION_HISTORY_LEN);
    let s = history.smoothed();
    // samples 5..15 remain
    assert!((s.magnitude - 9.5).abs() < 1e-5);
    assert_eq!((s.dx, s.dy), (1.0, -1.0));
    history.clear();
    assert_eq!(history.smoothed(), MotionSample::default());
}

#[test]
fn first_and_static_frames_have_no_motion() {
    let mut est = MotionEstimator::default();
    let f = textured(160, 90, 0);
    assert_eq!(est.estimate(&f), MotionSample::default());
    assert_eq!(est.estimate(&f), MotionSample::default());
}

#[test]
fn horizontal_shift_is_tracked() {
    let mut est = MotionEstimator::default();
    est.estimate(&textured(160, 90, 0));
    let s = est.estimate(&textured(160, 90, 2));
    assert!((s.dx - 2.0).abs() < 1e-4, "{s:?}");
    assert!(s.dy.abs() < 1e-4, "{s:?}");
    assert!((s.magnitude - 2.0).abs() < 1e-4);
}

#[test]
fn reset_forgets_previous_frame() {
    let mut est = MotionEstimator::default();
    est.estimate(&textured(160, 90, 0));
    est.reset();
    assert_eq!(est.estimate(&textured(160, 90, 3)), MotionSample::default());
}

#[test]
fn flat_frames_yield_zero_motion() {
    let mut est = MotionEstimator::default();
    est.estimate(&Frame::filled_rgb(64, 64, [40, 40, 40]));
    assert_eq!(
        est.estimate(&Frame::filled_rgb(64, 64, [40, 40, 40])),
        MotionSample::default()
    );
}

#[test]
fn enhancement_is_a_no_op_without_motion() {
    let mut f = textured(32, 16, 0);
    let before = f.clone();
    enhance_background(&mut f, MotionSample::default(), 1.0);
    assert_eq!(f, before);
}

#[test]
fn strong_motion_enhances_background() {
    let mut f = Frame::filled_rgb(32, 16, [200, 100, 50]);
    let strong = MotionSample {
        magnitude: MOTION_FULL_SCALE_PX,
        dx: MOTION_FULL_SCALE_PX,
        dy: 0.0,
    };
    enhance_background(&mut f, strong, 1.0);
    let px = f.pixel(5, 5);
    // more saturated: red stays pinned, blue drops
    assert!(px[2] < 50);
    assert!(px[0] >= 200);
}
