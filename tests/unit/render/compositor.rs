use super::*;
use crate::foundation::core::Resolution;
use crate::input::background::SolidColorSource;
use crate::render::background::{BackgroundConfig, BackgroundMode};

fn compositor(mode: BackgroundMode) -> Compositor {
    let res = Resolution::new(8, 6).unwrap();
    let pool = FrameBufferPool::new(res, 2).unwrap();
    let bg = BackgroundManager::new(mode, res, BackgroundConfig::default()).unwrap();
    Compositor::new(pool, bg, ReactiveConfig::default())
}

#[test]
fn audio_only_base_is_fill_and_motion_free() {
    let mut c = compositor(BackgroundMode::None);
    let base = c.prepare_base(0.0).unwrap();
    assert_eq!(base.frame.format, PixelFormat::Rgb8);
    assert!(base.frame.data.iter().all(|&v| v == 0));
    assert_eq!(base.motion, MotionSample::default());
    assert!(c.history().is_empty());
}

#[test]
fn output_buffers_come_from_the_pool() {
    let mut c = compositor(BackgroundMode::None);
    let a = c.prepare_base(0.0).unwrap();
    c.recycle(a.frame);
    let b = c.prepare_base(0.1).unwrap();
    let stats = c.pool_stats();
    assert_eq!(stats.reused_frames, 2);
    assert_eq!(stats.alloc_frames, 2);
    assert_eq!(stats.checked_out, 1);
    c.recycle(b.frame);
}

#[test]
fn motion_history_tracks_frames_and_resets() {
    let source = SolidColorSource::new(8, 6, [30, 60, 90]);
    let mut c = compositor(BackgroundMode::Single(Box::new(source)));
    for i in 0..3 {
        let base = c.prepare_base(f64::from(i) / 30.0).unwrap();
        assert_eq!(base.frame.pixel(4, 3), &[30, 60, 90]);
        c.recycle(base.frame);
    }
    assert_eq!(c.history().len(), 3);
    c.reset();
    assert!(c.history().is_empty());
    assert_eq!(c.clip_state().cursors, vec![0.0]);
}

#[test]
fn composite_and_finish_run_in_order() {
    let mut c = compositor(BackgroundMode::None);
    let mut base = c.prepare_base(0.0).unwrap().frame;
    let layer = Layer::new(Frame::filled_rgba(2, 2, [255, 255, 255, 255]), (3, 2));
    assert_eq!(c.composite(&mut base, &[layer]), 1);
    assert_eq!(base.pixel(3, 2), &[255, 255, 255]);

    let quiet = AudioFeatureSnapshot::default();
    assert_eq!(c.finish(&mut base, &quiet).unwrap(), EnergyTier::Low);
}
