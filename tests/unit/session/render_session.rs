use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::input::audio::{FeatureTimeline, TimedSnapshot};
use crate::input::glyph::BlockGlyphRasterizer;
use crate::input::lyrics::{LyricSheet, LyricWord};
use crate::text::layout::{SAFE_BOTTOM_MARGIN, SAFE_TOP_MARGIN};

fn word(text: &str, start: f64, end: f64) -> LyricWord {
    LyricWord {
        text: text.to_string(),
        start,
        end,
    }
}

fn config() -> RenderConfig {
    let mut cfg = RenderConfig::default();
    cfg.resolution = Resolution::new(160, 120).unwrap();
    cfg.fps = Fps::new(10, 1).unwrap();
    cfg.padding_secs = 0.5;
    cfg.text.font_size = 16.0;
    cfg.pool_capacity = 2;
    cfg
}

fn sheet() -> LyricSheet {
    LyricSheet::new(vec![
        LyricLine::from_words(vec![word("hi", 0.2, 0.5), word("there", 0.5, 0.9)]).unwrap(),
        LyricLine {
            start: 0.9,
            end: 1.2,
            words: vec![],
        },
        LyricLine::from_words(vec![word("late", 5.0, 6.0)]).unwrap(),
    ])
}

fn session() -> RenderSession {
    RenderSession::builder()
        .config(config())
        .audio(FeatureTimeline::new(1.0, vec![], vec![]).unwrap())
        .lyrics(sheet())
        .rasterizer(BlockGlyphRasterizer)
        .build()
        .unwrap()
}

#[test]
fn missing_collaborators_are_fatal() {
    let err = RenderSession::builder()
        .config(config())
        .lyrics(sheet())
        .rasterizer(BlockGlyphRasterizer)
        .build()
        .unwrap_err();
    assert!(matches!(err, CadenceError::MissingInput(_)));
    assert!(err.is_fatal());

    let err = RenderSession::builder()
        .config(config())
        .audio(FeatureTimeline::default())
        .rasterizer(BlockGlyphRasterizer)
        .build()
        .unwrap_err();
    assert!(matches!(err, CadenceError::MissingInput(_)));

    let err = RenderSession::builder()
        .config(config())
        .audio(FeatureTimeline::default())
        .lyrics(sheet())
        .build()
        .unwrap_err();
    assert!(matches!(err, CadenceError::MissingInput(_)));
}

#[test]
fn invalid_config_is_rejected_before_anything_else() {
    let mut cfg = config();
    cfg.resolution = Resolution {
        width: 161,
        height: 120,
    };
    let err = RenderSession::builder().config(cfg).build().unwrap_err();
    assert!(matches!(err, CadenceError::Validation(_)));
}

#[test]
fn frame_count_covers_audio_plus_padding() {
    let s = session();
    assert_eq!(s.total_frames(), 15);
    assert_eq!(s.resolution(), Resolution::new(160, 120).unwrap());
}

#[test]
fn lines_are_filtered_at_setup() {
    let s = session();
    assert_eq!(s.lines().len(), 1);
    assert_eq!(s.lines()[0].text(), "hi there");
}

#[test]
fn frames_past_the_end_are_rejected() {
    let mut s = session();
    let err = s.render_frame(FrameIndex(15)).unwrap_err();
    assert!(matches!(err, CadenceError::Validation(_)));
}

#[test]
fn text_is_drawn_only_while_a_line_is_active() {
    let mut s = session();

    let silent = s.render_frame(FrameIndex(0)).unwrap();
    assert_eq!(silent.format, crate::render::frame::PixelFormat::Rgb8);
    assert!(silent.data.iter().all(|&v| v == 0));
    s.recycle(silent);

    let sung = s.render_frame(FrameIndex(7)).unwrap();
    assert!(sung.data.iter().any(|&v| v > 0));
    s.recycle(sung);

    let after = s.render_frame(FrameIndex(12)).unwrap();
    assert!(after.data.iter().all(|&v| v == 0));
}

#[test]
fn preview_frames_do_not_depend_on_history() {
    let mut s = session();
    let a = s.render_frame(FrameIndex(6)).unwrap();
    let _ = s.render_frame(FrameIndex(3)).unwrap();
    let b = s.render_frame(FrameIndex(6)).unwrap();
    assert_eq!(a, b);
}

struct RecordingSource(Rc<RefCell<Vec<f64>>>);

impl BackgroundSource for RecordingSource {
    fn frame_at(&mut self, t: f64) -> CadenceResult<Option<Frame>> {
        self.0.borrow_mut().push(t);
        Ok(Some(Frame::filled_rgb(8, 8, [10, 20, 30])))
    }
}

#[test]
fn preview_frames_show_the_background_at_their_own_time() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut cfg = config();
    cfg.fps = Fps::new(30, 1).unwrap();
    let mut s = RenderSession::builder()
        .config(cfg)
        .audio(FeatureTimeline::new(6.0, vec![], vec![]).unwrap())
        .lyrics(sheet())
        .rasterizer(BlockGlyphRasterizer)
        .background(BackgroundMode::Single(Box::new(RecordingSource(Rc::clone(&seen)))))
        .build()
        .unwrap();

    let frame = s.render_frame(FrameIndex(150)).unwrap();
    s.recycle(frame);
    assert_eq!(*seen.borrow(), vec![5.0]);
}

fn lit_rows(frame: &Frame) -> Vec<u32> {
    (0..frame.height)
        .filter(|&y| (0..frame.width).any(|x| frame.pixel(x, y).iter().any(|&v| v > 0)))
        .collect()
}

#[test]
fn beat_impact_never_pushes_text_out_of_the_safe_band() {
    let mut cfg = RenderConfig::default();
    cfg.resolution = Resolution::new(640, 480).unwrap();
    cfg.fps = Fps::new(10, 1).unwrap();
    cfg.padding_secs = 0.0;
    cfg.effects.ambient_glow = false;
    cfg.effects.dynamic_color = false;
    cfg.effects.radial_lighting = false;
    cfg.reactive.color_shift = false;
    cfg.reactive.glow = false;
    cfg.reactive.chromatic_aberration = false;
    cfg.reactive.flash = 0.0;
    cfg.reactive.zoom_punch = 0.2;

    let loud = AudioFeatureSnapshot {
        rms_energy: 0.95,
        on_beat: true,
        ..AudioFeatureSnapshot::default()
    };
    let audio = FeatureTimeline::new(
        2.0,
        vec![1.0],
        vec![TimedSnapshot {
            time: 0.0,
            features: loud,
        }],
    )
    .unwrap();
    let mut s = RenderSession::builder()
        .config(cfg)
        .audio(audio)
        .lyrics(LyricSheet::new(vec![
            LyricLine::from_words(vec![word("gypsy", 0.0, 2.0)]).unwrap(),
        ]))
        .rasterizer(BlockGlyphRasterizer)
        .build()
        .unwrap();

    let frame = s.render_frame(FrameIndex(10)).unwrap();
    let rows = lit_rows(&frame);
    assert!(!rows.is_empty());
    assert!(rows[0] >= SAFE_TOP_MARGIN);
    assert!(*rows.last().unwrap() < 480 - SAFE_BOTTOM_MARGIN);
    s.recycle(frame);
}
