use super::*;
use crate::foundation::error::CadenceError;
use crate::input::audio::FeatureTimeline;
use crate::input::glyph::BlockGlyphRasterizer;
use crate::input::lyrics::{LyricLine, LyricSheet, LyricWord};
use crate::session::config::RenderConfig;

fn session(duration: f64) -> RenderSession {
    let mut cfg = RenderConfig::default();
    cfg.resolution = Resolution::new(96, 64).unwrap();
    cfg.fps = Fps::new(8, 1).unwrap();
    cfg.padding_secs = 0.25;
    cfg.text.font_size = 12.0;
    cfg.pool_capacity = 2;
    let line = LyricLine::from_words(vec![LyricWord {
        text: "la".to_string(),
        start: 0.25,
        end: 0.75,
    }])
    .unwrap();
    RenderSession::builder()
        .config(cfg)
        .audio(FeatureTimeline::new(duration, vec![0.5], vec![]).unwrap())
        .lyrics(LyricSheet::new(vec![line]))
        .rasterizer(BlockGlyphRasterizer)
        .build()
        .unwrap()
}

fn collect(stream: &mut dyn FrameStream) -> Vec<(FrameIndex, Frame)> {
    let mut out = Vec::new();
    while let Some(next) = stream.next_frame() {
        let (idx, frame) = next.unwrap();
        out.push((idx, frame.clone()));
        stream.recycle(frame);
    }
    out
}

#[test]
fn yields_every_frame_in_order() {
    let mut s = session(1.0);
    let mut frames = s.frames();
    assert_eq!(frames.total_frames(), 10);
    assert_eq!(frames.size_hint(), (10, Some(10)));
    let got = collect(&mut frames);
    let idx: Vec<u64> = got.iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..10).collect::<Vec<_>>());
    assert!(frames.next_frame().is_none());
    assert!(got.iter().all(|(_, f)| f.width == 96 && f.height == 64));
}

#[test]
fn restart_replays_identical_frames() {
    let mut s = session(1.0);
    let mut frames = s.frames();
    let first = collect(&mut frames);
    frames.restart().unwrap();
    assert_eq!(frames.position(), FrameIndex(0));
    let second = collect(&mut frames);
    assert_eq!(first, second);
}

#[test]
fn recycled_buffers_keep_the_pool_bounded() {
    let mut s = session(1.0);
    {
        let mut frames = s.frames();
        let _ = collect(&mut frames);
    }
    let stats = s.pool_stats();
    assert_eq!(stats.alloc_frames, 2);
    assert_eq!(stats.checked_out, 0);
}

#[test]
fn iterator_matches_stream() {
    let mut s = session(0.5);
    let count = s.frames().map(|r| r.map(|(i, _)| i)).collect::<Result<Vec<_>, CadenceError>>();
    assert_eq!(count.unwrap().len(), 6);
}
