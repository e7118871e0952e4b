use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
    }
}

#[test]
fn in_memory_sink_records_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    let f = Frame::filled_rgb(2, 2, [1, 2, 3]);
    sink.push_frame(FrameIndex(0), &f).unwrap();
    sink.push_frame(FrameIndex(1), &f).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &f).is_err());
    sink.end().unwrap();
    assert_eq!(sink.frames().len(), 2);
    assert!(sink.is_finished());
    assert_eq!(sink.config(), Some(&cfg()));
}

#[test]
fn in_memory_sink_requires_begin() {
    let mut sink = InMemorySink::new();
    let f = Frame::filled_rgb(2, 2, [0, 0, 0]);
    assert!(sink.push_frame(FrameIndex(0), &f).is_err());
}

#[test]
fn begin_resets_previous_attempt() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &Frame::filled_rgb(2, 2, [0, 0, 0]))
        .unwrap();
    sink.abort();
    assert!(sink.is_aborted());
    sink.begin(cfg()).unwrap();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_aborted());
}

#[test]
fn rgba_is_flattened_over_black() {
    let src = Frame::from_raw(2, 1, PixelFormat::Rgba8, vec![200, 100, 50, 255, 200, 100, 50, 0])
        .unwrap();
    let mut dst = Frame::new(2, 1, PixelFormat::Rgb8);
    flatten_to_rgb(&src, &mut dst).unwrap();
    assert_eq!(dst.data, vec![200, 100, 50, 0, 0, 0]);

    let half = Frame::filled_rgba(1, 1, [200, 100, 50, 128]);
    let mut dst = Frame::new(1, 1, PixelFormat::Rgb8);
    flatten_to_rgb(&half, &mut dst).unwrap();
    assert_eq!(dst.data, vec![100, 50, 25]);
}

#[test]
fn rgb_is_copied_and_mismatches_rejected() {
    let src = Frame::filled_rgb(2, 2, [9, 8, 7]);
    let mut dst = Frame::new(2, 2, PixelFormat::Rgb8);
    flatten_to_rgb(&src, &mut dst).unwrap();
    assert_eq!(dst, src);

    let mut wrong = Frame::new(3, 2, PixelFormat::Rgb8);
    assert!(flatten_to_rgb(&src, &mut wrong).is_err());
}
