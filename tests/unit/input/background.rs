use super::*;

#[test]
fn solid_source_always_yields_a_frame() {
    let mut src = SolidColorSource::new(4, 2, [9, 8, 7]);
    let f = src.frame_at(123.0).unwrap().unwrap();
    assert_eq!(f.format, PixelFormat::Rgb8);
    assert_eq!(f.pixel(3, 1), &[9, 8, 7]);
}

#[test]
fn image_sequence_loops() {
    let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
    let src = ImageSequenceSource::new(paths, 10.0).unwrap();
    assert_eq!(src.index_at(0.0), 0);
    assert_eq!(src.index_at(0.1), 1);
    assert_eq!(src.index_at(0.2), 0);
    assert_eq!(src.index_at(-1.0), 0);
}

#[test]
fn image_sequence_reports_decode_failures() {
    let mut src = ImageSequenceSource::new(vec![PathBuf::from("/nonexistent/x.png")], 1.0).unwrap();
    assert!(src.frame_at(0.0).is_err());
}

#[test]
fn image_sequence_decodes_real_files() {
    let dir = std::env::temp_dir().join(format!("cadence_bg_seq_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let img = image::RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
    img.save(dir.join("000.png")).unwrap();

    let mut src = ImageSequenceSource::from_dir(&dir, 24.0).unwrap();
    let f = src.frame_at(5.0).unwrap().unwrap();
    assert_eq!((f.width, f.height), (3, 2));
    assert_eq!(f.pixel(0, 0), &[1, 2, 3]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_sequence_is_invalid() {
    assert!(ImageSequenceSource::new(Vec::new(), 1.0).is_err());
    assert!(ImageSequenceSource::new(vec![PathBuf::from("a.png")], 0.0).is_err());
}
