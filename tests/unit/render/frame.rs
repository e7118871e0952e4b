use super::*;

#[test]
fn from_raw_validates_length() {
    assert!(Frame::from_raw(2, 2, PixelFormat::Rgb8, vec![0; 12]).is_ok());
    assert!(Frame::from_raw(2, 2, PixelFormat::Rgba8, vec![0; 12]).is_err());
}

#[test]
fn alpha_mask_reads_alpha_channel() {
    let mut f = Frame::filled_rgba(2, 1, [10, 20, 30, 0]);
    f.data[7] = 200;
    let m = f.alpha_mask();
    assert_eq!(m.format, PixelFormat::Gray8);
    assert_eq!(m.data, vec![0, 200]);
}

#[test]
fn rgb_to_rgba_is_opaque() {
    let f = Frame::filled_rgb(1, 2, [1, 2, 3]).into_rgba();
    assert_eq!(f.format, PixelFormat::Rgba8);
    assert_eq!(f.data, vec![1, 2, 3, 255, 1, 2, 3, 255]);
}

#[test]
fn pixel_offsets_are_row_major() {
    let mut f = Frame::new(3, 2, PixelFormat::Rgb8);
    let o = f.offset(2, 1);
    f.data[o] = 9;
    assert_eq!(f.pixel(2, 1), &[9, 0, 0]);
    assert_eq!(f.stride(), 9);
}
