use super::*;

fn hd() -> Resolution {
    Resolution {
        width: 1280,
        height: 720,
    }
}

fn style(align: HorizontalAlign, vertical: VerticalPosition) -> TextStyle {
    TextStyle {
        align,
        vertical,
        margin_left: 100,
        margin_right: 80,
        word_spacing: 20,
        ..TextStyle::default()
    }
}

#[test]
fn width_includes_spacing() {
    assert_eq!(line_width(&[(100, 10), (50, 10), (30, 10)], 20), 220);
    assert_eq!(line_width(&[(100, 10)], 20), 100);
    assert_eq!(line_width(&[], 20), 0);
}

#[test]
fn overflowing_lines_start_at_left_margin() {
    for align in [
        HorizontalAlign::Left,
        HorizontalAlign::Center,
        HorizontalAlign::Right,
    ] {
        let s = style(align, VerticalPosition::Bottom);
        let available = 1280 - 100 - 80;
        for w in [available + 1, available + 500, 5000] {
            let x = horizontal_origin(w, hd(), &s);
            assert_eq!(x, 100);
            assert_eq!(horizontal_origin(w, hd(), &s), x);
        }
    }
}

#[test]
fn fitting_lines_are_aligned() {
    let c = horizontal_origin(100, hd(), &style(HorizontalAlign::Center, VerticalPosition::Top));
    assert_eq!(c, 100 + (1100 - 100) / 2);
    let l = horizontal_origin(100, hd(), &style(HorizontalAlign::Left, VerticalPosition::Top));
    assert_eq!(l, 100);
    let r = horizontal_origin(100, hd(), &style(HorizontalAlign::Right, VerticalPosition::Top));
    assert_eq!(r, 1280 - 80 - 100);
}

#[test]
fn text_within_band_stays_between_nominal_margins() {
    let nominal = 720 - SAFE_TOP_MARGIN - SAFE_BOTTOM_MARGIN;
    for vertical in [
        VerticalPosition::Top,
        VerticalPosition::Center,
        VerticalPosition::Bottom,
    ] {
        for h in [1, 40, 200, nominal] {
            let (y, band) = vertical_origin(h, hd(), vertical);
            assert_eq!(band.top, SAFE_TOP_MARGIN);
            assert_eq!(band.bottom, SAFE_BOTTOM_MARGIN);
            assert!(y >= SAFE_TOP_MARGIN as i32, "{vertical:?} h={h}");
            assert!(y <= (720 - SAFE_BOTTOM_MARGIN - h) as i32, "{vertical:?} h={h}");
        }
    }
}

#[test]
fn oversized_text_shrinks_top_margin_first() {
    let nominal = 720 - SAFE_TOP_MARGIN - SAFE_BOTTOM_MARGIN;
    let h = nominal + 30;
    let band = safe_band(h, hd());
    assert_eq!(band.top, SAFE_TOP_MARGIN - 30);
    assert_eq!(band.bottom, SAFE_BOTTOM_MARGIN);

    let (y, band) = vertical_origin(h, hd(), VerticalPosition::Bottom);
    assert!(y >= band.top as i32);
    assert!(y <= (720 - band.bottom - h) as i32);
}

#[test]
fn bottom_margin_never_drops_below_floor() {
    let h = 720 - MIN_BOTTOM_MARGIN - 5;
    let band = safe_band(h, hd());
    assert_eq!(band.top, 0);
    assert!(band.bottom >= MIN_BOTTOM_MARGIN);
    let (y, band) = vertical_origin(h, hd(), VerticalPosition::Center);
    assert!(y >= band.top as i32);
    assert!(y + h as i32 <= (720 - band.bottom) as i32);

    let huge = safe_band(10_000, hd());
    assert_eq!(huge.bottom, MIN_BOTTOM_MARGIN);
}

#[test]
fn words_are_laid_out_left_to_right() {
    let s = style(HorizontalAlign::Left, VerticalPosition::Top);
    let layout = layout_line(&[(100, 50), (60, 40)], &s, hd());
    assert_eq!(layout.total_width, 180);
    assert_eq!(layout.height, 50);
    assert_eq!(layout.words[0].x, 100);
    assert_eq!(layout.words[1].x, 220);
    assert_eq!(layout.words[0].y, SAFE_TOP_MARGIN as i32);
    assert_eq!(layout.words[1].y, SAFE_TOP_MARGIN as i32 + 5);
}
