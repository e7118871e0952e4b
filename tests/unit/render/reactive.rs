use super::*;

fn features(energy: f32, on_beat: bool) -> AudioFeatureSnapshot {
    AudioFeatureSnapshot {
        rms_energy: energy,
        on_beat,
        ..Default::default()
    }
}

#[test]
fn tiers_follow_thresholds() {
    let cfg = ReactiveConfig::default();
    assert_eq!(EnergyTier::classify(0.2, &cfg), EnergyTier::Low);
    assert_eq!(EnergyTier::classify(0.4, &cfg), EnergyTier::Low);
    assert_eq!(EnergyTier::classify(0.5, &cfg), EnergyTier::Medium);
    assert_eq!(EnergyTier::classify(0.7, &cfg), EnergyTier::High);
    assert_eq!(EnergyTier::classify(0.81, &cfg), EnergyTier::Intense);
    assert!(EnergyTier::Intense > EnergyTier::High);
}

#[test]
fn low_energy_leaves_frame_untouched() {
    let mut f = Frame::filled_rgb(8, 8, [200, 100, 50]);
    let before = f.clone();
    let tier = apply_reactive(&mut f, &features(0.1, true), &ReactiveConfig::default()).unwrap();
    assert_eq!(tier, EnergyTier::Low);
    assert_eq!(f, before);
}

#[test]
fn disabled_config_reports_tier_but_does_nothing() {
    let mut f = Frame::filled_rgb(8, 8, [200, 100, 50]);
    let before = f.clone();
    let cfg = ReactiveConfig {
        enabled: false,
        ..Default::default()
    };
    let tier = apply_reactive(&mut f, &features(0.95, true), &cfg).unwrap();
    assert_eq!(tier, EnergyTier::Intense);
    assert_eq!(f, before);
}

#[test]
fn medium_tier_saturates() {
    let mut f = Frame::filled_rgb(4, 4, [200, 100, 50]);
    apply_reactive(&mut f, &features(0.5, false), &ReactiveConfig::default()).unwrap();
    let px = f.pixel(1, 1);
    assert_eq!(px[0], 200);
    assert!(px[2] < 50);
}

#[test]
fn beat_impact_flashes_on_beats_only() {
    let cfg = ReactiveConfig {
        color_shift: false,
        glow: false,
        chromatic_aberration: false,
        ..Default::default()
    };
    let mut off = Frame::filled_rgb(6, 6, [40, 40, 40]);
    apply_reactive(&mut off, &features(0.7, false), &cfg).unwrap();
    assert_eq!(off.pixel(3, 3), &[40, 40, 40]);

    let mut on = Frame::filled_rgb(6, 6, [40, 40, 40]);
    apply_reactive(&mut on, &features(0.7, true), &cfg).unwrap();
    assert!(on.pixel(3, 3)[0] > 40);
}

#[test]
fn bloom_brightens_around_highlights() {
    let cfg = ReactiveConfig {
        color_shift: false,
        chromatic_aberration: false,
        beat_impact: false,
        ..Default::default()
    };
    let mut f = Frame::filled_rgb(24, 24, [0, 0, 0]);
    for y in 10..14 {
        for x in 10..14 {
            let o = f.offset(x, y);
            f.data[o..o + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    apply_reactive(&mut f, &features(0.9, false), &cfg).unwrap();
    assert!(f.pixel(8, 12)[0] > 0);
    assert_eq!(f.pixel(0, 0), &[0, 0, 0]);
}

fn bottom_stripe() -> Frame {
    let mut f = Frame::filled_rgb(8, 8, [0, 0, 0]);
    for x in 0..8 {
        let o = f.offset(x, 7);
        f.data[o..o + 3].copy_from_slice(&[255, 255, 255]);
    }
    f
}

fn zoom_only() -> ReactiveConfig {
    ReactiveConfig {
        color_shift: false,
        glow: false,
        chromatic_aberration: false,
        flash: 0.0,
        zoom_punch: 1.0,
        ..Default::default()
    }
}

#[test]
fn frame_effects_keep_pixels_in_place_on_beats() {
    let mut f = bottom_stripe();
    let before = f.clone();
    let tier = apply_reactive(&mut f, &features(0.95, true), &zoom_only()).unwrap();
    assert_eq!(tier, EnergyTier::Intense);
    assert_eq!(f, before);
}

#[test]
fn zoom_punch_hits_the_background_on_loud_beats_only() {
    let cfg = zoom_only();
    for quiet in [features(0.5, true), features(0.95, false)] {
        let mut f = bottom_stripe();
        assert!(!punch_background(&mut f, &quiet, &cfg));
        assert_eq!(f, bottom_stripe());
    }

    let mut f = bottom_stripe();
    assert!(punch_background(&mut f, &features(0.95, true), &cfg));
    // doubled about the center, the edge row now samples row 5
    assert_eq!(f.pixel(3, 7), &[0, 0, 0]);
}
