use super::*;

fn snap(rms: f32) -> AudioFeatureSnapshot {
    AudioFeatureSnapshot {
        rms_energy: rms,
        ..AudioFeatureSnapshot::default()
    }
}

fn timeline() -> FeatureTimeline {
    FeatureTimeline::new(
        4.0,
        vec![1.0, 2.0],
        vec![
            TimedSnapshot {
                time: 0.0,
                features: snap(0.1),
            },
            TimedSnapshot {
                time: 1.0,
                features: snap(0.5),
            },
            TimedSnapshot {
                time: 3.0,
                features: snap(0.9),
            },
        ],
    )
    .unwrap()
}

#[test]
fn lookup_is_nearest_previous() {
    let tl = timeline();
    assert_eq!(tl.features_at(0.5).rms_energy, 0.1);
    assert_eq!(tl.features_at(1.0).rms_energy, 0.5);
    assert_eq!(tl.features_at(2.9).rms_energy, 0.5);
    assert_eq!(tl.features_at(10.0).rms_energy, 0.9);
    assert_eq!(tl.features_at(-1.0).rms_energy, 0.1);
}

#[test]
fn beats_mark_snapshots() {
    let tl = timeline();
    assert!(tl.features_at(1.02).on_beat);
    assert!(tl.features_at(1.98).on_beat);
    assert!(!tl.features_at(1.5).on_beat);
}

#[test]
fn unsorted_beats_are_rejected() {
    assert!(FeatureTimeline::new(1.0, vec![0.5, 0.2], Vec::new()).is_err());
    assert!(FeatureTimeline::new(f64::NAN, Vec::new(), Vec::new()).is_err());
}

#[test]
fn named_lookup_covers_typed_and_extra_features() {
    let mut s = snap(0.25);
    s.on_beat = true;
    s.extra.insert("vocal_presence".to_string(), 0.7);
    assert_eq!(s.get("rms_energy"), Some(FeatureValue::Float(0.25)));
    assert_eq!(s.get("on_beat"), Some(FeatureValue::Bool(true)));
    assert_eq!(s.get("vocal_presence"), Some(FeatureValue::Float(0.7)));
    assert_eq!(s.get("missing"), None);
}

#[test]
fn energy_is_clamped() {
    assert_eq!(snap(3.0).energy(), 1.0);
    assert_eq!(snap(f32::NAN).energy(), 0.0);
}

#[test]
fn timeline_deserializes_flattened_samples() {
    let json = serde_json::json!({
        "duration": 2.0,
        "beat_times": [0.5],
        "samples": [{ "time": 0.0, "rms_energy": 0.4, "on_beat": false }]
    });
    let tl: FeatureTimeline = serde_json::from_value(json).unwrap();
    assert_eq!(tl.features_at(0.1).rms_energy, 0.4);
}
