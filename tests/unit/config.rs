use super::*;

#[test]
fn defaults_validate() {
    RunConfig::default().validate().unwrap();
}

#[test]
fn rejects_non_finite_and_out_of_range_values() {
    let mut cfg = RunConfig {
        target_duration_sec: f64::NAN,
        ..RunConfig::default()
    };
    assert!(cfg.validate().is_err());

    cfg.target_duration_sec = 0.0;
    assert!(cfg.validate().is_err());

    cfg.target_duration_sec = 10.0;
    cfg.clip = ClipBounds {
        min_pct: 60.0,
        max_pct: 40.0,
    };
    assert!(cfg.validate().is_err());

    cfg.clip = ClipBounds {
        min_pct: 0.0,
        max_pct: 0.0,
    };
    assert!(cfg.validate().is_err());

    cfg.clip = ClipBounds {
        min_pct: 10.0,
        max_pct: 101.0,
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_bad_effects_and_output() {
    let mut cfg = RunConfig::default();
    cfg.effects.min_zoom = 90.0;
    assert!(cfg.validate().is_err());

    cfg.effects.min_zoom = 160.0;
    cfg.effects.max_zoom = 150.0;
    assert!(cfg.validate().is_err());

    cfg.effects = EffectParameters::default();
    cfg.effects.flip_probability = f64::INFINITY;
    assert!(cfg.validate().is_err());

    cfg.effects = EffectParameters::default();
    cfg.output.width = 0;
    assert!(cfg.validate().is_err());

    cfg.output = OutputSettings::default();
    cfg.output.fps = Fps { num: 30, den: 0 };
    assert!(cfg.validate().is_err());

    cfg.output = OutputSettings::default();
    cfg.slots = 1;
    assert!(cfg.validate().is_err());

    cfg.slots = 4;
    cfg.overlap_sec = -1.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn json_missing_fields_take_defaults() {
    let cfg: RunConfig = serde_json::from_str(
        r#"{
            "target_duration_sec": 12.5,
            "clip": { "max_pct": 80 },
            "effects": { "zoom_probability": 100, "min_zoom": 150, "max_zoom": 150 },
            "dissolve": "blend",
            "seed": 7
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.target_duration_sec, 12.5);
    assert_eq!(cfg.clip.min_pct, ClipBounds::default().min_pct);
    assert_eq!(cfg.clip.max_pct, 80.0);
    assert_eq!(cfg.effects.flip_probability, 20.0);
    assert_eq!(cfg.dissolve, DissolveMode::Blend);
    assert_eq!(cfg.slots, DEFAULT_SLOTS);
    assert_eq!(cfg.seed, Some(7));
    cfg.validate().unwrap();
}

#[test]
fn from_path_reads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, r#"{ "target_duration_sec": 3 }"#).unwrap();
    let cfg = RunConfig::from_path(&path).unwrap();
    assert_eq!(cfg.target_duration_sec, 3.0);

    std::fs::write(&path, r#"{ "target_duration_sec": -3 }"#).unwrap();
    assert!(matches!(
        RunConfig::from_path(&path),
        Err(ReelmixError::Validation(_))
    ));

    assert!(RunConfig::from_path(dir.path().join("missing.json")).is_err());
}
