use std::io::Write;

use motoric::config::HumanizeConfig;

#[test]
fn defaults_pass_validation() {
    HumanizeConfig::default().validate().expect("defaults are valid");
}

#[test]
fn unknown_keys_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "gravity": 9.0, "wind_speed": 3.0 }}"#).expect("write config");

    let err = HumanizeConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("failed to parse config"));
}

#[test]
fn partial_config_fills_in_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "base_wpm": 90.0 }}"#).expect("write config");

    let cfg = HumanizeConfig::load(file.path()).expect("partial config loads");
    assert_eq!(cfg.base_wpm, 90.0);
    assert_eq!(cfg.gravity, HumanizeConfig::default().gravity);
}

#[test]
fn inverted_duration_window_is_rejected() {
    let cfg = HumanizeConfig {
        min_duration_ms: 500,
        max_duration_ms: 100,
        ..HumanizeConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("min_duration_ms"));
}

#[test]
fn typo_rate_outside_unit_interval_is_rejected() {
    let cfg = HumanizeConfig {
        typo_rate: 1.5,
        ..HumanizeConfig::default()
    };
    assert!(cfg.validate().is_err());
}
