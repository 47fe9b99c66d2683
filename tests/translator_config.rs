use std::io::Write;
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use sign_translator::config::TranslatorConfig;
use sign_translator::detect::ClassifierInput;
use sign_translator::RecognitionMode;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SIGN_CONFIG",
        "SIGN_WINDOW_SIZE",
        "SIGN_MIN_SUPPORT",
        "SIGN_MIN_AVG_CONFIDENCE",
        "SIGN_STILL_THRESHOLD",
        "SIGN_STILL_FRAMES",
        "SIGN_MODE",
        "SIGN_CATALOG_PATH",
        "SIGN_CLASSIFIER",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_json_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "mode": "alphabet",
        "catalog_path": "/srv/signs/catalog.json",
        "stabilizer": {
            "window_size": 12,
            "min_support": 6,
            "min_avg_confidence": 0.5
        },
        "motion": {
            "still_threshold": 0.004,
            "required_still_frames": 4
        },
        "classifier": {
            "backend": "centroid",
            "model_path": "/srv/signs/centroids.json"
        },
        "source": {
            "url": "stub://rear_camera",
            "target_fps": 24,
            "width": 320,
            "height": 240
        }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("SIGN_CONFIG", file.path());
    std::env::set_var("SIGN_MIN_SUPPORT", "8");
    std::env::set_var("SIGN_MODE", "words");
    std::env::set_var("SIGN_CLASSIFIER", " Centroid ");

    let cfg = TranslatorConfig::load().expect("load config");

    assert_eq!(cfg.pipeline.policy.window_size, 12);
    assert_eq!(cfg.pipeline.policy.min_support, 8);
    assert!((cfg.pipeline.policy.min_avg_confidence - 0.5).abs() < 1e-6);
    assert!((cfg.pipeline.still_threshold - 0.004).abs() < 1e-6);
    assert_eq!(cfg.pipeline.required_still_frames, 4);
    assert_eq!(cfg.pipeline.mode, RecognitionMode::Words);
    assert_eq!(
        cfg.catalog_path.as_deref(),
        Some(std::path::Path::new("/srv/signs/catalog.json"))
    );
    assert_eq!(cfg.classifier.backend, "centroid");
    assert_eq!(
        cfg.classifier.settings.model_path.as_deref(),
        Some(std::path::Path::new("/srv/signs/centroids.json"))
    );
    assert_eq!(cfg.source.url, "stub://rear_camera");
    assert_eq!(cfg.source.target_fps, 24);
    assert_eq!(cfg.source.width, 320);
    assert_eq!(cfg.source.height, 240);

    clear_env();
}

#[test]
fn loads_toml_config_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    let toml = r#"
mode = "alphabet"

[stabilizer]
window_size = 6
min_support = 3

[classifier]
backend = "tract"
model_path = "model.onnx"
labels_path = "labels.json"

[classifier.input.image]
width = 224
height = 224
"#;
    file.write_all(toml.as_bytes()).expect("write config");
    std::env::set_var("SIGN_CONFIG", file.path());

    let cfg = TranslatorConfig::load().expect("load config");
    assert_eq!(cfg.pipeline.mode, RecognitionMode::Alphabet);
    assert_eq!(cfg.pipeline.policy.window_size, 6);
    assert_eq!(cfg.pipeline.policy.min_support, 3);
    assert!((cfg.pipeline.policy.min_avg_confidence - 0.35).abs() < 1e-6);
    assert_eq!(cfg.classifier.backend, "tract");
    assert_eq!(
        cfg.classifier.settings.input,
        ClassifierInput::Image {
            width: 224,
            height: 224
        }
    );

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = TranslatorConfig::load().expect("load config");
    assert_eq!(cfg.pipeline.policy.window_size, 10);
    assert_eq!(cfg.pipeline.policy.min_support, 5);
    assert_eq!(cfg.pipeline.required_still_frames, 3);
    assert_eq!(cfg.pipeline.mode, RecognitionMode::Words);
    assert!(cfg.catalog_path.is_none());
    assert_eq!(cfg.classifier.backend, "centroid");
    assert_eq!(
        cfg.classifier.settings.input,
        ClassifierInput::Features { len: 42 }
    );

    clear_env();
}

#[test]
fn rejects_invalid_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SIGN_WINDOW_SIZE", "ten");
    let err = TranslatorConfig::load().unwrap_err();
    assert!(err.to_string().contains("SIGN_WINDOW_SIZE"));
    clear_env();

    std::env::set_var("SIGN_MIN_SUPPORT", "11");
    assert!(TranslatorConfig::load().is_err());
    clear_env();

    std::env::set_var("SIGN_MODE", "signs");
    assert!(TranslatorConfig::load().is_err());
    clear_env();

    std::env::set_var("SIGN_STILL_THRESHOLD", "-0.1");
    assert!(TranslatorConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_unreadable_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(b"{ not json").expect("write config");
    std::env::set_var("SIGN_CONFIG", file.path());
    let err = TranslatorConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    std::env::set_var("SIGN_CONFIG", "/nonexistent/sign-config.json");
    let err = TranslatorConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
