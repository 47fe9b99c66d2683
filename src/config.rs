use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::LabelCatalog;
use crate::detect::{BackendRegistry, ClassifierInput, ClassifierSettings, LandmarkSource};
use crate::ingest::SourceConfig;
use crate::motion::{DEFAULT_REQUIRED_STILL_FRAMES, DEFAULT_STILL_THRESHOLD};
use crate::pipeline::{PipelineSettings, RecognitionMode, Translator};
use crate::stabilizer::{
    StabilizerPolicy, DEFAULT_MIN_AVG_CONFIDENCE, DEFAULT_MIN_SUPPORT, DEFAULT_WINDOW_SIZE,
};

const DEFAULT_CLASSIFIER: &str = "centroid";
const DEFAULT_SOURCE_URL: &str = "stub://front_camera";
const DEFAULT_SOURCE_FPS: u32 = 15;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct TranslatorConfigFile {
    mode: Option<RecognitionMode>,
    catalog_path: Option<PathBuf>,
    stabilizer: Option<StabilizerConfigFile>,
    motion: Option<MotionConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    source: Option<SourceConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct StabilizerConfigFile {
    window_size: Option<usize>,
    min_support: Option<usize>,
    min_avg_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct MotionConfigFile {
    still_threshold: Option<f32>,
    required_still_frames: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    input: Option<ClassifierInput>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub pipeline: PipelineSettings,
    pub catalog_path: Option<PathBuf>,
    pub classifier: ClassifierConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub backend: String,
    pub settings: ClassifierSettings,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self::from_file(TranslatorConfigFile::default())
    }
}

impl TranslatorConfig {
    /// Defaults, then the file named by `SIGN_CONFIG`, then `SIGN_*` overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGN_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TranslatorConfigFile) -> Self {
        let stabilizer = file.stabilizer.unwrap_or_default();
        let policy = StabilizerPolicy {
            window_size: stabilizer.window_size.unwrap_or(DEFAULT_WINDOW_SIZE),
            min_support: stabilizer.min_support.unwrap_or(DEFAULT_MIN_SUPPORT),
            min_avg_confidence: stabilizer
                .min_avg_confidence
                .unwrap_or(DEFAULT_MIN_AVG_CONFIDENCE),
        };
        let motion = file.motion.unwrap_or_default();
        let pipeline = PipelineSettings {
            policy,
            still_threshold: motion.still_threshold.unwrap_or(DEFAULT_STILL_THRESHOLD),
            required_still_frames: motion
                .required_still_frames
                .unwrap_or(DEFAULT_REQUIRED_STILL_FRAMES),
            mode: file.mode.unwrap_or_default(),
        };

        let classifier = file.classifier.unwrap_or_default();
        let classifier = ClassifierConfig {
            backend: classifier
                .backend
                .unwrap_or_else(|| DEFAULT_CLASSIFIER.to_string()),
            settings: ClassifierSettings {
                model_path: classifier.model_path,
                labels_path: classifier.labels_path,
                input: classifier.input.unwrap_or_default(),
            },
        };

        let source = file.source.unwrap_or_default();
        let source = SourceConfig {
            url: source.url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: source.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
        };

        Self {
            pipeline,
            catalog_path: file.catalog_path,
            classifier,
            source,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(size) = env_parse::<usize>("SIGN_WINDOW_SIZE", "an integer")? {
            self.pipeline.policy.window_size = size;
        }
        if let Some(support) = env_parse::<usize>("SIGN_MIN_SUPPORT", "an integer")? {
            self.pipeline.policy.min_support = support;
        }
        if let Some(conf) = env_parse::<f32>("SIGN_MIN_AVG_CONFIDENCE", "a number")? {
            self.pipeline.policy.min_avg_confidence = conf;
        }
        if let Some(threshold) = env_parse::<f32>("SIGN_STILL_THRESHOLD", "a number")? {
            self.pipeline.still_threshold = threshold;
        }
        if let Some(frames) = env_parse::<u32>("SIGN_STILL_FRAMES", "an integer")? {
            self.pipeline.required_still_frames = frames;
        }
        if let Some(mode) = env_value("SIGN_MODE") {
            self.pipeline.mode = mode.parse::<RecognitionMode>().context("SIGN_MODE")?;
        }
        if let Some(path) = env_value("SIGN_CATALOG_PATH") {
            self.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(backend) = env_value("SIGN_CLASSIFIER") {
            self.classifier.backend = backend;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.pipeline.policy.validate()?;
        let threshold = self.pipeline.still_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(anyhow!(
                "still_threshold must be a positive number (got {})",
                threshold
            ));
        }
        self.classifier.backend = self.classifier.backend.trim().to_lowercase();
        if self.classifier.backend.is_empty() {
            return Err(anyhow!("classifier backend must not be empty"));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        Ok(())
    }

    /// Catalog named by `catalog_path`; no path means an empty catalog.
    pub fn load_catalog(&self) -> Result<LabelCatalog> {
        match &self.catalog_path {
            Some(path) => LabelCatalog::from_path(path),
            None => Ok(LabelCatalog::new()),
        }
    }

    /// Build a translator around `source`.
    ///
    /// A classifier that fails to load leaves the translator disabled with the
    /// reason attached. A catalog that fails to load falls back to raw labels.
    pub fn build_translator(
        &self,
        registry: &BackendRegistry,
        source: Box<dyn LandmarkSource>,
    ) -> Translator {
        let catalog = match self.load_catalog() {
            Ok(catalog) => catalog,
            Err(e) => {
                log::warn!("label catalog unavailable, showing raw labels: {:#}", e);
                LabelCatalog::new()
            }
        };
        let init = registry
            .build(&self.classifier.backend, &self.classifier.settings)
            .map(|classifier| (source, classifier));
        Translator::from_init(self.pipeline, init, catalog)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, what: &str) -> Result<Option<T>> {
    match env_value(key) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be {} (got '{}')", key, what, raw)),
        None => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<TranslatorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let mut cfg = TranslatorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.pipeline.policy, StabilizerPolicy::default());
        assert_eq!(cfg.pipeline.mode, RecognitionMode::Words);
        assert_eq!(cfg.classifier.backend, "centroid");
        assert_eq!(cfg.source.url, "stub://front_camera");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = TranslatorConfig::default();
        cfg.pipeline.policy.min_support = 20;
        assert!(cfg.validate().is_err());

        let mut cfg = TranslatorConfig::default();
        cfg.pipeline.still_threshold = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = TranslatorConfig::default();
        cfg.classifier.backend = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_classifier_yields_disabled_translator() {
        let mut cfg = TranslatorConfig::default();
        cfg.classifier.backend = "nonexistent".to_string();
        let translator = cfg.build_translator(
            &BackendRegistry::with_builtin(),
            Box::new(crate::detect::ScriptedLandmarkSource::new(Vec::new())),
        );
        assert!(!translator.readiness().is_ready());
    }
}
