use crate::detectors::{PatternSet, RegexPatternMatcher};
use crate::gate::{DEFAULT_MIN_CONFIDENCE, Validator};
use crate::scoring::ContextScorer;
use crate::scoring::combine::DEFAULT_ENTROPY_THRESHOLD;
use crate::scoring::context::{DEFAULT_INDICATORS, DEFAULT_WINDOW};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PIISENSE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid expression for pattern '{name}': {source}")]
    InvalidPattern { name: String, source: regex::Error },
    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PiiConfig {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Replaces the built-in pattern set when present
    #[serde(default)]
    pub patterns: PatternSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_confidence: f64,
    pub entropy_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub window: usize,
    pub indicators: Vec<String>,
}

/// What `detect` does when a detection layer fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole call
    #[default]
    Fail,
    /// Continue with the surviving layer and flag the report
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Learned labels treated as PII; empty accepts every label
    pub learned_labels: Vec<String>,
    pub on_detector_failure: FailurePolicy,
    /// Run both detection layers concurrently
    pub parallel_sources: bool,
    /// Batches larger than this are processed in parallel; 0 disables
    pub parallel_threshold: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            entropy_threshold: DEFAULT_ENTROPY_THRESHOLD,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            indicators: DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            learned_labels: vec!["PER".to_string(), "LOC".to_string(), "ORG".to_string()],
            on_detector_failure: FailurePolicy::Fail,
            parallel_sources: false,
            parallel_threshold: 10,
        }
    }
}

impl PiiConfig {
    /// Load the config from `PIISENSE_CONFIG`, else the user config file,
    /// else defaults.
    ///
    /// A missing user config file is not an error; a file named by the
    /// environment variable must exist.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        match Self::default_file_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_toml()?).map_err(io_err)
    }

    /// Path the config is read from: `PIISENSE_CONFIG` or the user config dir
    pub fn config_file_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(Self::default_file_path)
    }

    fn default_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("piisense");
            path.push("config.toml");
            path
        })
    }

    /// Check value ranges and pattern expressions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = self.validation.min_confidence;
        if !(0.0..=1.0).contains(&min) {
            return Err(ConfigError::OutOfRange {
                field: "validation.min_confidence",
                value: min,
                expected: "0.0 to 1.0",
            });
        }
        let threshold = self.validation.entropy_threshold;
        if !(threshold >= 0.0 && threshold.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "validation.entropy_threshold",
                value: threshold,
                expected: "a finite value >= 0.0",
            });
        }
        self.patterns.compile()?;
        Ok(())
    }

    pub fn validator(&self) -> Validator {
        Validator::new(
            ContextScorer::new(&self.context.indicators, self.context.window),
            self.validation.entropy_threshold,
            self.validation.min_confidence,
        )
    }

    pub fn pattern_matcher(&self) -> Result<RegexPatternMatcher, ConfigError> {
        self.patterns.compile()
    }
}
