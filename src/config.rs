use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_MODEL_PATH: &str = "mobilenet_v2_1.4_224_frozen.pb";
pub const DEFAULT_LABELS_PATH: &str = "labels.txt";
pub const DEFAULT_INPUT_SIZE: usize = 224;

/// Application variables the component reads; each is declared in `spin.toml`.
pub const VARIABLES: [&str; 4] = ["model_path", "labels_path", "input_size", "top_k"];

/// Where the model lives and how it is fed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    /// Width and height, in pixels, of the square model input.
    pub input_size: usize,
    pub top_k: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: PathBuf::from(DEFAULT_LABELS_PATH),
            input_size: DEFAULT_INPUT_SIZE,
            top_k: crate::inference::DEFAULT_TOP_K,
        }
    }
}

impl ClassifierConfig {
    /// Like [`ClassifierConfig::from_lookup`], for a host lookup that can
    /// fail. A failed lookup is logged and the default is kept.
    pub fn from_variables<E: std::fmt::Debug>(
        get: impl Fn(&str) -> std::result::Result<String, E>,
    ) -> Result<Self> {
        Self::from_lookup(|key| match get(key) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(variable = key, error = ?err, "variable lookup failed, using default");
                None
            }
        })
    }

    /// Builds a config from named variables (`model_path`, `labels_path`,
    /// `input_size`, `top_k`). Missing or empty values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("model_path") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = get("labels_path") {
            config.labels_path = PathBuf::from(path);
        }
        if let Some(size) = get("input_size") {
            config.input_size = size
                .trim()
                .parse()
                .with_context(|| format!("invalid input_size {size:?}"))?;
        }
        if let Some(top_k) = get("top_k") {
            config.top_k = top_k
                .trim()
                .parse()
                .with_context(|| format!("invalid top_k {top_k:?}"))?;
        }
        Ok(config)
    }
}
