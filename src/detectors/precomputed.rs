use super::{DetectorError, EntityRecognizer, RecognizedEntity};
use std::path::{Path, PathBuf};

/// Replays entities produced by an external model run.
///
/// Lets the learned layer run out of process (or ahead of time) while the
/// fusion happens here. The entities must refer to the text being detected.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedRecognizer {
    entities: Vec<RecognizedEntity>,
}

impl PrecomputedRecognizer {
    pub fn new(entities: Vec<RecognizedEntity>) -> Self {
        Self { entities }
    }

    /// Parse a JSON array of `{text, label, score, start, end}` objects.
    pub fn from_json(json: &str) -> Result<Self, DetectorError> {
        let entities: Vec<RecognizedEntity> = serde_json::from_str(json)
            .map_err(|e| DetectorError::InvalidInput(format!("entity list: {e}")))?;
        Ok(Self::new(entities))
    }

    pub fn from_file(path: &Path) -> Result<Self, DetectorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DetectorError::Unavailable(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn entities(&self) -> &[RecognizedEntity] {
        &self.entities
    }
}

impl EntityRecognizer for PrecomputedRecognizer {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, DetectorError> {
        Ok(self.entities.clone())
    }
}

/// Reads an entity file on every `recognize` call.
///
/// A missing or malformed file is a failure of the learned layer, so the
/// engine's failure policy decides whether detection continues without it.
#[derive(Debug, Clone)]
pub struct EntityFileRecognizer {
    path: PathBuf,
}

impl EntityFileRecognizer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntityRecognizer for EntityFileRecognizer {
    fn name(&self) -> &str {
        "entity-file"
    }

    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, DetectorError> {
        PrecomputedRecognizer::from_file(&self.path)?.recognize(text)
    }
}
