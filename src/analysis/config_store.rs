use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use log::info;
use crate::analysis::error::AnalysisError;
use crate::analysis::judgment::JudgmentConfig;
/// Where the judgment policy lives between runs. The engine only ever reads a
/// snapshot through [`ConfigStore::load`].
pub trait ConfigStore {
    fn load(&self) -> Result<JudgmentConfig, AnalysisError>;
    /// Rejects configs that fail [`JudgmentConfig::validate`] without touching the stored copy.
    fn save(&mut self, config: &JudgmentConfig) -> Result<(), AnalysisError>;
}
/// In-memory store useful for tests and embedding.
#[derive(Default)]
pub struct MemoryConfigStore {
    current: JudgmentConfig,
}
impl MemoryConfigStore {
    pub fn new(initial: JudgmentConfig) -> Self {
        Self { current: initial }
    }
}
impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<JudgmentConfig, AnalysisError> {
        Ok(self.current.clone())
    }
    fn save(&mut self, config: &JudgmentConfig) -> Result<(), AnalysisError> {
        config.validate()?;
        self.current = config.clone();
        Ok(())
    }
}
/// JSON document keyed by field label, the same shape the settings page wrote.
pub struct JsonFileConfigStore {
    path: PathBuf,
}
impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl ConfigStore for JsonFileConfigStore {
    /// A file that does not exist yet loads as the all-disabled default.
    fn load(&self) -> Result<JudgmentConfig, AnalysisError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no judgment config at {}; all fields disabled", self.path.display());
                return Ok(JudgmentConfig::default());
            }
            Err(err) => return Err(err.into()),
        };
        if text.trim().is_empty() {
            return Ok(JudgmentConfig::default());
        }
        Ok(serde_json::from_str(&text)?)
    }
    fn save(&mut self, config: &JudgmentConfig) -> Result<(), AnalysisError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)?;
        info!("judgment config saved to {}", self.path.display());
        Ok(())
    }
}
