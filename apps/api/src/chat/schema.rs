use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::AppError;

/// Location of the static JSON description of `customer_data`.
/// The file is re-read on every request so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    path: PathBuf,
}

impl SchemaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the schema document.
    pub async fn load(&self) -> Result<Value, AppError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::Schema(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Schema(format!("{}: {e}", self.path.display())))
    }

    /// The schema as two-space indented JSON, ready to embed in a prompt.
    pub async fn load_pretty(&self) -> Result<String, AppError> {
        let schema = self.load().await?;
        serde_json::to_string_pretty(&schema).map_err(|e| AppError::Schema(e.to_string()))
    }
}
