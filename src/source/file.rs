use super::{parse_pool, validate_key, CardSource};
use crate::error::LoadError;
use crate::model::Card;
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads pools from JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, LoadError> {
        Ok(self.root.join(validate_key(key)?))
    }
}

#[async_trait]
impl CardSource for FileSource {
    async fn fetch(&self, key: &str) -> Result<Vec<Card>, LoadError> {
        let path = self.path_for(key)?;
        tracing::debug!(path = %path.display(), "reading card pool");
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| LoadError::Io { path, source })?;
        parse_pool(&bytes)
    }
}
