use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::geojson::FeatureCollection;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No stored dataset at {0}")]
    Missing(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Stored dataset is not valid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Background write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The single GeoJSON file shared between rebuild and read-back requests.
///
/// Writes go to a temporary sibling file that then replaces the target, so a
/// concurrent read sees either the old or the new dataset.
#[derive(Debug, Clone)]
pub struct GeoJsonStore {
    path: PathBuf,
}

impl GeoJsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self, collection), fields(path = %self.path.display(), features = collection.len()))]
    pub async fn write(&self, collection: &FeatureCollection) -> Result<(), StoreError> {
        let body = collection.to_json()?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, body.as_bytes())).await??;
        debug!("Stored dataset");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn read(&self) -> Result<FeatureCollection, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(self.path.display().to_string()));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };
        debug!("Read stored dataset, size: {} bytes", text.len());

        Ok(FeatureCollection::from_json(&text)?)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::{Crs, Feature, CRS84};
    use serde_json::{json, Map};

    fn sample() -> FeatureCollection {
        let mut properties = Map::new();
        properties.insert("Levekårsnavn".to_string(), json!("Sentrum"));
        FeatureCollection::new(
            vec![Feature::new(
                properties,
                Some(json!({"type": "Point", "coordinates": [10.4, 63.4]})),
            )],
            Some(Crs::named(CRS84)),
        )
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = GeoJsonStore::new(dir.path().join("data.geojson"));

        store.write(&sample()).await.unwrap();
        let loaded = store.read().await.unwrap();

        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.geojson");
        std::fs::write(&path, "stale").unwrap();
        let store = GeoJsonStore::new(&path);

        store.write(&sample()).await.unwrap();

        assert_eq!(store.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = GeoJsonStore::new(dir.path().join("absent.geojson"));

        let result = store.read().await;
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }

    #[tokio::test]
    async fn test_read_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.geojson");
        std::fs::write(&path, "{not json").unwrap();

        let result = GeoJsonStore::new(&path).read().await;
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
