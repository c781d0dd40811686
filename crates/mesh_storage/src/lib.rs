use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const FIXED_MESH_FILE_NAME: &str = "scan.ply";
pub const MESH_EXTENSION: &str = "ply";

/// How the mesh file inside each save directory is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileNaming {
    /// `<root>/<millis>/scan.ply`
    #[default]
    Fixed,
    /// `<root>/<millis>/<millis>.ply`
    Timestamped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMesh {
    pub path: PathBuf,
    pub saved_at: DateTime<Utc>,
}

/// Destination for reconstructed meshes. The engine writes the file itself;
/// the store only decides where and makes sure the directory exists.
#[async_trait]
pub trait MeshStore: Send + Sync {
    async fn prepare_save_path(&self, saved_at: DateTime<Utc>) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct MeshDirectory {
    root: PathBuf,
    naming: FileNaming,
}

impl MeshDirectory {
    pub fn new(root: impl Into<PathBuf>, naming: FileNaming) -> Self {
        Self {
            root: root.into(),
            naming,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_path_for(&self, saved_at: DateTime<Utc>) -> PathBuf {
        let stamp = saved_at.timestamp_millis();
        let file_name = match self.naming {
            FileNaming::Fixed => FIXED_MESH_FILE_NAME.to_string(),
            FileNaming::Timestamped => format!("{stamp}.{MESH_EXTENSION}"),
        };
        self.root.join(stamp.to_string()).join(file_name)
    }

    /// Meshes already on disk, oldest first. Directories whose name is not a
    /// millisecond timestamp are ignored.
    pub async fn list_saved(&self) -> Result<Vec<SavedMesh>> {
        let mut saved = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(saved),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read mesh directory '{}'", self.root.display())
                })
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            let Some(saved_at) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
                .and_then(DateTime::<Utc>::from_timestamp_millis)
            else {
                continue;
            };
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let mut files = tokio::fs::read_dir(entry.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let path = file.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some(MESH_EXTENSION) {
                    saved.push(SavedMesh { path, saved_at });
                }
            }
        }

        saved.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then(a.path.cmp(&b.path)));
        Ok(saved)
    }
}

#[async_trait]
impl MeshStore for MeshDirectory {
    async fn prepare_save_path(&self, saved_at: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.save_path_for(saved_at);
        let Some(dir) = path.parent() else {
            return Ok(path);
        };
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create mesh directory '{}'", dir.display()))?;
        info!(dir = %dir.display(), "made mesh directory");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
