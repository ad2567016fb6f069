//! Disk-backed storage for uploaded images (ID cards, selfies, licenses,
//! listing photos). Names are generated, never taken from the client.

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ApiError;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Validate and persist one uploaded image. Returns the stored filename
    /// (the bare name, not a path; `folder` scopes listing photos apart from
    /// signup documents).
    async fn store(
        &self,
        folder: &str,
        field: &str,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, ApiError>;

    /// Best-effort removal. A missing file is not an error; failure paths
    /// call this to clean up and must not fail again while doing so.
    async fn discard(&self, folder: &str, name: &str);
}

pub struct DiskArtifactStore {
    root: PathBuf,
}

impl DiskArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_for(&self, folder: &str) -> PathBuf {
        let mut dir = self.root.clone();
        if !folder.is_empty() {
            dir.push(folder);
        }
        dir
    }

    fn validate(
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<&'static str, ApiError> {
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let extension = ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == extension)
            .copied();
        let type_ok = match content_type {
            Some(value) => ALLOWED_EXTENSIONS.iter().any(|allowed| value.contains(allowed)),
            None => true,
        };
        let Some(extension) = extension.filter(|_| type_ok) else {
            return Err(ApiError::Validation(
                "Only .jpg, .jpeg, .png, and .webp files are allowed!".to_string(),
            ));
        };
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::Validation("Upload Error: File too large".to_string()));
        }
        Ok(extension)
    }
}

#[async_trait]
impl ArtifactStore for DiskArtifactStore {
    async fn store(
        &self,
        folder: &str,
        field: &str,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, ApiError> {
        let extension = Self::validate(original_name, content_type, bytes)?;
        let name = format!("{}-{}.{}", field, Uuid::new_v4().simple(), extension);

        let dir = self.dir_for(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| ApiError::Internal(format!("failed to prepare upload dir: {err}")))?;
        tokio::fs::write(dir.join(&name), bytes)
            .await
            .map_err(|err| ApiError::Internal(format!("failed to store upload: {err}")))?;

        Ok(name)
    }

    async fn discard(&self, folder: &str, name: &str) {
        // Stored names never contain separators; anything else is not ours.
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return;
        }
        let _ = tokio::fs::remove_file(self.dir_for(folder).join(name)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store() -> DiskArtifactStore {
        let mut root = std::env::temp_dir();
        root.push(format!("sqw-artifacts-{}", Uuid::new_v4().simple()));
        DiskArtifactStore::new(root)
    }

    #[tokio::test]
    async fn stores_and_discards() {
        let store = scratch_store();
        let name = store
            .store("", "selfie", "me.JPG", Some("image/jpeg"), b"fake-bytes")
            .await
            .unwrap();
        assert!(name.starts_with("selfie-"));
        assert!(name.ends_with(".jpg"));
        assert!(store.root.join(&name).exists());

        store.discard("", &name).await;
        assert!(!store.root.join(&name).exists());
    }

    #[tokio::test]
    async fn rejects_unexpected_file_types() {
        let store = scratch_store();
        let err = store
            .store("", "selfie", "malware.exe", Some("application/x-exe"), b"x")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only .jpg, .jpeg, .png, and .webp files are allowed!"
        );
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let store = scratch_store();
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = store
            .store("", "id_front", "card.png", Some("image/png"), &big)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload Error: File too large");
    }

    #[tokio::test]
    async fn discard_tolerates_missing_files() {
        let store = scratch_store();
        store.discard("", "never-stored.png").await;
    }
}
