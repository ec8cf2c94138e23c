//! Screenshot blob offloading.
//!
//! Remote blob storage is an external collaborator; when none is
//! configured the reference stored for a screenshot is simply its local
//! path.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::StoreError;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local artifact and return the reference to persist.
    async fn upload(&self, local_path: &Path) -> Result<String, StoreError>;
}

/// The unconfigured fallback: the local path is the reference.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughBlobStore;

#[async_trait]
impl BlobStore for PassthroughBlobStore {
    async fn upload(&self, local_path: &Path) -> Result<String, StoreError> {
        Ok(local_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passthrough_returns_the_local_path_unchanged() {
        let blob = PassthroughBlobStore;
        let reference = blob
            .upload(Path::new("screenshots/home.png"))
            .await
            .expect("upload");
        assert_eq!(reference, "screenshots/home.png");
    }
}
