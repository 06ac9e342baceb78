use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

/// Upload policy shared by every handler accepting files.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn is_allowed_media(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("video/")
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist a blob and return the public URL path it is served under.
    async fn save(
        &self,
        original_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> anyhow::Result<String>;

    /// Best-effort removal of a previously saved blob.
    async fn delete(&self, public_path: &str) -> anyhow::Result<()>;
}

/// Local-disk store. Files land under `root` with random names and are
/// served statically at `/uploads`.
#[derive(Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn unique_name(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        format!("{}.{}", Uuid::new_v4(), ext)
    }
}

#[async_trait]
impl MediaStore for DiskStore {
    async fn save(
        &self,
        original_name: &str,
        content_type: &str,
        body: Bytes,
    ) -> anyhow::Result<String> {
        if !is_allowed_media(content_type) {
            anyhow::bail!("unsupported content type: {content_type}");
        }
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload directory")?;
        let name = Self::unique_name(original_name);
        tokio::fs::write(self.root.join(&name), &body)
            .await
            .context("write upload")?;
        Ok(format!("/uploads/{name}"))
    }

    async fn delete(&self, public_path: &str) -> anyhow::Result<()> {
        let name = public_path
            .strip_prefix("/uploads/")
            .context("not an upload path")?;
        tokio::fs::remove_file(self.root.join(name))
            .await
            .context("remove upload")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("myb-storage-{}", Uuid::new_v4()))
    }

    #[test]
    fn media_filter_accepts_images_and_videos_only() {
        assert!(is_allowed_media("image/png"));
        assert!(is_allowed_media("video/mp4"));
        assert!(!is_allowed_media("application/pdf"));
        assert!(!is_allowed_media("text/html"));
    }

    #[tokio::test]
    async fn save_and_delete_roundtrip() {
        let root = temp_root();
        let store = DiskStore::new(&root);
        let path = store
            .save("gig.jpg", "image/jpeg", Bytes::from_static(b"jpegdata"))
            .await
            .expect("save");
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".jpg"));

        let on_disk = root.join(path.strip_prefix("/uploads/").unwrap());
        assert!(on_disk.exists());

        store.delete(&path).await.expect("delete");
        assert!(!on_disk.exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn save_rejects_disallowed_content_type() {
        let store = DiskStore::new(temp_root());
        let err = store
            .save("evil.exe", "application/octet-stream", Bytes::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported content type"));
    }
}
