//! On-disk attachment storage for product images.
//!
//! An attachment lives under a configurable storage root and is addressed
//! by a storage-relative reference string (e.g. `products/<id>.jpg`) that
//! is safe to persist on a record and to serve through a static file
//! server. Deletion is idempotent: a file that is already gone counts as
//! deleted.

use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::error::{ProductError, ProductResult};

/// Maximum accepted image upload size in bytes (5 MiB).
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Subdirectory of the storage root where product images are staged.
const PRODUCTS_DIR: &str = "products";

/// Manages the lifecycle of product image files under a storage root.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
    /// Final path segment of the root (e.g. `uploads`), stripped when
    /// deriving public references.
    root_name: String,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { root, root_name }
    }

    /// The storage root this store manages.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the public, storage-relative reference for a staged file.
    ///
    /// Normalizes backslashes to forward slashes and strips any leading
    /// `./`, `/`, and storage-root segments, however many times they are
    /// repeated. Pure; performs no I/O and cannot fail.
    pub fn public_ref(&self, staged: &Path) -> String {
        let relative = staged.strip_prefix(&self.root).unwrap_or(staged);
        let normalized = relative.to_string_lossy().replace('\\', "/");
        let root_prefix = format!("{}/", self.root_name);

        let mut rest = normalized.as_str();
        loop {
            if let Some(stripped) = rest.strip_prefix("./") {
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix('/') {
                rest = stripped;
            } else if !self.root_name.is_empty() && rest.starts_with(&root_prefix) {
                rest = &rest[root_prefix.len()..];
            } else {
                break;
            }
        }

        rest.to_string()
    }

    /// Write uploaded bytes to a uniquely named staged file under the
    /// storage root and return its path.
    ///
    /// The extension is taken from the original file name; uploads larger
    /// than [`MAX_IMAGE_SIZE`] are rejected before anything touches disk.
    pub async fn stage(&self, original_name: &str, bytes: &[u8]) -> ProductResult<PathBuf> {
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ProductError::ImageTooLarge(bytes.len()));
        }

        let extension = Path::new(original_name)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bin".to_string());

        let dir = self.root.join(PRODUCTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.{}", Uuid::now_v7(), extension));
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Staged attachment");
        Ok(path)
    }

    /// Delete the file behind a storage-relative reference.
    ///
    /// Returns `true` when the file is gone afterwards, whether it was
    /// removed now or was already absent. Any other I/O failure is logged
    /// and reported as `false`, never propagated: this runs on cleanup and
    /// rollback paths where it must not mask the primary outcome.
    pub async fn delete(&self, reference: &str) -> bool {
        let relative = Path::new(reference);
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            tracing::warn!(reference, "Refusing to delete attachment outside storage root");
            return false;
        }

        self.discard(&self.root.join(relative)).await
    }

    /// Best-effort removal of a staged file by its on-disk path.
    ///
    /// Same idempotence contract as [`delete`](Self::delete).
    pub async fn discard(&self, path: &Path) -> bool {
        match tokio::fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove attachment");
                false
            }
        }
    }
}
