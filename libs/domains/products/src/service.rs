//! Product catalog - business logic layer
//!
//! Orchestrates product records and their image attachments so that the
//! two never diverge in a way visible to clients: a returned record with
//! an image reference always points at a file that exists, and a failed
//! record write never leaves a freshly staged file behind.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::attachments::AttachmentStore;
use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductFilter, UpdateProduct};
use crate::repository::ProductRepository;

/// Product catalog service providing CRUD and search over products.
///
/// Owns the attachment lifetime for every product it manages: attachments
/// are deleted on replacement, on record removal, and on rollback of a
/// failed write. No other component touches a committed attachment.
pub struct ProductCatalog<R: ProductRepository> {
    repository: Arc<R>,
    attachments: Arc<AttachmentStore>,
}

impl<R: ProductRepository> ProductCatalog<R> {
    /// Create a new ProductCatalog with the given repository and
    /// attachment store.
    pub fn new(repository: R, attachments: AttachmentStore) -> Self {
        Self {
            repository: Arc::new(repository),
            attachments: Arc::new(attachments),
        }
    }

    /// The attachment store backing this catalog. Handlers use it to
    /// stage uploads before invoking create/update.
    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// Create a new product, optionally with a staged image file.
    ///
    /// The insert is attempted first; only if it fails is the staged file
    /// removed. The orphan window is therefore bounded to "file exists,
    /// no record" during the insert attempt, never the reverse.
    #[instrument(skip(self, input, staged), fields(product_name = %input.name))]
    pub async fn create(
        &self,
        input: CreateProduct,
        staged: Option<PathBuf>,
    ) -> ProductResult<Product> {
        if let Err(e) = input.validate() {
            self.discard_staged(staged).await;
            return Err(ProductError::Validation(e.to_string()));
        }

        let image_ref = staged
            .as_deref()
            .map(|path| self.attachments.public_ref(path));
        let product = Product::new(input, image_ref);

        match self.repository.insert(product).await {
            Ok(created) => Ok(created),
            Err(err) => {
                tracing::error!(error = %err, "Product insert failed, discarding staged file");
                self.discard_staged(staged).await;
                Err(ProductError::CreateFailed)
            }
        }
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Search products with optional keyword, price bounds, and sort
    #[instrument(skip(self))]
    pub async fn search(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        self.repository.find(filter).await
    }

    /// Apply a partial update, optionally replacing the image attachment.
    ///
    /// When a new file is staged the old attachment is only deleted after
    /// the record update has committed with the new reference, so a crash
    /// mid-update can leave an orphaned old file but never a record that
    /// points at a missing one.
    #[instrument(skip(self, patch, staged))]
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateProduct,
        staged: Option<PathBuf>,
    ) -> ProductResult<Product> {
        if let Err(e) = patch.validate() {
            self.discard_staged(staged).await;
            return Err(ProductError::Validation(e.to_string()));
        }

        // Load before committing anything so a staged file is never kept
        // for a record that does not exist.
        let Some(existing) = self.repository.find_by_id(id).await? else {
            self.discard_staged(staged).await;
            return Err(ProductError::NotFound(id));
        };

        let Some(staged_path) = staged else {
            return self
                .repository
                .update_by_id(id, patch, None)
                .await?
                .ok_or(ProductError::NotFound(id));
        };

        let new_ref = self.attachments.public_ref(&staged_path);
        match self
            .repository
            .update_by_id(id, patch, Some(new_ref.clone()))
            .await
        {
            Ok(Some(updated)) => {
                // Old-image cleanup happens only after the new reference
                // is durably committed.
                if let Some(old_ref) = existing.image_ref {
                    if old_ref != new_ref {
                        self.attachments.delete(&old_ref).await;
                    }
                }
                Ok(updated)
            }
            Ok(None) => {
                // Record vanished between load and update.
                self.attachments.discard(&staged_path).await;
                Err(ProductError::NotFound(id))
            }
            Err(err) => {
                tracing::error!(error = %err, product_id = %id, "Product update failed, discarding staged file");
                self.attachments.discard(&staged_path).await;
                Err(ProductError::UpdateFailed)
            }
        }
    }

    /// Delete a product and its attachment, returning the deleted record.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> ProductResult<Product> {
        let deleted = self
            .repository
            .delete_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        if let Some(ref reference) = deleted.image_ref {
            self.attachments.delete(reference).await;
        }

        Ok(deleted)
    }

    async fn discard_staged(&self, staged: Option<PathBuf>) {
        if let Some(path) = staged {
            self.attachments.discard(&path).await;
        }
    }
}

impl<R: ProductRepository> Clone for ProductCatalog<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            attachments: Arc::clone(&self.attachments),
        }
    }
}
