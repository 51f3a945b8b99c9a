use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductFilter, UpdateProduct};

/// Repository trait for Product persistence
///
/// This trait defines the data access interface for products.
/// Implementations can use different storage backends (MongoDB, PostgreSQL, etc.)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a fully constructed product record
    async fn insert(&self, product: Product) -> ProductResult<Product>;

    /// Get a product by ID
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Find products matching a filter, sorted per the filter
    async fn find(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Apply a partial update to a product, optionally replacing its
    /// attachment reference. Returns the updated record, or `None` when
    /// no record with that id exists at update time.
    async fn update_by_id(
        &self,
        id: Uuid,
        patch: UpdateProduct,
        image_ref: Option<String>,
    ) -> ProductResult<Option<Product>>;

    /// Delete a product by ID, returning the deleted record when it existed
    async fn delete_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;
}
