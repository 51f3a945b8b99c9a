//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductFilter, SortOrder, UpdateProduct};
use crate::repository::ProductRepository;

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            // Price range queries and default sort order
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(IndexOptions::builder().name("idx_price".to_string()).build())
                .build(),
            // Keyword lookups on name
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().name("idx_name".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref keyword) = filter.keyword {
            doc.insert("name", doc! { "$regex": keyword, "$options": "i" });
        }

        // Price range
        if filter.min_price.is_some() || filter.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = filter.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = filter.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("price", price_filter);
        }

        doc
    }

    /// Build a sort document from the filter's sort field and direction
    fn build_sort(filter: &ProductFilter) -> Document {
        let direction = match filter.sort {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        };
        let mut sort = Document::new();
        sort.insert(filter.sort_by.field_name(), direction);
        sort
    }

    /// Build a `$set` update document from the provided patch fields
    fn build_update(patch: &UpdateProduct, image_ref: Option<&str>) -> Document {
        let mut set = doc! { "updated_at": to_bson(&chrono::Utc::now()).unwrap_or(Bson::Null) };

        if let Some(ref name) = patch.name {
            set.insert("name", name);
        }
        if let Some(price) = patch.price {
            set.insert("price", price);
        }
        if let Some(ref description) = patch.description {
            set.insert("description", description);
        }
        if let Some(ref colors) = patch.colors {
            set.insert("colors", colors.clone());
        }
        if let Some(reference) = image_ref {
            set.insert("image_ref", reference);
        }

        doc! { "$set": set }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn insert(&self, product: Product) -> ProductResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn find(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        use futures_util::TryStreamExt;

        let mongo_filter = Self::build_filter(&filter);

        let options = mongodb::options::FindOptions::builder()
            .limit(filter.limit)
            .skip(filter.offset)
            .sort(Self::build_sort(&filter))
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(
        &self,
        id: Uuid,
        patch: UpdateProduct,
        image_ref: Option<String>,
    ) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let update = Self::build_update(&patch, image_ref.as_deref());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await?;

        if updated.is_some() {
            tracing::info!(product_id = %id, "Product updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let deleted = self.collection.find_one_and_delete(filter).await?;

        if deleted.is_some() {
            tracing::info!(product_id = %id, "Product deleted successfully");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortField;

    #[test]
    fn build_filter_empty() {
        let filter = ProductFilter::default();
        let doc = MongoProductRepository::build_filter(&filter);
        assert!(doc.is_empty());
    }

    #[test]
    fn build_filter_with_keyword() {
        let filter = ProductFilter {
            keyword: Some("mug".to_string()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        let name = doc.get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "mug");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn build_filter_with_price_range() {
        let filter = ProductFilter {
            min_price: Some(10.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        let price = doc.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 20.0);
    }

    #[test]
    fn build_filter_with_single_bound() {
        let filter = ProductFilter {
            min_price: Some(50.0),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&filter);
        let price = doc.get_document("price").unwrap();
        assert!(price.get_f64("$gte").is_ok());
        assert!(price.get("$lte").is_none());
    }

    #[test]
    fn build_sort_defaults_to_price_ascending() {
        let filter = ProductFilter::default();
        let doc = MongoProductRepository::build_sort(&filter);
        assert_eq!(doc.get_i32("price").unwrap(), 1);
    }

    #[test]
    fn build_sort_descending_by_name() {
        let filter = ProductFilter {
            sort: SortOrder::Desc,
            sort_by: SortField::Name,
            ..Default::default()
        };
        let doc = MongoProductRepository::build_sort(&filter);
        assert_eq!(doc.get_i32("name").unwrap(), -1);
    }

    #[test]
    fn build_update_only_sets_provided_fields() {
        let patch = UpdateProduct {
            price: Some(150.0),
            ..Default::default()
        };
        let update = MongoProductRepository::build_update(&patch, None);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_f64("price").unwrap(), 150.0);
        assert!(set.get("name").is_none());
        assert!(set.get("image_ref").is_none());
        assert!(set.get("updated_at").is_some());
    }

    #[test]
    fn build_update_includes_image_ref_when_replacing() {
        let update =
            MongoProductRepository::build_update(&UpdateProduct::default(), Some("products/b.jpg"));
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("image_ref").unwrap(), "products/b.jpg");
    }
}
