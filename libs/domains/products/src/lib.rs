//! Products Domain
//!
//! This module provides a complete domain implementation for a product
//! catalog backed by MongoDB, where each product optionally carries a
//! single on-disk image attachment.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (multipart upload boundary)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Catalog   │  ← Business logic, record/attachment consistency
//! └──────┬──────┴────────────┐
//!        │                   │
//! ┌──────▼──────┐    ┌───────▼────────┐
//! │ Repository  │    │ AttachmentStore│  ← Image files on disk
//! └──────┬──────┘    └────────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     attachments::AttachmentStore,
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductCatalog,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a MongoDB client
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//!
//! // Create a repository, attachment store, and catalog
//! let repository = MongoProductRepository::new(&db);
//! let attachments = AttachmentStore::new("uploads");
//! let catalog = ProductCatalog::new(repository, attachments);
//!
//! // Create Axum router
//! let router = handlers::router(catalog);
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use attachments::{AttachmentStore, MAX_IMAGE_SIZE};
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateProduct, Product, ProductFilter, SortField, SortOrder, UpdateProduct,
};
pub use mongodb::MongoProductRepository;
pub use repository::ProductRepository;
pub use service::ProductCatalog;
