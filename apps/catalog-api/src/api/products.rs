//! Products API routes
//!
//! This module wires up the products domain to HTTP routes.

use axum::Router;
use domain_products::{AttachmentStore, MongoProductRepository, ProductCatalog, handlers};
use mongodb::Database;

use crate::state::AppState;

/// Create products router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoProductRepository::new(&state.db);

    // Create the attachment store and catalog
    let attachments = AttachmentStore::new(&state.config.uploads_dir);
    let catalog = ProductCatalog::new(repository, attachments);

    // Return the domain's router
    handlers::router(catalog)
}

/// Initialize MongoDB indexes for the products collection
pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoProductRepository::new(db)
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create product indexes: {}", e))
}
