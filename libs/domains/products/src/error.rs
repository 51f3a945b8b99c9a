use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::attachments::MAX_IMAGE_SIZE;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Image of {0} bytes exceeds the maximum allowed size")]
    ImageTooLarge(usize),

    #[error("Attachment storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to create product")]
    CreateFailed,

    #[error("Failed to update product")]
    UpdateFailed,

    #[error("Database error: {0}")]
    Database(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses.
///
/// CreateFailed and UpdateFailed deliberately carry no root cause: the
/// underlying store error is logged at the failure site and the client
/// only sees a generic failure.
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => AppError::NotFound(format!("Product {} not found", id)),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::ImageTooLarge(size) => AppError::PayloadTooLarge(format!(
                "Image of {} bytes exceeds the {} byte limit",
                size, MAX_IMAGE_SIZE
            )),
            ProductError::Storage(_) => {
                AppError::InternalServerError("Attachment storage error".to_string())
            }
            ProductError::CreateFailed => {
                AppError::InternalServerError("Failed to create product".to_string())
            }
            ProductError::UpdateFailed => {
                AppError::InternalServerError("Failed to update product".to_string())
            }
            ProductError::Database(_) => {
                AppError::InternalServerError("Database error".to_string())
            }
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}
