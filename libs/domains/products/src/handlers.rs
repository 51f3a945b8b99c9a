//! HTTP handlers for the Products API
//!
//! Create and update accept `multipart/form-data` so a product's fields
//! and its optional image travel in one request. The image is staged to
//! disk here, at the upload boundary, before the catalog is invoked.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, InternalServerErrorResponse,
        NotFoundResponse, PayloadTooLargeResponse,
    },
    UuidPath,
};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::attachments::MAX_IMAGE_SIZE;
use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, Product, ProductFilter, SortField, SortOrder, UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductCatalog;

/// Headroom on top of the image limit for the other form fields.
const FORM_OVERHEAD: usize = 64 * 1024;

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        search_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            Product, CreateProduct, UpdateProduct, ProductFilter,
            ProductForm, SortOrder, SortField
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            PayloadTooLargeResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(catalog: ProductCatalog<R>) -> Router {
    let shared_catalog = Arc::new(catalog);

    Router::new()
        .route("/", get(search_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + FORM_OVERHEAD))
        .with_state(shared_catalog)
}

/// Multipart form schema for creating and updating products.
///
/// Documentation-only: the handlers parse the form manually field by
/// field so the image bytes can be staged before the catalog runs.
#[derive(ToSchema)]
#[allow(dead_code)]
struct ProductForm {
    name: Option<String>,
    price: Option<f64>,
    description: Option<String>,
    /// Comma-separated color tags
    colors: Option<String>,
    /// Product image file (max 5 MiB)
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

/// Parsed multipart form fields; every field is optional at this level
/// and create/update decide what is required.
#[derive(Default)]
struct ProductFormData {
    name: Option<String>,
    price: Option<f64>,
    description: Option<String>,
    colors: Option<Vec<String>>,
    image: Option<(String, axum::body::Bytes)>,
}

fn bad_multipart(err: MultipartError) -> ProductError {
    ProductError::Validation(format!("Malformed multipart request: {err}"))
}

async fn collect_form(multipart: &mut Multipart) -> ProductResult<ProductFormData> {
    let mut form = ProductFormData::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "name" => form.name = Some(field.text().await.map_err(bad_multipart)?),
            "price" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let price = raw.trim().parse::<f64>().map_err(|_| {
                    ProductError::Validation(format!("price must be a number, got '{raw}'"))
                })?;
                form.price = Some(price);
            }
            "description" => {
                form.description = Some(field.text().await.map_err(bad_multipart)?);
            }
            "colors" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                form.colors.get_or_insert_with(Vec::new).extend(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                );
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("image.bin").to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.image = Some((file_name, bytes));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Search products with optional keyword, price bounds, and sort
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Matching products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn search_products<R: ProductRepository>(
    State(catalog): State<Arc<ProductCatalog<R>>>,
    Query(filter): Query<ProductFilter>,
) -> ProductResult<Json<Vec<Product>>> {
    let products = catalog.search(filter).await?;
    Ok(Json(products))
}

/// Create a new product, optionally with an image attachment
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(catalog): State<Arc<ProductCatalog<R>>>,
    mut multipart: Multipart,
) -> ProductResult<impl IntoResponse> {
    let form = collect_form(&mut multipart).await?;

    let input = CreateProduct {
        name: form
            .name
            .ok_or_else(|| ProductError::Validation("name is required".to_string()))?,
        price: form
            .price
            .ok_or_else(|| ProductError::Validation("price is required".to_string()))?,
        description: form.description,
        colors: form.colors.unwrap_or_default(),
    };

    let staged = match form.image {
        Some((file_name, bytes)) => Some(catalog.attachments().stage(&file_name, &bytes).await?),
        None => None,
    };

    let product = catalog.create(input, staged).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(catalog): State<Arc<ProductCatalog<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Product>> {
    let product = catalog.get(id).await?;
    Ok(Json(product))
}

/// Partially update a product, optionally replacing its image
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated successfully", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(catalog): State<Arc<ProductCatalog<R>>>,
    UuidPath(id): UuidPath,
    mut multipart: Multipart,
) -> ProductResult<Json<Product>> {
    let form = collect_form(&mut multipart).await?;

    let patch = UpdateProduct {
        name: form.name,
        price: form.price,
        description: form.description,
        colors: form.colors,
    };

    let staged = match form.image {
        Some((file_name, bytes)) => Some(catalog.attachments().stage(&file_name, &bytes).await?),
        None => None,
    };

    let product = catalog.update(id, patch, staged).await?;
    Ok(Json(product))
}

/// Delete a product and its image attachment
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = Product),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(catalog): State<Arc<ProductCatalog<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Product>> {
    let product = catalog.remove(id).await?;
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::AttachmentStore;
    use crate::repository::MockProductRepository;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "test-boundary";

    fn app(repo: MockProductRepository) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("uploads");
        std::fs::create_dir_all(&root).unwrap();
        let catalog = ProductCatalog::new(repo, AttachmentStore::new(root));
        (dir, router(catalog))
    }

    fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, method: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sample_product() -> Product {
        Product::new(
            CreateProduct {
                name: "Mug".to_string(),
                price: 100.0,
                description: None,
                colors: vec![],
            },
            None,
        )
    }

    #[tokio::test]
    async fn create_without_image_returns_created() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert().returning(|p| Ok(p));
        let (_dir, app) = app(repo);

        let body = multipart_body(&[("name", "Mug"), ("price", "100")], None);
        let response = app
            .oneshot(multipart_request("/", "POST", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        assert_eq!(json["name"], "Mug");
        assert_eq!(json["price"], 100.0);
        assert!(json.get("image_ref").is_none());
    }

    #[tokio::test]
    async fn create_with_image_stages_and_commits_reference() {
        let mut repo = MockProductRepository::new();
        repo.expect_insert().returning(|p| Ok(p));
        let (dir, app) = app(repo);

        let body = multipart_body(
            &[("name", "Mug"), ("price", "100"), ("colors", "red, blue")],
            Some(("mug.jpg", b"image-bytes")),
        );
        let response = app
            .oneshot(multipart_request("/", "POST", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        let reference = json["image_ref"].as_str().unwrap();
        assert!(reference.starts_with("products/"));
        assert!(reference.ends_with(".jpg"));
        assert!(dir.path().join("uploads").join(reference).exists());
        assert_eq!(json["colors"], serde_json::json!(["red", "blue"]));
    }

    #[tokio::test]
    async fn create_without_name_is_rejected() {
        let repo = MockProductRepository::new();
        let (_dir, app) = app(repo);

        let body = multipart_body(&[("price", "100")], None);
        let response = app
            .oneshot(multipart_request("/", "POST", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_with_non_numeric_price_is_rejected() {
        let repo = MockProductRepository::new();
        let (_dir, app) = app(repo);

        let body = multipart_body(&[("name", "Mug"), ("price", "cheap")], None);
        let response = app
            .oneshot(multipart_request("/", "POST", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_passes_filters_through() {
        let mut repo = MockProductRepository::new();
        repo.expect_find()
            .withf(|filter| {
                filter.keyword.as_deref() == Some("mug")
                    && filter.min_price == Some(10.0)
                    && filter.max_price == Some(20.0)
                    && filter.sort == SortOrder::Desc
            })
            .returning(|_| Ok(vec![]));
        let (_dir, app) = app(repo);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/?keyword=mug&min_price=10&max_price=20&sort=desc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn get_unknown_product_is_404() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        let (_dir, app) = app(repo);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_with_invalid_uuid_is_400() {
        let repo = MockProductRepository::new();
        let (_dir, app) = app(repo);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_applies_partial_patch() {
        let existing = sample_product();
        let id = existing.id;
        let mut repo = MockProductRepository::new();
        let loaded = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(loaded.clone())));
        repo.expect_update_by_id()
            .withf(move |&got, patch, image_ref| {
                got == id && patch.price == Some(150.0) && patch.name.is_none() && image_ref.is_none()
            })
            .returning(move |_, patch, _| {
                let mut updated = existing.clone();
                updated.price = patch.price.unwrap_or(updated.price);
                Ok(Some(updated))
            });
        let (_dir, app) = app(repo);

        let body = multipart_body(&[("price", "150")], None);
        let response = app
            .oneshot(multipart_request(&format!("/{id}"), "PUT", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["price"], 150.0);
        assert_eq!(json["name"], "Mug");
    }

    #[tokio::test]
    async fn delete_returns_removed_product() {
        let existing = sample_product();
        let id = existing.id;
        let mut repo = MockProductRepository::new();
        repo.expect_delete_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        let (_dir, app) = app(repo);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["_id"], id.to_string());
    }

    #[tokio::test]
    async fn delete_unknown_product_is_404() {
        let mut repo = MockProductRepository::new();
        repo.expect_delete_by_id().returning(|_| Ok(None));
        let (_dir, app) = app(repo);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
