use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Sort direction for product search.
///
/// Deserializes leniently: the literal string `desc` selects descending
/// order, any other value (or an absent field) selects ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == "desc" {
            Ok(SortOrder::Desc)
        } else {
            Ok(SortOrder::Asc)
        }
    }
}

/// Field to sort search results by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    #[default]
    Price,
    Name,
    CreatedAt,
}

impl SortField {
    /// Document field name this sort key maps to.
    pub fn field_name(&self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
        }
    }
}

/// Product entity - represents a product stored in MongoDB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Price in major currency units
    pub price: f64,
    /// Product description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Available color tags, in display order
    #[serde(default)]
    pub colors: Vec<String>,
    /// Storage-relative reference to the product image, absent when the
    /// product has no image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0, max = 500_000.0))]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

/// DTO for partially updating an existing product.
///
/// Only provided fields change; omitted fields retain their prior values.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, max = 500_000.0))]
    pub price: Option<f64>,
    pub description: Option<String>,
    pub colors: Option<Vec<String>>,
}

impl UpdateProduct {
    /// True when no field is set, i.e. the patch is a no-op.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.colors.is_none()
    }
}

/// Query filters for searching products.
///
/// All filters combine with logical AND; an absent filter imposes no
/// constraint on its dimension.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    /// Case-insensitive substring match on product name
    pub keyword: Option<String>,
    /// Minimum price (inclusive)
    pub min_price: Option<f64>,
    /// Maximum price (inclusive)
    pub max_price: Option<f64>,
    /// Sort direction; `desc` for descending, anything else ascending
    #[serde(default)]
    pub sort: SortOrder,
    /// Field to sort by (defaults to price)
    #[serde(default)]
    pub sort_by: SortField,
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of results to skip
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> i64 {
    50
}

impl Product {
    /// Create a new product from a CreateProduct DTO and an optional
    /// attachment reference.
    pub fn new(input: CreateProduct, image_ref: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            price: input.price,
            description: input.description,
            colors: input.colors,
            image_ref,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_desc_is_recognized() {
        let order: SortOrder = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(order, SortOrder::Desc);
    }

    #[test]
    fn sort_order_defaults_to_asc_for_anything_else() {
        for raw in ["\"asc\"", "\"DESC\"", "\"descending\"", "\"\""] {
            let order: SortOrder = serde_json::from_str(raw).unwrap();
            assert_eq!(order, SortOrder::Asc);
        }
    }

    #[test]
    fn filter_defaults() {
        let filter: ProductFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter.sort, SortOrder::Asc);
        assert_eq!(filter.sort_by, SortField::Price);
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.offset, 0);
        assert!(filter.keyword.is_none());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(UpdateProduct::default().is_empty());
        let patch = UpdateProduct {
            price: Some(150.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn new_product_gets_id_and_timestamps() {
        let input = CreateProduct {
            name: "Mug".to_string(),
            price: 100.0,
            description: None,
            colors: vec![],
        };
        let product = Product::new(input, None);
        assert!(!product.id.is_nil());
        assert!(product.image_ref.is_none());
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn create_product_validates_price_bounds() {
        let input = CreateProduct {
            name: "Mug".to_string(),
            price: 500_001.0,
            description: None,
            colors: vec![],
        };
        assert!(input.validate().is_err());

        let input = CreateProduct {
            name: "Mug".to_string(),
            price: -1.0,
            description: None,
            colors: vec![],
        };
        assert!(input.validate().is_err());
    }
}
