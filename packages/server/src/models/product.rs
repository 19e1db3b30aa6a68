use chrono::{DateTime, Utc};
use common::Timestamped;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{category, component, item, product};
use crate::error::AppError;

use super::category::CategorySummary;
use super::shared::{
    PRICE, Pagination, double_option, validate_description, validate_name,
    validate_non_negative, validate_optional_decimal, validate_slug,
};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[schema(example = "Rye loaf")]
    pub name: String,
    #[schema(example = "rye-loaf")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "4.20")]
    pub price: Option<Decimal>,
    /// Units in stock.
    #[serde(default)]
    #[schema(example = 12)]
    pub units: i64,
    /// Slug of an existing category.
    #[schema(example = "breads")]
    pub category: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Option<Decimal>>,
    pub units: Option<i64>,
    pub category: Option<String>,
}

/// One line of a product's recipe.
#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct CompositionEntry {
    pub component_uid: Uuid,
    pub item_uid: Uuid,
    pub item_name: String,
    pub item_slug: String,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
}

impl CompositionEntry {
    pub fn new(c: component::Model, item: item::Model) -> Self {
        Self {
            component_uid: c.uid,
            item_uid: item.uid,
            item_name: item.name,
            item_slug: item.slug,
            amount: c.amount,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub uid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub units: i64,
    pub category: CategorySummary,
    pub composition: Vec<CompositionEntry>,
    /// Item names of the composition joined with ", ".
    #[schema(example = "Rye flour, Water, Salt")]
    pub display_composition: String,
    pub added: DateTime<Utc>,
    pub was_added_recently: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the product name or its category's name.
    pub search: Option<String>,
    /// Restrict to the category with this slug.
    pub category: Option<String>,
    /// `added` (default) or `name`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

/// Item names of a composition in recipe order, joined with ", ".
pub fn display_composition(composition: &[CompositionEntry]) -> String {
    composition
        .iter()
        .map(|c| c.item_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProductResponse {
    pub fn new(
        m: product::Model,
        category: category::Model,
        composition: Vec<CompositionEntry>,
    ) -> Self {
        Self {
            thumbnail_url: m.thumbnail_url(),
            was_added_recently: m.was_added_recently(),
            display_composition: display_composition(&composition),
            uid: m.uid,
            name: m.name,
            slug: m.slug,
            description: m.description,
            price: m.price,
            units: m.units,
            category: category.into(),
            composition,
            added: m.added,
        }
    }
}

pub fn validate_create_product(req: &CreateProductRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_slug(&req.slug)?;
    validate_description(req.description.as_deref())?;
    validate_optional_decimal("price", req.price, PRICE)?;
    validate_non_negative("units", req.units)
}

pub fn validate_update_product(req: &UpdateProductRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    if let Some(ref desc) = req.description {
        validate_description(desc.as_deref())?;
    }
    if let Some(price) = req.price {
        validate_optional_decimal("price", price, PRICE)?;
    }
    if let Some(units) = req.units {
        validate_non_negative("units", units)?;
    }
    Ok(())
}
