use chrono::{DateTime, Utc};
use common::Timestamped;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{category, item};
use crate::error::AppError;

use super::category::CategorySummary;
use super::shared::{
    MAX_UNIT_LENGTH, PRICE, Pagination, QUANTITY, double_option, validate_description,
    validate_name, validate_optional_decimal, validate_slug,
};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateItemRequest {
    #[schema(example = "Rye flour")]
    pub name: String,
    #[schema(example = "rye-flour")]
    pub slug: String,
    pub description: Option<String>,
    /// Up to 11 digits, 2 after the point.
    #[schema(value_type = Option<String>, example = "3.49")]
    pub price: Option<Decimal>,
    /// Stock on hand; up to 8 digits, 2 after the point.
    #[schema(value_type = Option<String>, example = "25.00")]
    pub amount: Option<Decimal>,
    #[schema(example = "kg")]
    pub measurement_unit: String,
    /// Slug of an existing category.
    #[schema(example = "flours")]
    pub category: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Option<Decimal>>,
    pub measurement_unit: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemResponse {
    pub uid: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub thumbnail_url: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub measurement_unit: String,
    pub category: CategorySummary,
    pub added: DateTime<Utc>,
    pub was_added_recently: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemListResponse {
    pub data: Vec<ItemResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the item name or its category's name.
    pub search: Option<String>,
    /// Restrict to the category with this slug.
    pub category: Option<String>,
    /// `added` (default) or `name`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

impl ItemResponse {
    pub fn new(m: item::Model, category: category::Model) -> Self {
        Self {
            thumbnail_url: m.thumbnail_url(),
            was_added_recently: m.was_added_recently(),
            uid: m.uid,
            name: m.name,
            slug: m.slug,
            description: m.description,
            price: m.price,
            amount: m.amount,
            measurement_unit: m.measurement_unit,
            category: category.into(),
            added: m.added,
        }
    }
}

fn validate_measurement_unit(unit: &str) -> Result<(), AppError> {
    let unit = unit.trim();
    if unit.is_empty() || unit.chars().count() > MAX_UNIT_LENGTH {
        return Err(AppError::field(
            "measurement_unit",
            format!("Measurement unit must be 1-{MAX_UNIT_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_create_item(req: &CreateItemRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_slug(&req.slug)?;
    validate_description(req.description.as_deref())?;
    validate_optional_decimal("price", req.price, PRICE)?;
    validate_optional_decimal("amount", req.amount, QUANTITY)?;
    validate_measurement_unit(&req.measurement_unit)
}

pub fn validate_update_item(req: &UpdateItemRequest) -> Result<(), AppError> {
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
    if let Some(amount) = req.amount {
        validate_optional_decimal("amount", amount, QUANTITY)?;
    }
    if let Some(ref unit) = req.measurement_unit {
        validate_measurement_unit(unit)?;
    }
    Ok(())
}
