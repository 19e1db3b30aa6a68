use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{component, item, product};
use crate::error::AppError;

use super::shared::{QUANTITY, double_option, validate_optional_decimal};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateComponentRequest {
    /// Uid of the item this recipe line uses.
    pub item: Uuid,
    /// Quantity of the item per kilogram of product.
    #[schema(value_type = Option<String>, example = "0.65")]
    pub amount: Option<Decimal>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateComponentRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub amount: Option<Option<Decimal>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ComponentResponse {
    pub uid: Uuid,
    pub product_uid: Uuid,
    pub item_uid: Uuid,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[schema(example = "rye-loaf__rye-flour__relation")]
    pub label: String,
}

pub fn component_label(product_slug: &str, item_slug: &str) -> String {
    format!("{product_slug}__{item_slug}__relation")
}

impl ComponentResponse {
    pub fn new(c: component::Model, product: &product::Model, item: &item::Model) -> Self {
        Self {
            label: component_label(&product.slug, &item.slug),
            uid: c.uid,
            product_uid: c.product_uid,
            item_uid: c.item_uid,
            amount: c.amount,
        }
    }
}

pub fn validate_create_component(req: &CreateComponentRequest) -> Result<(), AppError> {
    validate_optional_decimal("amount", req.amount, QUANTITY)
}

pub fn validate_update_component(req: &UpdateComponentRequest) -> Result<(), AppError> {
    match req.amount {
        Some(amount) => validate_optional_decimal("amount", amount, QUANTITY),
        None => Ok(()),
    }
}
