use chrono::{DateTime, Utc};
use common::Timestamped;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{product, production, production_detail};
use crate::error::AppError;

use super::shared::{Pagination, validate_non_negative};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProductionDetailRequest {
    /// Uid of the product that was made.
    pub product: Uuid,
    #[schema(example = 40)]
    pub produced_units: i64,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateProductionRequest {
    /// Lines created together with the run.
    #[serde(default)]
    pub details: Vec<CreateProductionDetailRequest>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProductionDetailRequest {
    pub produced_units: Option<i64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductionDetailResponse {
    pub uid: Uuid,
    pub production_uid: Uuid,
    pub product_uid: Uuid,
    pub product_name: String,
    pub product_slug: String,
    pub produced_units: i64,
    pub label: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductionResponse {
    pub uid: Uuid,
    #[schema(example = "production_3f2b8c1e-5a0d-4f7e-9c61-2b7d0e4a9f10")]
    pub label: String,
    pub added: DateTime<Utc>,
    pub was_added_recently: bool,
    /// Distinct product names of the run joined with ", ".
    #[schema(example = "Rye loaf, Baguette")]
    pub display_products: String,
    pub details: Vec<ProductionDetailResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProductionListResponse {
    pub data: Vec<ProductionResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductionListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// `asc` or `desc` (default) on the creation time.
    pub sort_order: Option<String>,
}

pub fn production_label(uid: Uuid) -> String {
    format!("production_{uid}")
}

pub fn detail_label(production_uid: Uuid, product_slug: &str) -> String {
    format!("production_{production_uid}__{product_slug}_detail")
}

/// Names of the products in a run, first occurrence wins.
pub fn display_products<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen.join(", ")
}

impl ProductionDetailResponse {
    pub fn new(d: production_detail::Model, product: &product::Model) -> Self {
        Self {
            label: detail_label(d.production_uid, &product.slug),
            uid: d.uid,
            production_uid: d.production_uid,
            product_uid: d.product_uid,
            product_name: product.name.clone(),
            product_slug: product.slug.clone(),
            produced_units: d.produced_units,
        }
    }
}

impl ProductionResponse {
    pub fn new(m: production::Model, details: Vec<ProductionDetailResponse>) -> Self {
        Self {
            label: production_label(m.uid),
            was_added_recently: m.was_added_recently(),
            display_products: display_products(details.iter().map(|d| d.product_name.as_str())),
            uid: m.uid,
            added: m.added,
            details,
        }
    }
}

pub fn validate_create_production_detail(
    req: &CreateProductionDetailRequest,
) -> Result<(), AppError> {
    validate_non_negative("produced_units", req.produced_units)
}

pub fn validate_create_production(req: &CreateProductionRequest) -> Result<(), AppError> {
    req.details
        .iter()
        .try_for_each(validate_create_production_detail)
}

pub fn validate_update_production_detail(
    req: &UpdateProductionDetailRequest,
) -> Result<(), AppError> {
    match req.produced_units {
        Some(units) => validate_non_negative("produced_units", units),
        None => Ok(()),
    }
}
