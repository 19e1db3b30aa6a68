use chrono::{DateTime, Utc};
use common::Timestamped;
use serde::{Deserialize, Serialize};

use crate::entity::category;
use crate::error::AppError;

use super::shared::{Pagination, validate_name, validate_slug};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Flours")]
    pub name: String,
    #[schema(example = "flours")]
    pub slug: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Compact category reference embedded in item and product responses.
#[derive(Serialize, Clone, utoipa::ToSchema)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    /// Location of the thumbnail, empty when none is set.
    pub thumbnail_url: String,
    pub added: DateTime<Utc>,
    /// Added within the last 24 hours.
    pub was_added_recently: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryListResponse {
    pub data: Vec<CategoryResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    /// `added` (default) or `name`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            thumbnail_url: m.thumbnail_url(),
            was_added_recently: m.was_added_recently(),
            id: m.id,
            name: m.name,
            slug: m.slug,
            added: m.added,
        }
    }
}

impl From<category::Model> for CategorySummary {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

pub fn validate_create_category(req: &CreateCategoryRequest) -> Result<(), AppError> {
    validate_name(&req.name)?;
    validate_slug(&req.slug)
}

pub fn validate_update_category(req: &UpdateCategoryRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name(name)?;
    }
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    Ok(())
}
