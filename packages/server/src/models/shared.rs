use rust_decimal::Decimal;
use sea_orm::Order;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of entries per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching entries across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }

    /// Row offset of the first entry on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// Highest page number a list endpoint accepts.
pub const MAX_PAGE: u64 = 1_000_000;

/// Normalise raw `page` / `per_page` query values (defaults 1 and 20, `per_page` capped at 100).
/// Pages beyond [`MAX_PAGE`] are rejected.
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> Result<(u64, u64), AppError> {
    let page = Ord::max(page.unwrap_or(1), 1);
    if page > MAX_PAGE {
        return Err(AppError::field("page", format!("page must be at most {MAX_PAGE}")));
    }
    Ok((page, per_page.unwrap_or(20).clamp(1, 100)))
}

/// Sort key shared by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Added,
    Name,
}

/// Parse `sort_by` / `sort_order`; defaults to newest first.
pub fn sort_params(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
    allow_name: bool,
) -> Result<(SortKey, Order), AppError> {
    let key = match sort_by.unwrap_or("added") {
        "added" => SortKey::Added,
        "name" if allow_name => SortKey::Name,
        _ if allow_name => {
            return Err(AppError::field("sort_by", "sort_by must be one of: added, name"));
        }
        _ => return Err(AppError::field("sort_by", "sort_by must be: added")),
    };
    let order = match sort_order {
        None if key == SortKey::Added => Order::Desc,
        None | Some("asc") => Order::Asc,
        Some("desc") => Order::Desc,
        Some(_) => {
            return Err(AppError::field(
                "sort_order",
                "sort_order must be one of: asc, desc",
            ));
        }
    };
    Ok((key, order))
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Lower-cased `%term%` pattern for a search string, or `None` if it is blank.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = escape_like(search?.trim());
    (!term.is_empty()).then(|| format!("%{}%", term.to_lowercase()))
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 300;
pub const MAX_UNIT_LENGTH: usize = 100;

/// Validate a trimmed display name (1-255 characters).
pub fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::field(
            "name",
            format!("Name must be 1-{MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    common::slug::validate_slug(slug)
        .map(|_| ())
        .map_err(|e| AppError::field("slug", e.message()))
}

/// Validate an optional free-text description (at most 300 characters).
pub fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    if let Some(desc) = description
        && desc.trim().chars().count() > MAX_DESCRIPTION_LENGTH
    {
        return Err(AppError::field(
            "description",
            format!("Description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        ));
    }
    Ok(())
}

/// Trimmed description, with blank strings stored as NULL.
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Precision of a fixed-point column: total digits and digits after the point.
#[derive(Debug, Clone, Copy)]
pub struct Precision {
    pub max_digits: u32,
    pub decimal_places: u32,
}

/// Monetary values: up to 11 digits, 2 of them fractional.
pub const PRICE: Precision = Precision {
    max_digits: 11,
    decimal_places: 2,
};

/// Quantities: up to 8 digits, 2 of them fractional.
pub const QUANTITY: Precision = Precision {
    max_digits: 8,
    decimal_places: 2,
};

/// Check that a decimal is non-negative and fits the column precision.
pub fn validate_decimal(
    field: &'static str,
    value: Decimal,
    precision: Precision,
) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::field(field, format!("{field} must be non-negative")));
    }
    if value.normalize().scale() > precision.decimal_places {
        return Err(AppError::field(
            field,
            format!(
                "{field} must have at most {} decimal places",
                precision.decimal_places
            ),
        ));
    }
    let integer_digits = precision.max_digits - precision.decimal_places;
    if value.trunc() >= Decimal::from(10u64.pow(integer_digits)) {
        return Err(AppError::field(
            field,
            format!("{field} must have at most {integer_digits} digits before the decimal point"),
        ));
    }
    Ok(())
}

pub fn validate_optional_decimal(
    field: &'static str,
    value: Option<Decimal>,
    precision: Precision,
) -> Result<(), AppError> {
    match value {
        Some(v) => validate_decimal(field, v, precision),
        None => Ok(()),
    }
}

/// Validate a count that must not be negative.
pub fn validate_non_negative(field: &'static str, value: i64) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::field(field, format!("{field} must be >= 0")));
    }
    Ok(())
}
