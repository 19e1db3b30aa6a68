use serde::Serialize;

use super::item::ItemResponse;
use super::product::ProductResponse;
use super::production::ProductionResponse;

#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardCounts {
    pub categories: u64,
    pub items: u64,
    pub products: u64,
    pub productions: u64,
}

/// Landing view for a signed-in user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub username: String,
    pub counts: DashboardCounts,
    /// Newest items first.
    pub recent_items: Vec<ItemResponse>,
    pub recent_products: Vec<ProductResponse>,
    pub recent_productions: Vec<ProductionResponse>,
}
