use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, item, product, production};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::SessionUser;
use crate::handlers::auth::LOGIN_PATH;
use crate::handlers::item::recent_items;
use crate::handlers::product::recent_products;
use crate::handlers::production::recent_productions;
use crate::models::dashboard::{DashboardCounts, DashboardResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Dashboard",
    operation_id = "getDashboard",
    summary = "Signed-in landing view",
    description = "Returns the newest items, products and production runs (newest first, capped by `dashboard.recent_limit`) together with entity counts. Requests without a valid session are redirected to the login entry point.",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponse),
        (status = 303, description = "No valid session; redirected to login"),
        (status = 500, description = "Internal error (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, session))]
pub async fn dashboard(
    session: Result<SessionUser, AppError>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(?e, "Dashboard requested without a session");
            return Ok(Redirect::to(LOGIN_PATH).into_response());
        }
    };

    let limit = state.config.dashboard.recent_limit;
    let db = &state.db;

    let counts = DashboardCounts {
        categories: category::Entity::find().count(db).await?,
        items: item::Entity::find().count(db).await?,
        products: product::Entity::find().count(db).await?,
        productions: production::Entity::find().count(db).await?,
    };

    Ok(Json(DashboardResponse {
        username: session.username,
        counts,
        recent_items: recent_items(db, limit).await?,
        recent_products: recent_products(db, limit).await?,
        recent_productions: recent_productions(db, limit).await?,
    })
    .into_response())
}
