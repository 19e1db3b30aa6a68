use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{component, item, product};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::SessionUser;
use crate::extractors::json::AppJson;
use crate::handlers::item::find_item;
use crate::handlers::product::{find_product, find_product_for_update};
use crate::models::component::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/{uid}/components",
    tag = "Components",
    operation_id = "createComponent",
    summary = "Add an item to a product's composition",
    description = "Creates a recipe line linking the product to an existing item. `amount` is the item quantity per kilogram of product.",
    params(("uid" = Uuid, Path, description = "Product uid")),
    request_body = CreateComponentRequest,
    responses(
        (status = 201, description = "Component created", body = ComponentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product or item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(item = %payload.item))]
pub async fn create_component(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(product_uid): Path<Uuid>,
    AppJson(payload): AppJson<CreateComponentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_component(&payload)?;

    let txn = state.db.begin().await?;
    let product = find_product_for_update(&txn, product_uid).await?;
    let item = find_item(&txn, payload.item).await?;

    let model = component::ActiveModel {
        uid: Set(Uuid::new_v4()),
        product_uid: Set(product.uid),
        item_uid: Set(item.uid),
        amount: Set(payload.amount),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ComponentResponse::new(model, &product, &item)),
    ))
}

#[utoipa::path(
    get,
    path = "/{uid}/components",
    tag = "Components",
    operation_id = "listComponents",
    summary = "List a product's components",
    params(("uid" = Uuid, Path, description = "Product uid")),
    responses(
        (status = 200, description = "Components ordered by item name", body = Vec<ComponentResponse>),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn list_components(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(product_uid): Path<Uuid>,
) -> Result<Json<Vec<ComponentResponse>>, AppError> {
    let product = find_product(&state.db, product_uid).await?;

    let rows = component::Entity::find()
        .filter(component::Column::ProductUid.eq(product_uid))
        .find_also_related(item::Entity)
        .order_by_asc(item::Column::Name)
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .filter_map(|(c, item)| item.map(|item| ComponentResponse::new(c, &product, &item)))
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{uid}",
    tag = "Components",
    operation_id = "getComponent",
    summary = "Get a component",
    params(("uid" = Uuid, Path, description = "Component uid")),
    responses(
        (status = 200, description = "Component", body = ComponentResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_component(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ComponentResponse>, AppError> {
    let model = find_component(&state.db, uid).await?;
    Ok(Json(load_component_response(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{uid}",
    tag = "Components",
    operation_id = "updateComponent",
    summary = "Change a component's amount",
    description = "Only `amount` is updatable; send `null` to clear it.",
    params(("uid" = Uuid, Path, description = "Component uid")),
    request_body = UpdateComponentRequest,
    responses(
        (status = 200, description = "Component updated", body = ComponentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload))]
pub async fn update_component(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    AppJson(payload): AppJson<UpdateComponentRequest>,
) -> Result<Json<ComponentResponse>, AppError> {
    validate_update_component(&payload)?;

    let existing = find_component(&state.db, uid).await?;
    let Some(amount) = payload.amount else {
        return Ok(Json(load_component_response(&state.db, existing).await?));
    };

    let mut active: component::ActiveModel = existing.into();
    active.amount = Set(amount);
    let model = active.update(&state.db).await?;

    Ok(Json(load_component_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{uid}",
    tag = "Components",
    operation_id = "deleteComponent",
    summary = "Remove a component",
    params(("uid" = Uuid, Path, description = "Component uid")),
    responses(
        (status = 204, description = "Component deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Component not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_component(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = component::Entity::delete_by_id(uid).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(component_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn find_component<C: ConnectionTrait>(
    db: &C,
    uid: Uuid,
) -> Result<component::Model, AppError> {
    component::Entity::find_by_id(uid)
        .one(db)
        .await?
        .ok_or_else(component_not_found)
}

async fn load_component_response<C: ConnectionTrait>(
    db: &C,
    model: component::Model,
) -> Result<ComponentResponse, AppError> {
    let product = product::Entity::find_by_id(model.product_uid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Component {} has no product", model.uid)))?;
    let item = item::Entity::find_by_id(model.item_uid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Component {} has no item", model.uid)))?;
    Ok(ComponentResponse::new(model, &product, &item))
}

fn component_not_found() -> AppError {
    AppError::NotFound("Component not found".into())
}
