use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::MediaKind;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{category, component, item};
use crate::error::{AppError, ErrorBody, unique_violation_or};
use crate::extractors::auth::SessionUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::category::find_category;
use crate::handlers::media::store_thumbnail;
use crate::models::item::*;
use crate::models::shared::{
    Pagination, SortKey, normalize_description, page_params, search_pattern, sort_params,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Items",
    operation_id = "createItem",
    summary = "Create an item",
    description = "Creates a raw item. `category` is the slug of an existing category.",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(slug = %payload.slug))]
pub async fn create_item(
    _session: SessionUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_item(&payload)?;

    let txn = state.db.begin().await?;
    let category = find_category(&txn, &payload.category).await?;

    let new_item = item::ActiveModel {
        uid: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        description: Set(normalize_description(payload.description)),
        thumbnail: Set(None),
        price: Set(payload.price),
        amount: Set(payload.amount),
        measurement_unit: Set(payload.measurement_unit.trim().to_string()),
        category_id: Set(category.id),
        added: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_item
        .insert(&txn)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::new(model, category))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Items",
    operation_id = "listItems",
    summary = "List items",
    description = "Paginated item list. `category` restricts to one category slug; `search` matches the item name or its category's name case-insensitively.",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items", body = ItemListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, query))]
pub async fn list_items(
    _session: SessionUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ItemListQuery>,
) -> Result<Json<ItemListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page)?;
    let (sort_key, order) = sort_params(
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
        true,
    )?;

    let mut cond = Condition::all();
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        cond = cond.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col((item::Entity, item::Column::Name))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col((
                        category::Entity,
                        category::Column::Name,
                    ))))
                    .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }
    if let Some(ref slug) = query.category {
        cond = cond.add(category::Column::Slug.eq(slug.as_str()));
    }

    let total = item::Entity::find()
        .inner_join(category::Entity)
        .filter(cond.clone())
        .count(&state.db)
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let mut select = item::Entity::find()
        .find_also_related(category::Entity)
        .filter(cond);
    select = match sort_key {
        SortKey::Added => select.order_by(item::Column::Added, order.clone()),
        SortKey::Name => select.order_by(item::Column::Name, order.clone()),
    };

    let rows = select
        .order_by(item::Column::Uid, order)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(with_category)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ItemListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{uid}",
    tag = "Items",
    operation_id = "getItem",
    summary = "Get an item",
    params(("uid" = Uuid, Path, description = "Item uid")),
    responses(
        (status = 200, description = "Item", body = ItemResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_item(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let row = item::Entity::find_by_id(uid)
        .find_also_related(category::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(with_category(row)?))
}

#[utoipa::path(
    patch,
    path = "/{uid}",
    tag = "Items",
    operation_id = "updateItem",
    summary = "Update an item",
    description = "Partially updates an item. Send `null` for `description`, `price` or `amount` to clear them. An empty payload returns the current resource unchanged.",
    params(("uid" = Uuid, Path, description = "Item uid")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Item or category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload))]
pub async fn update_item(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    AppJson(payload): AppJson<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    validate_update_item(&payload)?;

    if payload == UpdateItemRequest::default() {
        let existing = find_item(&state.db, uid).await?;
        return Ok(Json(load_item_response(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;

    let existing = find_item_for_update(&txn, uid).await?;
    let mut active: item::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(normalize_description(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(amount) = payload.amount {
        active.amount = Set(amount);
    }
    if let Some(ref unit) = payload.measurement_unit {
        active.measurement_unit = Set(unit.trim().to_string());
    }
    if let Some(ref category_slug) = payload.category {
        let category = find_category(&txn, category_slug).await?;
        active.category_id = Set(category.id);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;
    let response = load_item_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{uid}",
    tag = "Items",
    operation_id = "deleteItem",
    summary = "Delete an item",
    description = "Deletes an item together with every product component that uses it.",
    params(("uid" = Uuid, Path, description = "Item uid")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_item(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_item_for_update(&txn, uid).await?;

    let removed = component::Entity::delete_many()
        .filter(component::Column::ItemUid.eq(uid))
        .exec(&txn)
        .await?;
    item::Entity::delete_by_id(uid).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(components = removed.rows_affected, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{uid}/thumbnail",
    tag = "Items",
    operation_id = "uploadItemThumbnail",
    summary = "Set an item's thumbnail",
    description = "Uploads an image as multipart field `file` and makes it the item's thumbnail.",
    params(("uid" = Uuid, Path, description = "Item uid")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Thumbnail set", body = ItemResponse),
        (status = 400, description = "Bad upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, multipart))]
pub async fn upload_item_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ItemResponse>, AppError> {
    let existing = find_item(&state.db, uid).await?;
    let path = store_thumbnail(&state, MediaKind::Item, &existing.slug, multipart).await?;

    let mut active: item::ActiveModel = existing.into();
    active.thumbnail = Set(Some(path));
    let model = active.update(&state.db).await?;

    Ok(Json(load_item_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{uid}/thumbnail",
    tag = "Items",
    operation_id = "clearItemThumbnail",
    summary = "Remove an item's thumbnail",
    params(("uid" = Uuid, Path, description = "Item uid")),
    responses(
        (status = 200, description = "Thumbnail cleared", body = ItemResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn clear_item_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let existing = find_item(&state.db, uid).await?;
    let mut active: item::ActiveModel = existing.into();
    active.thumbnail = Set(None);
    let model = active.update(&state.db).await?;

    Ok(Json(load_item_response(&state.db, model).await?))
}

/// Newest items first, for the dashboard.
pub(crate) async fn recent_items<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<ItemResponse>, AppError> {
    item::Entity::find()
        .find_also_related(category::Entity)
        .order_by_desc(item::Column::Added)
        .limit(Some(limit))
        .all(db)
        .await?
        .into_iter()
        .map(with_category)
        .collect()
}

pub(crate) async fn find_item<C: ConnectionTrait>(
    db: &C,
    uid: Uuid,
) -> Result<item::Model, AppError> {
    item::Entity::find_by_id(uid)
        .one(db)
        .await?
        .ok_or_else(item_not_found)
}

async fn find_item_for_update(
    txn: &DatabaseTransaction,
    uid: Uuid,
) -> Result<item::Model, AppError> {
    item::Entity::find_by_id(uid)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(item_not_found)
}

async fn load_item_response<C: ConnectionTrait>(
    db: &C,
    model: item::Model,
) -> Result<ItemResponse, AppError> {
    let category = category::Entity::find_by_id(model.category_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Item {} has no category", model.uid)))?;
    Ok(ItemResponse::new(model, category))
}

fn with_category(
    (model, category): (item::Model, Option<category::Model>),
) -> Result<ItemResponse, AppError> {
    let category =
        category.ok_or_else(|| AppError::Internal(format!("Item {} has no category", model.uid)))?;
    Ok(ItemResponse::new(model, category))
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found".into())
}
