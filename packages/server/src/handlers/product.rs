use std::collections::HashMap;

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

use crate::entity::{category, component, item, product, production_detail};
use crate::error::{AppError, ErrorBody, unique_violation_or};
use crate::extractors::auth::SessionUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::category::find_category;
use crate::handlers::media::store_thumbnail;
use crate::models::product::*;
use crate::models::shared::{
    Pagination, SortKey, normalize_description, page_params, search_pattern, sort_params,
};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Creates a product with an empty composition. `category` is the slug of an existing category. Add recipe lines through the components sub-resource.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(slug = %payload.slug))]
pub async fn create_product(
    _session: SessionUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_product(&payload)?;

    let txn = state.db.begin().await?;
    let category = find_category(&txn, &payload.category).await?;

    let new_product = product::ActiveModel {
        uid: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        description: Set(normalize_description(payload.description)),
        thumbnail: Set(None),
        price: Set(payload.price),
        units: Set(payload.units),
        category_id: Set(category.id),
        added: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_product
        .insert(&txn)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(model, category, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List products",
    description = "Paginated product list including each product's composition. `category` restricts to one category slug; `search` matches the product name or its category's name case-insensitively.",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products", body = ProductListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, query))]
pub async fn list_products(
    _session: SessionUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductListQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
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
                    Expr::expr(Func::lower(Expr::col((
                        product::Entity,
                        product::Column::Name,
                    ))))
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

    let total = product::Entity::find()
        .inner_join(category::Entity)
        .filter(cond.clone())
        .count(&state.db)
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let mut select = product::Entity::find()
        .find_also_related(category::Entity)
        .filter(cond);
    select = match sort_key {
        SortKey::Added => select.order_by(product::Column::Added, order.clone()),
        SortKey::Name => select.order_by(product::Column::Name, order.clone()),
    };

    let rows = select
        .order_by(product::Column::Uid, order)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = with_compositions(&state.db, rows).await?;
    Ok(Json(ProductListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{uid}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product",
    params(("uid" = Uuid, Path, description = "Product uid")),
    responses(
        (status = 200, description = "Product with its composition", body = ProductResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_product(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let existing = find_product(&state.db, uid).await?;
    Ok(Json(load_product_response(&state.db, existing).await?))
}

#[utoipa::path(
    patch,
    path = "/{uid}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Partially updates a product. Send `null` for `description` or `price` to clear them. The composition is managed through the components sub-resource. An empty payload returns the current resource unchanged.",
    params(("uid" = Uuid, Path, description = "Product uid")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product or category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload))]
pub async fn update_product(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    validate_update_product(&payload)?;

    if payload == UpdateProductRequest::default() {
        let existing = find_product(&state.db, uid).await?;
        return Ok(Json(load_product_response(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;

    let existing = find_product_for_update(&txn, uid).await?;
    let mut active: product::ActiveModel = existing.into();

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
    if let Some(units) = payload.units {
        active.units = Set(units);
    }
    if let Some(ref category_slug) = payload.category {
        let category = find_category(&txn, category_slug).await?;
        active.category_id = Set(category.id);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;
    let response = load_product_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{uid}",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes a product together with its components and every production detail that references it.",
    params(("uid" = Uuid, Path, description = "Product uid")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_product(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_product_for_update(&txn, uid).await?;

    let components = component::Entity::delete_many()
        .filter(component::Column::ProductUid.eq(uid))
        .exec(&txn)
        .await?;
    let details = production_detail::Entity::delete_many()
        .filter(production_detail::Column::ProductUid.eq(uid))
        .exec(&txn)
        .await?;
    product::Entity::delete_by_id(uid).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        components = components.rows_affected,
        details = details.rows_affected,
        "Product deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{uid}/thumbnail",
    tag = "Products",
    operation_id = "uploadProductThumbnail",
    summary = "Set a product's thumbnail",
    description = "Uploads an image as multipart field `file` and makes it the product's thumbnail.",
    params(("uid" = Uuid, Path, description = "Product uid")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Thumbnail set", body = ProductResponse),
        (status = 400, description = "Bad upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, multipart))]
pub async fn upload_product_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let existing = find_product(&state.db, uid).await?;
    let path = store_thumbnail(&state, MediaKind::Product, &existing.slug, multipart).await?;

    let mut active: product::ActiveModel = existing.into();
    active.thumbnail = Set(Some(path));
    let model = active.update(&state.db).await?;

    Ok(Json(load_product_response(&state.db, model).await?))
}

#[utoipa::path(
    delete,
    path = "/{uid}/thumbnail",
    tag = "Products",
    operation_id = "clearProductThumbnail",
    summary = "Remove a product's thumbnail",
    params(("uid" = Uuid, Path, description = "Product uid")),
    responses(
        (status = 200, description = "Thumbnail cleared", body = ProductResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn clear_product_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let existing = find_product(&state.db, uid).await?;
    let mut active: product::ActiveModel = existing.into();
    active.thumbnail = Set(None);
    let model = active.update(&state.db).await?;

    Ok(Json(load_product_response(&state.db, model).await?))
}

/// Newest products first, for the dashboard.
pub(crate) async fn recent_products<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<ProductResponse>, AppError> {
    let rows = product::Entity::find()
        .find_also_related(category::Entity)
        .order_by_desc(product::Column::Added)
        .limit(Some(limit))
        .all(db)
        .await?;
    with_compositions(db, rows).await
}

/// Recipe lines of the given products, keyed by product uid, ordered by item name.
async fn load_compositions<C: ConnectionTrait>(
    db: &C,
    product_uids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<CompositionEntry>>, AppError> {
    if product_uids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = component::Entity::find()
        .filter(component::Column::ProductUid.is_in(product_uids.iter().copied()))
        .find_also_related(item::Entity)
        .order_by_asc(item::Column::Name)
        .order_by_asc(component::Column::Uid)
        .all(db)
        .await?;

    let mut map: HashMap<Uuid, Vec<CompositionEntry>> = HashMap::new();
    for (c, item) in rows {
        let Some(item) = item else {
            continue;
        };
        map.entry(c.product_uid)
            .or_default()
            .push(CompositionEntry::new(c, item));
    }
    Ok(map)
}

async fn with_compositions<C: ConnectionTrait>(
    db: &C,
    rows: Vec<(product::Model, Option<category::Model>)>,
) -> Result<Vec<ProductResponse>, AppError> {
    let uids: Vec<Uuid> = rows.iter().map(|(p, _)| p.uid).collect();
    let mut compositions = load_compositions(db, &uids).await?;

    rows.into_iter()
        .map(|(model, category)| -> Result<ProductResponse, AppError> {
            let category = category.ok_or_else(|| {
                AppError::Internal(format!("Product {} has no category", model.uid))
            })?;
            let composition = compositions.remove(&model.uid).unwrap_or_default();
            Ok(ProductResponse::new(model, category, composition))
        })
        .collect()
}

async fn load_product_response<C: ConnectionTrait>(
    db: &C,
    model: product::Model,
) -> Result<ProductResponse, AppError> {
    let category = category::Entity::find_by_id(model.category_id)
        .one(db)
        .await?;
    let mut responses = with_compositions(db, vec![(model, category)]).await?;
    responses
        .pop()
        .ok_or_else(|| AppError::Internal("Product response missing".into()))
}

pub(crate) async fn find_product<C: ConnectionTrait>(
    db: &C,
    uid: Uuid,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(uid)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

pub(crate) async fn find_product_for_update(
    txn: &DatabaseTransaction,
    uid: Uuid,
) -> Result<product::Model, AppError> {
    product::Entity::find_by_id(uid)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}
