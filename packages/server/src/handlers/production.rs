use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{product, production, production_detail};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::SessionUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::product::find_product;
use crate::models::production::*;
use crate::models::shared::{Pagination, page_params, sort_params};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Productions",
    operation_id = "createProduction",
    summary = "Record a production run",
    description = "Creates a production run, optionally with its detail lines in the same transaction. Every referenced product must exist.",
    request_body = CreateProductionRequest,
    responses(
        (status = 201, description = "Production created", body = ProductionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(lines = payload.details.len()))]
pub async fn create_production(
    _session: SessionUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProductionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_production(&payload)?;

    let txn = state.db.begin().await?;

    let model = production::ActiveModel {
        uid: Set(Uuid::new_v4()),
        added: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut details = Vec::with_capacity(payload.details.len());
    for line in payload.details {
        let product = find_product(&txn, line.product).await?;
        let detail = insert_detail(&txn, model.uid, &product, line.produced_units).await?;
        details.push(ProductionDetailResponse::new(detail, &product));
    }

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductionResponse::new(model, details)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Productions",
    operation_id = "listProductions",
    summary = "List production runs",
    description = "Paginated production runs with their detail lines, newest first unless `sort_order=asc`.",
    params(ProductionListQuery),
    responses(
        (status = 200, description = "Productions", body = ProductionListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, query))]
pub async fn list_productions(
    _session: SessionUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductionListQuery>,
) -> Result<Json<ProductionListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page)?;
    let (_, order) = sort_params(None, query.sort_order.as_deref(), false)?;

    let total = production::Entity::find().count(&state.db).await?;
    let pagination = Pagination::new(page, per_page, total);

    let rows = production::Entity::find()
        .order_by(production::Column::Added, order.clone())
        .order_by(production::Column::Uid, order)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = with_details(&state.db, rows).await?;
    Ok(Json(ProductionListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{uid}",
    tag = "Productions",
    operation_id = "getProduction",
    summary = "Get a production run",
    params(("uid" = Uuid, Path, description = "Production uid")),
    responses(
        (status = 200, description = "Production with its detail lines", body = ProductionResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Production not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_production(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ProductionResponse>, AppError> {
    let model = find_production(&state.db, uid).await?;
    let mut data = with_details(&state.db, vec![model]).await?;
    data.pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("Production response missing".into()))
}

#[utoipa::path(
    delete,
    path = "/{uid}",
    tag = "Productions",
    operation_id = "deleteProduction",
    summary = "Delete a production run",
    description = "Deletes a production run together with its detail lines.",
    params(("uid" = Uuid, Path, description = "Production uid")),
    responses(
        (status = 204, description = "Production deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Production not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_production(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    find_production_for_update(&txn, uid).await?;

    production_detail::Entity::delete_many()
        .filter(production_detail::Column::ProductionUid.eq(uid))
        .exec(&txn)
        .await?;
    production::Entity::delete_by_id(uid).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{uid}/details",
    tag = "Production Details",
    operation_id = "createProductionDetail",
    summary = "Add a line to a production run",
    params(("uid" = Uuid, Path, description = "Production uid")),
    request_body = CreateProductionDetailRequest,
    responses(
        (status = 201, description = "Detail created", body = ProductionDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Production or product not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(product = %payload.product))]
pub async fn create_production_detail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(production_uid): Path<Uuid>,
    AppJson(payload): AppJson<CreateProductionDetailRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_production_detail(&payload)?;

    let txn = state.db.begin().await?;
    find_production_for_update(&txn, production_uid).await?;
    let product = find_product(&txn, payload.product).await?;

    let detail = insert_detail(&txn, production_uid, &product, payload.produced_units).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductionDetailResponse::new(detail, &product)),
    ))
}

#[utoipa::path(
    get,
    path = "/{uid}/details",
    tag = "Production Details",
    operation_id = "listProductionDetails",
    summary = "List the lines of a production run",
    params(("uid" = Uuid, Path, description = "Production uid")),
    responses(
        (status = 200, description = "Detail lines", body = Vec<ProductionDetailResponse>),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Production not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn list_production_details(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(production_uid): Path<Uuid>,
) -> Result<Json<Vec<ProductionDetailResponse>>, AppError> {
    find_production(&state.db, production_uid).await?;
    let mut details = load_details(&state.db, &[production_uid]).await?;
    Ok(Json(details.remove(&production_uid).unwrap_or_default()))
}

#[utoipa::path(
    get,
    path = "/{uid}",
    tag = "Production Details",
    operation_id = "getProductionDetail",
    summary = "Get a production detail",
    params(("uid" = Uuid, Path, description = "Production detail uid")),
    responses(
        (status = 200, description = "Detail", body = ProductionDetailResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Detail not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_production_detail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Json<ProductionDetailResponse>, AppError> {
    let (detail, product) = find_detail_with_product(&state.db, uid).await?;
    Ok(Json(ProductionDetailResponse::new(detail, &product)))
}

#[utoipa::path(
    patch,
    path = "/{uid}",
    tag = "Production Details",
    operation_id = "updateProductionDetail",
    summary = "Change the produced units of a line",
    params(("uid" = Uuid, Path, description = "Production detail uid")),
    request_body = UpdateProductionDetailRequest,
    responses(
        (status = 200, description = "Detail updated", body = ProductionDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Detail not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload))]
pub async fn update_production_detail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    AppJson(payload): AppJson<UpdateProductionDetailRequest>,
) -> Result<Json<ProductionDetailResponse>, AppError> {
    validate_update_production_detail(&payload)?;

    let (detail, product) = find_detail_with_product(&state.db, uid).await?;
    let Some(units) = payload.produced_units else {
        return Ok(Json(ProductionDetailResponse::new(detail, &product)));
    };

    let mut active: production_detail::ActiveModel = detail.into();
    active.produced_units = Set(units);
    let model = active.update(&state.db).await?;

    Ok(Json(ProductionDetailResponse::new(model, &product)))
}

#[utoipa::path(
    delete,
    path = "/{uid}",
    tag = "Production Details",
    operation_id = "deleteProductionDetail",
    summary = "Remove a line from a production run",
    params(("uid" = Uuid, Path, description = "Production detail uid")),
    responses(
        (status = 204, description = "Detail deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Detail not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_production_detail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let result = production_detail::Entity::delete_by_id(uid)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(detail_not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Newest production runs first, for the dashboard.
pub(crate) async fn recent_productions<C: ConnectionTrait>(
    db: &C,
    limit: u64,
) -> Result<Vec<ProductionResponse>, AppError> {
    let rows = production::Entity::find()
        .order_by_desc(production::Column::Added)
        .limit(Some(limit))
        .all(db)
        .await?;
    with_details(db, rows).await
}

async fn insert_detail<C: ConnectionTrait>(
    db: &C,
    production_uid: Uuid,
    product: &product::Model,
    produced_units: i64,
) -> Result<production_detail::Model, AppError> {
    let detail = production_detail::ActiveModel {
        uid: Set(Uuid::new_v4()),
        production_uid: Set(production_uid),
        product_uid: Set(product.uid),
        produced_units: Set(produced_units),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(detail)
}

/// Detail lines of the given runs, keyed by production uid, ordered by product name.
async fn load_details<C: ConnectionTrait>(
    db: &C,
    production_uids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ProductionDetailResponse>>, AppError> {
    if production_uids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = production_detail::Entity::find()
        .filter(production_detail::Column::ProductionUid.is_in(production_uids.iter().copied()))
        .find_also_related(product::Entity)
        .order_by_asc(product::Column::Name)
        .order_by_asc(production_detail::Column::Uid)
        .all(db)
        .await?;

    let mut map: HashMap<Uuid, Vec<ProductionDetailResponse>> = HashMap::new();
    for (detail, product) in rows {
        let Some(product) = product else {
            continue;
        };
        map.entry(detail.production_uid)
            .or_default()
            .push(ProductionDetailResponse::new(detail, &product));
    }
    Ok(map)
}

async fn with_details<C: ConnectionTrait>(
    db: &C,
    rows: Vec<production::Model>,
) -> Result<Vec<ProductionResponse>, AppError> {
    let uids: Vec<Uuid> = rows.iter().map(|p| p.uid).collect();
    let mut details = load_details(db, &uids).await?;

    Ok(rows
        .into_iter()
        .map(|model| {
            let lines = details.remove(&model.uid).unwrap_or_default();
            ProductionResponse::new(model, lines)
        })
        .collect())
}

async fn find_production<C: ConnectionTrait>(
    db: &C,
    uid: Uuid,
) -> Result<production::Model, AppError> {
    production::Entity::find_by_id(uid)
        .one(db)
        .await?
        .ok_or_else(production_not_found)
}

async fn find_production_for_update(
    txn: &DatabaseTransaction,
    uid: Uuid,
) -> Result<production::Model, AppError> {
    production::Entity::find_by_id(uid)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(production_not_found)
}

async fn find_detail_with_product<C: ConnectionTrait>(
    db: &C,
    uid: Uuid,
) -> Result<(production_detail::Model, product::Model), AppError> {
    let (detail, product) = production_detail::Entity::find_by_id(uid)
        .find_also_related(product::Entity)
        .one(db)
        .await?
        .ok_or_else(detail_not_found)?;
    let product = product
        .ok_or_else(|| AppError::Internal(format!("Production detail {uid} has no product")))?;
    Ok((detail, product))
}

fn production_not_found() -> AppError {
    AppError::NotFound("Production not found".into())
}

fn detail_not_found() -> AppError {
    AppError::NotFound("Production detail not found".into())
}
