use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::MediaKind;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, item, product};
use crate::error::{AppError, ErrorBody, unique_violation_or};
use crate::extractors::auth::SessionUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::media::store_thumbnail;
use crate::models::category::*;
use crate::models::shared::{Pagination, SortKey, page_params, search_pattern, sort_params};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Creates a category. The slug must be unique among categories. A thumbnail can be attached afterwards through the thumbnail sub-resource.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    _session: SessionUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_category(&payload)?;

    let new_category = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug),
        thumbnail: Set(None),
        added: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_category
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "Paginated category list. `search` matches names case-insensitively. Sorted by `added` (newest first) unless `sort_by=name`.",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories", body = CategoryListResponse),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, query))]
pub async fn list_categories(
    _session: SessionUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page)?;
    let (sort_key, order) = sort_params(
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
        true,
    )?;

    let mut select = category::Entity::find();
    if let Some(pattern) = search_pattern(query.search.as_deref()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(category::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let total = select.clone().count(&state.db).await?;
    let pagination = Pagination::new(page, per_page, total);

    select = match sort_key {
        SortKey::Added => select.order_by(category::Column::Added, order.clone()),
        SortKey::Name => select.order_by(category::Column::Name, order.clone()),
    };

    let data = select
        .order_by(category::Column::Id, order)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();

    Ok(Json(CategoryListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by slug",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn get_category(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let model = find_category(&state.db, &slug).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Partially updates a category. A new slug is checked for uniqueness. An empty payload returns the current resource unchanged.",
    params(("slug" = String, Path, description = "Category slug")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (SLUG_TAKEN)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, payload))]
pub async fn update_category(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    validate_update_category(&payload)?;

    if payload == UpdateCategoryRequest::default() {
        let existing = find_category(&state.db, &slug).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;

    let existing = find_category_for_update(&txn, &slug).await?;
    let mut active: category::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(new_slug) = payload.slug {
        active.slug = Set(new_slug);
    }

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation_or(e, AppError::SlugTaken))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Deletes a category. Refused with 409 PROTECTED while any item or product still belongs to it.",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Category still referenced (PROTECTED)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn delete_category(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_category_for_update(&txn, &slug).await?;

    let item_count = item::Entity::find()
        .filter(item::Column::CategoryId.eq(existing.id))
        .count(&txn)
        .await?;
    let product_count = product::Entity::find()
        .filter(product::Column::CategoryId.eq(existing.id))
        .count(&txn)
        .await?;
    if item_count + product_count > 0 {
        return Err(AppError::Protected(format!(
            "Category is still used by {item_count} item(s) and {product_count} product(s)"
        )));
    }

    category::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(slug = %slug, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{slug}/thumbnail",
    tag = "Categories",
    operation_id = "uploadCategoryThumbnail",
    summary = "Set a category's thumbnail",
    description = "Uploads an image as multipart field `file` and makes it the category's thumbnail.",
    params(("slug" = String, Path, description = "Category slug")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with a `file` field"),
    responses(
        (status = 200, description = "Thumbnail set", body = CategoryResponse),
        (status = 400, description = "Bad upload (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session, multipart))]
pub async fn upload_category_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Json<CategoryResponse>, AppError> {
    let existing = find_category(&state.db, &slug).await?;
    let path = store_thumbnail(&state, MediaKind::Category, &existing.slug, multipart).await?;

    let mut active: category::ActiveModel = existing.into();
    active.thumbnail = Set(Some(path));
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{slug}/thumbnail",
    tag = "Categories",
    operation_id = "clearCategoryThumbnail",
    summary = "Remove a category's thumbnail",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Thumbnail cleared", body = CategoryResponse),
        (status = 401, description = "Not logged in (SESSION_MISSING, SESSION_INVALID)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("session" = []), ("jwt" = [])),
)]
#[instrument(skip(state, _session))]
pub async fn clear_category_thumbnail(
    _session: SessionUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryResponse>, AppError> {
    let existing = find_category(&state.db, &slug).await?;
    let mut active: category::ActiveModel = existing.into();
    active.thumbnail = Set(None);
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

pub(crate) async fn find_category<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<category::Model, AppError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))
}

async fn find_category_for_update(
    txn: &DatabaseTransaction,
    slug: &str,
) -> Result<category::Model, AppError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))
}
