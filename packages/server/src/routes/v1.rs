use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::media::thumbnail_body_limit;
use crate::handlers::{auth, category, component, dashboard, item, product, production};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/dashboard", dashboard_routes())
        .nest("/categories", category_routes(config))
        .nest("/items", item_routes(config))
        .nest("/products", product_routes(config))
        .nest("/components", component_routes())
        .nest("/productions", production_routes())
        .nest("/production-details", production_detail_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(dashboard::dashboard))
}

fn category_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(category::list_categories, category::create_category))
        .routes(routes!(
            category::get_category,
            category::update_category,
            category::delete_category
        ));

    let thumbnail = OpenApiRouter::new()
        .routes(routes!(
            category::upload_category_thumbnail,
            category::clear_category_thumbnail
        ))
        .layer(thumbnail_body_limit(config.storage.max_upload_bytes));

    crud.merge(thumbnail)
}

fn item_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(item::list_items, item::create_item))
        .routes(routes!(item::get_item, item::update_item, item::delete_item));

    let thumbnail = OpenApiRouter::new()
        .routes(routes!(item::upload_item_thumbnail, item::clear_item_thumbnail))
        .layer(thumbnail_body_limit(config.storage.max_upload_bytes));

    crud.merge(thumbnail)
}

fn product_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(product::list_products, product::create_product))
        .routes(routes!(
            product::get_product,
            product::update_product,
            product::delete_product
        ))
        .routes(routes!(
            component::list_components,
            component::create_component
        ));

    let thumbnail = OpenApiRouter::new()
        .routes(routes!(
            product::upload_product_thumbnail,
            product::clear_product_thumbnail
        ))
        .layer(thumbnail_body_limit(config.storage.max_upload_bytes));

    crud.merge(thumbnail)
}

fn component_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        component::get_component,
        component::update_component,
        component::delete_component
    ))
}

fn production_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            production::list_productions,
            production::create_production
        ))
        .routes(routes!(
            production::get_production,
            production::delete_production
        ))
        .routes(routes!(
            production::list_production_details,
            production::create_production_detail
        ))
}

fn production_detail_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        production::get_production_detail,
        production::update_production_detail,
        production::delete_production_detail
    ))
}
