pub mod category;
pub mod component;
pub mod item;
pub mod product;
pub mod production;
pub mod production_detail;
pub mod session;
pub mod user;

/// URL prefix under which stored thumbnails are served.
pub const MEDIA_URL_PREFIX: &str = "/media/";

/// Public location of a stored thumbnail, or an empty string when none is set.
pub fn thumbnail_url(thumbnail: Option<&str>) -> String {
    match thumbnail {
        Some(path) if !path.is_empty() => format!("{MEDIA_URL_PREFIX}{path}"),
        _ => String::new(),
    }
}
