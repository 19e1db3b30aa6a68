pub mod auth;
pub mod category;
pub mod component;
pub mod dashboard;
pub mod item;
pub mod media;
pub mod product;
pub mod production;
