mod auth;
mod common;
mod dashboard;
mod media;
mod production;
