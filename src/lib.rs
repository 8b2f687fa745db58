//! Book User API
//!
//! User account service built with Actix-web and `PostgreSQL`: login with
//! stateless JWT tokens, account CRUD, password reset by mail and
//! enable/disable. Every endpoint answers with a `{success, message, data}`
//! envelope.

pub mod auth;
pub mod config;
pub mod health;
pub mod mail;
pub mod postgres;
pub mod types;
pub mod user;
pub mod utils;

use actix_web::web;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVICE_NAME: &str = "book-user-api";

/// Register every route and extractor setting on an app.
///
/// The caller provides `web::Data<user::AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(user::routes::configure_extractors)
        .configure(health::configure_health_routes)
        .configure(user::routes::configure_user_routes);
}
