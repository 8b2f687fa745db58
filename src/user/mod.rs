//! User module
//!
//! User account management: login, profile lookup, CRUD, password reset
//! and enable/disable.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::mail::MailSender;
use service::UserService;

/// Shared state handed to every handler through `web::Data`
pub struct AppState {
    pub users: UserService,
    pub jwt: JwtService,
    pub mailer: Arc<dyn MailSender>,
    /// Password assigned by the reset-and-mail endpoint
    pub reset_password: String,
}

impl AppState {
    pub fn new(
        users: UserService,
        jwt: JwtService,
        mailer: Arc<dyn MailSender>,
        reset_password: impl Into<String>,
    ) -> Self {
        Self {
            users,
            jwt,
            mailer,
            reset_password: reset_password.into(),
        }
    }
}
