//! User-related error types
//!
//! Every variant renders as a failure [`JsonData`] envelope. Business
//! failures keep HTTP 200 so clients only have to look at `success`;
//! auth failures use 401 and infrastructure faults a generic 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::utils::password::security::PasswordError;
use crate::utils::response_handler::JsonData;

pub const INTERNAL_ERROR_MESSAGE: &str = "服务器内部错误";
pub const BAD_REQUEST_MESSAGE: &str = "请求参数错误";

#[derive(Debug, Error)]
pub enum UserError {
    /// A required field is missing or malformed
    #[error("{0}")]
    Validation(String),

    #[error("用户不存在！")]
    UserNotFound,

    #[error("账号已被停用！请联系管理员！")]
    AccountDisabled,

    #[error("用户名或密码错误！")]
    InvalidCredentials,

    /// Missing or rejected token, message is shown to the caller
    #[error("{0}")]
    Unauthorized(String),

    /// The store reported zero affected rows
    #[error("{0}")]
    Persistence(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Request body or query could not be deserialized
    #[error("Malformed request: {0}")]
    BadRequest(String),
}

impl UserError {
    pub fn is_internal(&self) -> bool {
        matches!(self, UserError::Database(_) | UserError::Password(_) | UserError::Internal(_))
    }

    /// Message placed in the envelope; internals never leak to the caller
    pub fn public_message(&self) -> String {
        match self {
            e if e.is_internal() => INTERNAL_ERROR_MESSAGE.to_string(),
            UserError::BadRequest(_) => BAD_REQUEST_MESSAGE.to_string(),
            UserError::Token(_) => crate::auth::middleware::INVALID_TOKEN.to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            UserError::Unauthorized(_) | UserError::Token(_) => StatusCode::UNAUTHORIZED,
            UserError::BadRequest(_) => StatusCode::BAD_REQUEST,
            UserError::Database(_) | UserError::Password(_) | UserError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
            UserError::Validation(_)
            | UserError::UserNotFound
            | UserError::AccountDisabled
            | UserError::InvalidCredentials
            | UserError::Persistence(_) => StatusCode::OK,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            log::error!("{}", self);
        }

        JsonData::fail(self.public_message()).into_response_with(self.status_code())
    }
}

impl From<tokio_postgres::Error> for UserError {
    fn from(error: tokio_postgres::Error) -> Self {
        UserError::Database(error.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for UserError {
    fn from(error: deadpool_postgres::PoolError) -> Self {
        UserError::Database(format!("Failed to get database connection: {}", error))
    }
}
