//! User Data Transfer Objects
//!
//! Request forms for the user endpoints. Field names follow the camelCase
//! parameters clients already send; every field is optional so missing
//! values reach the handler and get a proper validation message instead of
//! a deserialization error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub user_name: Option<String>,
    pub user_password: Option<String>,
}

/// Create or update payload
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    pub user_password: Option<String>,
    pub user_state: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdForm {
    pub user_id: Option<i32>,
}

/// Password reset request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMailForm {
    pub to_mail: Option<String>,
    pub user_id: Option<i32>,
}

/// Login result payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Treat `Some("")` the same as a missing value
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
