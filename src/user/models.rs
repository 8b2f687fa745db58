//! User domain models
//!
//! Core user model aligned with the `t_user` table.

use serde::{Deserialize, Serialize};

pub const STATE_DISABLED: i32 = 0;
pub const STATE_ENABLED: i32 = 1;

/// User account
///
/// The password is a stored digest and is dropped from serialized output
/// once cleared with [`User::without_password`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i32,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_password: Option<String>,
    pub user_state: i32,
}

impl User {
    /// Check if the account may log in
    pub fn is_enabled(&self) -> bool {
        self.user_state != STATE_DISABLED
    }

    /// Copy safe to hand back to callers
    pub fn without_password(mut self) -> Self {
        self.user_password = None;
        self
    }
}

/// Row to insert; the password is already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_name: String,
    pub user_password: String,
    pub user_state: i32,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub user_name: Option<String>,
    pub user_password: Option<String>,
    pub user_state: Option<i32>,
}

impl UserChanges {
    pub fn state(user_state: i32) -> Self {
        Self {
            user_state: Some(user_state),
            ..Self::default()
        }
    }

    pub fn password(user_password: impl Into<String>) -> Self {
        Self {
            user_password: Some(user_password.into()),
            ..Self::default()
        }
    }
}
