//! User Service Module
//!
//! Business rules between the HTTP handlers and the store: input checks,
//! password hashing on every write, and the login decision.

use std::sync::Arc;

use crate::user::{
    dto::non_empty,
    error::UserError,
    models::{NewUser, User, UserChanges, STATE_DISABLED, STATE_ENABLED},
    repository::UserStore,
};
use crate::utils::password::security::PasswordHasher;

pub const EMPTY_USER_NAME: &str = "用户名不能为空！";
pub const EMPTY_PASSWORD: &str = "密码不能为空！";
pub const INVALID_STATE: &str = "用户状态不正确！";

/// Service for managing user-related operations
pub struct UserService {
    store: Arc<dyn UserStore>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, password_hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            password_hasher,
        }
    }

    pub async fn find_user_by_user_name(&self, user_name: &str) -> Result<Option<User>, UserError> {
        log::debug!("Looking up user by name '{}'", user_name);
        self.store.find_by_user_name(user_name).await
    }

    pub async fn find_user_by_user_id(&self, user_id: i32) -> Result<Option<User>, UserError> {
        log::debug!("Looking up user {}", user_id);
        self.store.find_by_id(user_id).await
    }

    /// Check credentials and account state.
    ///
    /// Empty fields are rejected before the store is queried, and a
    /// disabled account fails whatever the password.
    pub async fn authenticate(
        &self,
        user_name: Option<&str>,
        user_password: Option<&str>,
    ) -> Result<User, UserError> {
        let user_name = user_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UserError::Validation(EMPTY_USER_NAME.to_string()))?;
        let user_password = user_password
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UserError::Validation(EMPTY_PASSWORD.to_string()))?;

        let user = self.find_user_by_user_name(user_name).await?.ok_or(UserError::UserNotFound)?;

        if !user.is_enabled() {
            log::warn!("Login refused for disabled user '{}'", user_name);
            return Err(UserError::AccountDisabled);
        }

        let stored = user.user_password.as_deref().unwrap_or_default();
        if !self.password_hasher.verify(user_password, stored)? {
            log::warn!("Wrong password for user '{}'", user_name);
            return Err(UserError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Insert a user, hashing the password; returns affected rows
    pub async fn save_user(
        &self,
        user_name: Option<&str>,
        user_password: Option<&str>,
        user_state: Option<i32>,
    ) -> Result<u64, UserError> {
        let user_name = user_name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UserError::Validation(EMPTY_USER_NAME.to_string()))?;
        let user_password = user_password
            .filter(|v| !v.is_empty())
            .ok_or_else(|| UserError::Validation(EMPTY_PASSWORD.to_string()))?;
        let user_state = Self::check_state(user_state)?.unwrap_or(STATE_ENABLED);

        let new_user = NewUser {
            user_name: user_name.to_string(),
            user_password: self.password_hasher.hash(user_password)?,
            user_state,
        };

        let count = self.store.insert(&new_user).await?;
        log::info!("Saved user '{}' ({} row(s))", user_name, count);

        Ok(count)
    }

    /// Apply the non-empty fields; a new password is hashed first
    pub async fn update_user(&self, user_id: i32, changes: UserChanges) -> Result<u64, UserError> {
        let user_state = Self::check_state(changes.user_state)?;
        let user_password = match non_empty(&changes.user_password) {
            Some(plain) => Some(self.password_hasher.hash(plain)?),
            None => None,
        };

        let changes = UserChanges {
            user_name: non_empty(&changes.user_name).map(str::to_string),
            user_password,
            user_state,
        };

        let count = self.store.update(user_id, &changes).await?;
        log::info!("Updated user {} ({} row(s))", user_id, count);

        Ok(count)
    }

    pub async fn delete_user(&self, user_id: i32) -> Result<u64, UserError> {
        let count = self.store.delete(user_id).await?;
        log::info!("Deleted user {} ({} row(s))", user_id, count);

        Ok(count)
    }

    pub async fn reset_password(&self, user_id: i32, new_password: &str) -> Result<u64, UserError> {
        self.update_user(user_id, UserChanges::password(new_password)).await
    }

    pub async fn set_state(&self, user_id: i32, user_state: i32) -> Result<u64, UserError> {
        self.update_user(user_id, UserChanges::state(user_state)).await
    }

    pub async fn ping(&self) -> Result<(), UserError> {
        self.store.ping().await
    }

    fn check_state(user_state: Option<i32>) -> Result<Option<i32>, UserError> {
        match user_state {
            None | Some(STATE_DISABLED) | Some(STATE_ENABLED) => Ok(user_state),
            Some(_) => Err(UserError::Validation(INVALID_STATE.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::repository::InMemoryUserStore;
    use crate::utils::password::security::SaltedMd5Hasher;

    fn service_with(store: Arc<InMemoryUserStore>) -> UserService {
        UserService::new(store, Arc::new(SaltedMd5Hasher::new("salt")))
    }

    #[tokio::test]
    async fn test_save_hashes_password() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service_with(store.clone());

        let count = service.save_user(Some("alice"), Some("secret"), None).await.unwrap();
        assert_eq!(count, 1);

        let stored = store.find_by_user_name("alice").await.unwrap().unwrap();
        let digest = SaltedMd5Hasher::new("salt").hash("secret").unwrap();
        assert_eq!(stored.user_password.as_deref(), Some(digest.as_str()));
        assert_eq!(stored.user_state, STATE_ENABLED);
    }

    #[tokio::test]
    async fn test_save_requires_name_and_password() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service_with(store.clone());

        let err = service.save_user(Some(""), Some("secret"), None).await.unwrap_err();
        assert_eq!(err.to_string(), EMPTY_USER_NAME);

        let err = service.save_user(Some("alice"), None, None).await.unwrap_err();
        assert_eq!(err.to_string(), EMPTY_PASSWORD);

        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_unknown_state() {
        let service = service_with(Arc::new(InMemoryUserStore::new()));

        let err = service.save_user(Some("alice"), Some("secret"), Some(5)).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_authenticate_flow() {
        let service = service_with(Arc::new(InMemoryUserStore::new()));
        service.save_user(Some("alice"), Some("secret"), None).await.unwrap();

        let user = service.authenticate(Some("alice"), Some("secret")).await.unwrap();
        assert_eq!(user.user_name, "alice");

        let err = service.authenticate(Some("alice"), Some("wrong")).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));

        let err = service.authenticate(Some("nobody"), Some("secret")).await.unwrap_err();
        assert!(matches!(err, UserError::UserNotFound));
    }

    #[tokio::test]
    async fn test_disabled_account_fails_before_password_check() {
        let service = service_with(Arc::new(InMemoryUserStore::new()));
        service.save_user(Some("alice"), Some("secret"), None).await.unwrap();
        service.set_state(1, STATE_DISABLED).await.unwrap();

        for password in ["secret", "wrong"] {
            let err = service.authenticate(Some("alice"), Some(password)).await.unwrap_err();
            assert!(matches!(err, UserError::AccountDisabled));
        }
    }

    #[tokio::test]
    async fn test_update_ignores_empty_fields() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = service_with(store.clone());
        service.save_user(Some("alice"), Some("secret"), None).await.unwrap();

        let changes = UserChanges {
            user_name: Some(String::new()),
            user_password: Some(String::new()),
            user_state: None,
        };
        assert_eq!(service.update_user(1, changes).await.unwrap(), 1);

        assert!(service.authenticate(Some("alice"), Some("secret")).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password() {
        let service = service_with(Arc::new(InMemoryUserStore::new()));
        service.save_user(Some("alice"), Some("secret"), None).await.unwrap();

        assert_eq!(service.reset_password(1, "123456789").await.unwrap(), 1);
        assert!(service.authenticate(Some("alice"), Some("123456789")).await.is_ok());
        assert_eq!(service.reset_password(42, "123456789").await.unwrap(), 0);
    }
}
