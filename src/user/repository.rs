//! User Repository Module
//!
//! Defines the persistence boundary for user accounts and its two
//! implementations: PostgreSQL through a deadpool connection pool, and an
//! in-memory map used by tests and local runs.
//!
//! Mutations report the number of affected rows; the service turns zero
//! into a failure envelope rather than an error.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

use super::models::{NewUser, User, UserChanges};
use crate::user::error::UserError;

/// Persistence operations for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by their id
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, UserError>;

    /// Finds a user by their unique name
    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, UserError>;

    /// Inserts a user; an existing name yields zero rows
    async fn insert(&self, user: &NewUser) -> Result<u64, UserError>;

    /// Applies the present fields of `changes` to one user
    async fn update(&self, user_id: i32, changes: &UserChanges) -> Result<u64, UserError>;

    async fn delete(&self, user_id: i32) -> Result<u64, UserError>;

    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> Result<(), UserError>;
}

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS t_user (
        user_id SERIAL PRIMARY KEY,
        user_name VARCHAR(64) NOT NULL UNIQUE,
        user_password VARCHAR(255) NOT NULL,
        user_state INTEGER NOT NULL DEFAULT 1
    )
"#;

/// PostgreSQL implementation of the UserStore
pub struct PgUserStore {
    pool: Pool,
}

impl PgUserStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
        }
    }

    /// Create the `t_user` table when missing
    pub async fn init_schema(&self) -> Result<(), UserError> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_TABLE_SQL).await?;

        log::info!("User table is ready");
        Ok(())
    }

    fn row_to_user(row: &Row) -> Result<User, UserError> {
        Ok(User {
            user_id: row.try_get("user_id")?,
            user_name: row.try_get("user_name")?,
            user_password: row.try_get("user_password")?,
            user_state: row.try_get("user_state")?,
        })
    }

    /// Unique violations count as "nothing written"
    fn affected(result: Result<u64, tokio_postgres::Error>) -> Result<u64, UserError> {
        match result {
            Ok(count) => Ok(count),
            Err(e) if is_conflict(e.code()) => {
                log::debug!("Unique constraint rejected write: {}", e);
                Ok(0)
            },
            Err(e) => Err(e.into()),
        }
    }
}

fn is_conflict(code: Option<&SqlState>) -> bool {
    code == Some(&SqlState::UNIQUE_VIOLATION)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, UserError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT user_id, user_name, user_password, user_state FROM t_user WHERE user_id = $1",
                &[&user_id],
            )
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, UserError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT user_id, user_name, user_password, user_state FROM t_user WHERE user_name = $1",
                &[&user_name],
            )
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn insert(&self, user: &NewUser) -> Result<u64, UserError> {
        let client = self.pool.get().await?;
        let result = client
            .execute(
                "INSERT INTO t_user (user_name, user_password, user_state)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (user_name) DO NOTHING",
                &[&user.user_name, &user.user_password, &user.user_state],
            )
            .await;

        Self::affected(result)
    }

    async fn update(&self, user_id: i32, changes: &UserChanges) -> Result<u64, UserError> {
        let client = self.pool.get().await?;
        let result = client
            .execute(
                "UPDATE t_user SET
                    user_name = COALESCE($2, user_name),
                    user_password = COALESCE($3, user_password),
                    user_state = COALESCE($4, user_state)
                 WHERE user_id = $1",
                &[&user_id, &changes.user_name, &changes.user_password, &changes.user_state],
            )
            .await;

        Self::affected(result)
    }

    async fn delete(&self, user_id: i32) -> Result<u64, UserError> {
        let client = self.pool.get().await?;
        let count = client.execute("DELETE FROM t_user WHERE user_id = $1", &[&user_id]).await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), UserError> {
        let client = self.pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;

        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    next_id: i32,
    users: BTreeMap<i32, User>,
}

/// In-memory implementation of the UserStore
///
/// Keeps a count of store calls so tests can assert that validation
/// short-circuits before persistence is touched.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    state: RwLock<InMemoryState>,
    calls: AtomicUsize,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given users, ids included
    pub fn with_users(users: Vec<User>) -> Self {
        let next_id = users.iter().map(|u| u.user_id).max().unwrap_or(0);
        let users = users.into_iter().map(|u| (u.user_id, u)).collect();

        Self {
            state: RwLock::new(InMemoryState {
                next_id,
                users,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of trait calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, UserError> {
        self.record_call();
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, UserError> {
        self.record_call();
        let state = self.state.read().await;

        Ok(state.users.values().find(|u| u.user_name == user_name).cloned())
    }

    async fn insert(&self, user: &NewUser) -> Result<u64, UserError> {
        self.record_call();
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.user_name == user.user_name) {
            return Ok(0);
        }

        state.next_id += 1;
        let user_id = state.next_id;
        state.users.insert(
            user_id,
            User {
                user_id,
                user_name: user.user_name.clone(),
                user_password: Some(user.user_password.clone()),
                user_state: user.user_state,
            },
        );

        Ok(1)
    }

    async fn update(&self, user_id: i32, changes: &UserChanges) -> Result<u64, UserError> {
        self.record_call();
        let mut state = self.state.write().await;

        if let Some(name) = &changes.user_name {
            if state.users.values().any(|u| &u.user_name == name && u.user_id != user_id) {
                return Ok(0);
            }
        }

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(0);
        };

        if let Some(name) = &changes.user_name {
            user.user_name = name.clone();
        }
        if let Some(password) = &changes.user_password {
            user.user_password = Some(password.clone());
        }
        if let Some(user_state) = changes.user_state {
            user.user_state = user_state;
        }

        Ok(1)
    }

    async fn delete(&self, user_id: i32) -> Result<u64, UserError> {
        self.record_call();
        let removed = self.state.write().await.users.remove(&user_id);

        Ok(u64::from(removed.is_some()))
    }

    async fn ping(&self) -> Result<(), UserError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::models::{STATE_DISABLED, STATE_ENABLED};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            user_name: name.to_string(),
            user_password: "digest".to_string(),
            user_state: STATE_ENABLED,
        }
    }

    #[test]
    fn test_only_unique_violation_is_a_conflict() {
        assert!(is_conflict(Some(&SqlState::UNIQUE_VIOLATION)));
        assert!(!is_conflict(Some(&SqlState::NOT_NULL_VIOLATION)));
        assert!(!is_conflict(Some(&SqlState::UNDEFINED_TABLE)));
        assert!(!is_conflict(None));
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_rejects_duplicates() {
        let store = InMemoryUserStore::new();

        assert_eq!(store.insert(&new_user("alice")).await.unwrap(), 1);
        assert_eq!(store.insert(&new_user("bob")).await.unwrap(), 1);
        assert_eq!(store.insert(&new_user("alice")).await.unwrap(), 0);

        let bob = store.find_by_user_name("bob").await.unwrap().unwrap();
        assert_eq!(bob.user_id, 2);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("alice")).await.unwrap();

        let count = store.update(1, &UserChanges::state(STATE_DISABLED)).await.unwrap();
        assert_eq!(count, 1);

        let alice = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(alice.user_state, STATE_DISABLED);
        assert_eq!(alice.user_name, "alice");
        assert_eq!(alice.user_password.as_deref(), Some("digest"));
    }

    #[tokio::test]
    async fn test_update_missing_user_or_taken_name() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("alice")).await.unwrap();
        store.insert(&new_user("bob")).await.unwrap();

        assert_eq!(store.update(99, &UserChanges::state(STATE_ENABLED)).await.unwrap(), 0);

        let rename = UserChanges {
            user_name: Some("alice".to_string()),
            ..UserChanges::default()
        };
        assert_eq!(store.update(2, &rename).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryUserStore::new();
        store.insert(&new_user("alice")).await.unwrap();

        assert_eq!(store.delete(1).await.unwrap(), 1);
        assert_eq!(store.delete(1).await.unwrap(), 0);
        assert!(store.find_by_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_with_users_continues_ids() {
        let store = InMemoryUserStore::with_users(vec![User {
            user_id: 10,
            user_name: "root".to_string(),
            user_password: Some("digest".to_string()),
            user_state: STATE_ENABLED,
        }]);

        store.insert(&new_user("next")).await.unwrap();
        let next = store.find_by_user_name("next").await.unwrap().unwrap();

        assert_eq!(next.user_id, 11);
        assert_eq!(store.call_count(), 2);
    }
}
