//! `PostgreSQL`-backed user store.

use async_trait::async_trait;
use sqlx::PgPool;

use cartwright_core::{Email, Role, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// User store backed by the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    username: String,
    role: String,
    push_enabled: bool,
    phone: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            password_hash: row.password_hash,
            username: row.username,
            role: Role::parse(&row.role),
            push_enabled: row.push_enabled,
            phone: row.phone,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, username, role, push_enabled, phone \
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, username, role, push_enabled, phone \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password_hash, username, role, push_enabled, phone) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, email, password_hash, username, role, push_enabled, phone",
        )
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(&new.username)
        .bind(new.role.as_claim())
        .bind(new.push_enabled)
        .bind(&new.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }
}
