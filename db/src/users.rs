use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Type};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    #[serde(rename = "user")]
    User,
    #[serde(rename = "admin")]
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Unknown user role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a user that may change after creation. `None` leaves a column
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub role: Option<UserRole>,
}

impl User {
    #[tracing::instrument(skip(pool), err)]
    pub async fn create(
        pool: &PgPool,
        name: String,
        email: String,
        avatar_url: Option<String>,
        role: UserRole,
    ) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            "
            INSERT INTO users (name, email, avatar_url, role)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id,
                name,
                email,
                avatar_url,
                role,
                created_at,
                updated_at
            ",
        )
        .bind(name)
        .bind(email)
        .bind(avatar_url)
        .bind(role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "
            SELECT
                id,
                name,
                email,
                avatar_url,
                role,
                created_at,
                updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "
            SELECT
                id,
                name,
                email,
                avatar_url,
                role,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "
            SELECT
                id,
                name,
                email,
                avatar_url,
                role,
                created_at,
                updated_at
            FROM users
            ORDER BY id
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &PgPool, id: i32, changes: UserChanges) -> Result<Option<Self>> {
        let set_avatar = changes.avatar_url.is_some();

        let user = sqlx::query_as::<_, User>(
            "
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                avatar_url = CASE WHEN $4 THEN $5 ELSE avatar_url END,
                role = COALESCE($6, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id,
                name,
                email,
                avatar_url,
                role,
                created_at,
                updated_at
            ",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(set_avatar)
        .bind(changes.avatar_url.flatten())
        .bind(changes.role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deleting a user cascades to their recipes, votes and notifications.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
