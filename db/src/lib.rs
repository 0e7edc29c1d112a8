use color_eyre::eyre::{eyre, WrapErr as _};
use color_eyre::Result;
use sqlx::postgres::PgPoolOptions;

pub mod cooking;
pub mod notifications;
pub mod pagination;
pub mod stats;
pub mod users;

mod constraints;

pub use constraints::{is_foreign_key_violation, is_unique_violation};
pub use pagination::Page;
pub use sqlx;
pub use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").wrap_err("DATABASE_URL must be set")?;
    let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
        Ok(raw) => raw
            .parse()
            .wrap_err("DATABASE_MAX_CONNECTIONS is not a number")?,
        Err(_) => DEFAULT_MAX_CONNECTIONS,
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .wrap_err("Failed to connect to the database")?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Applies pending migrations while holding a Postgres advisory lock, so
/// several instances booting at once do not race each other.
#[tracing::instrument(skip_all, err)]
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    const MIGRATION_LOCK_ID: i64 = 0xC0_0C_BA_C0;

    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(pool)
        .await?;

    let migrated = sqlx::migrate!().run(pool).await;

    let unlocked: Option<bool> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(pool)
        .await?;

    migrated.wrap_err("Failed to run migrations")?;

    match unlocked {
        Some(true) => tracing::info!("Migration lock unlocked"),
        Some(false) => tracing::warn!("Migration lock was not held when unlocking"),
        None => return Err(eyre!("Failed to unlock migration lock")),
    }

    Ok(())
}
