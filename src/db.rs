use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlDatabaseError, MySqlPoolOptions};
use std::time::Duration;

/// MySQL `ER_DUP_ENTRY`.
const DUPLICATE_KEY: u16 = 1062;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

fn is_duplicate_key(number: u16) -> bool {
    number == DUPLICATE_KEY
}

/// True only for duplicate-key errors. SQLSTATE 23000 also covers foreign key
/// and NOT NULL failures, so the MySQL error number is checked instead.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| is_duplicate_key(e.number())),
        _ => false,
    }
}


/// Rows for tests that run against a real MySQL (`#[sqlx::test]`).
#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use sqlx::MySqlPool;

    pub async fn tenant(pool: &MySqlPool, slug: &str) -> u64 {
        sqlx::query("INSERT INTO tenants (name, slug) VALUES (?, ?)")
            .bind(slug)
            .bind(slug)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id()
    }

    pub async fn user(pool: &MySqlPool, tenant_id: u64, email: &str) -> u64 {
        sqlx::query("INSERT INTO users (tenant_id, email, name, password_hash) VALUES (?, ?, ?, 'x')")
            .bind(tenant_id)
            .bind(email)
            .bind(email)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id()
    }

    pub async fn open_record(pool: &MySqlPool, tenant_id: u64, user_id: u64) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO attendance_records \
             (tenant_id, user_id, date, clock_in_at, clock_in_lat, clock_in_lng) \
             VALUES (?, ?, ?, ?, 0, 0)",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(now.date_naive())
        .bind(now)
        .execute(pool)
        .await
        .map(|done| done.last_insert_id())
    }
}
