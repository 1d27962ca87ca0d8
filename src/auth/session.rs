use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::model::role::Role;
use crate::utils::session_cache::{self, CachedSession};

pub const SESSION_COOKIE: &str = "ga_session";

/// 32 random bytes, hex encoded. Only the hash is stored server side.
pub fn random_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub struct NewSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn create_session(
    pool: &MySqlPool,
    user_id: u64,
    ttl_days: i64,
    ip: Option<String>,
    user_agent: Option<String>,
) -> Result<NewSession, sqlx::Error> {
    let token = random_token();
    let expires_at = Utc::now() + Duration::days(ttl_days);

    sqlx::query(
        r#"
        INSERT INTO sessions (user_id, token_hash, expires_at, ip, user_agent)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .bind(ip)
    .bind(user_agent)
    .execute(pool)
    .await?;

    Ok(NewSession { token, expires_at })
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    user_id: u64,
    tenant_id: u64,
    name: String,
    email: String,
    role: String,
    timezone: String,
    expires_at: DateTime<Utc>,
}

/// Resolves a cookie token to its user. Only unrevoked, unexpired sessions of
/// active users resolve.
pub async fn resolve_session(pool: &MySqlPool, token: &str) -> Result<Option<AuthUser>, sqlx::Error> {
    let token_hash = hash_token(token);

    if let Some(cached) = session_cache::get(&token_hash).await {
        return Ok(Some(cached.user));
    }

    let row = sqlx::query_as::<_, SessionUserRow>(
        r#"
        SELECT u.id AS user_id, u.tenant_id, u.name, u.email, u.role, u.timezone, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ?
          AND s.revoked_at IS NULL
          AND s.expires_at > ?
          AND u.active = TRUE
        "#,
    )
    .bind(&token_hash)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let user = AuthUser {
        user_id: row.user_id,
        tenant_id: row.tenant_id,
        name: row.name,
        email: row.email,
        role: Role::from_db(&row.role),
        timezone: row.timezone,
    };

    session_cache::insert(
        token_hash,
        CachedSession {
            user: user.clone(),
            expires_at: row.expires_at,
        },
    )
    .await;

    Ok(Some(user))
}

/// Idempotent.
pub async fn revoke_session(pool: &MySqlPool, token: &str) -> Result<(), sqlx::Error> {
    let token_hash = hash_token(token);

    sqlx::query("UPDATE sessions SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL")
        .bind(Utc::now())
        .bind(&token_hash)
        .execute(pool)
        .await?;

    session_cache::invalidate(&token_hash).await;
    Ok(())
}

pub async fn revoke_user_sessions(pool: &MySqlPool, user_id: u64) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE sessions SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL")
            .bind(Utc::now())
            .bind(user_id)
            .execute(pool)
            .await?;

    session_cache::invalidate_all();
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_hex() {
        let a = random_token();
        let b = random_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL and a MySQL server"]
    async fn revoked_sessions_stop_resolving(pool: MySqlPool) {
        let tenant = crate::db::fixtures::tenant(&pool, "acme").await;
        let user = crate::db::fixtures::user(&pool, tenant, "a@acme.test").await;

        let session = create_session(&pool, user, 7, None, None).await.unwrap();
        let resolved = resolve_session(&pool, &session.token).await.unwrap().unwrap();
        assert_eq!((resolved.user_id, resolved.tenant_id), (user, tenant));

        assert_eq!(revoke_user_sessions(&pool, user).await.unwrap(), 1);
        assert!(resolve_session(&pool, &session.token).await.unwrap().is_none());
    }
}
