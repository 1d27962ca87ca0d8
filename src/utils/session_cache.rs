use chrono::{DateTime, Utc};
use moka::future::Cache;
use once_cell::sync::OnceCell;
use std::time::Duration;

use crate::auth::auth::AuthUser;

#[derive(Clone, Debug)]
pub struct CachedSession {
    pub user: AuthUser,
    pub expires_at: DateTime<Utc>,
}

/// token hash => resolved session. Entries live at most `ttl`; logout,
/// password reset and any admin edit of a user invalidate eagerly.
static SESSION_CACHE: OnceCell<Cache<String, CachedSession>> = OnceCell::new();

const DEFAULT_TTL_SECS: u64 = 60;

fn cache() -> &'static Cache<String, CachedSession> {
    SESSION_CACHE.get_or_init(|| build(DEFAULT_TTL_SECS))
}

fn build(ttl_secs: u64) -> Cache<String, CachedSession> {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Sets the TTL before first use. Later calls are ignored.
pub fn init(ttl_secs: u64) {
    let _ = SESSION_CACHE.set(build(ttl_secs));
}

/// Returns the cached session if it has not expired in the meantime.
pub async fn get(token_hash: &str) -> Option<CachedSession> {
    let cache = cache();
    let entry = cache.get(token_hash).await?;
    if entry.expires_at <= Utc::now() {
        cache.invalidate(token_hash).await;
        return None;
    }
    Some(entry)
}

pub async fn insert(token_hash: String, session: CachedSession) {
    cache().insert(token_hash, session).await;
}

pub async fn invalidate(token_hash: &str) {
    cache().invalidate(token_hash).await;
}

/// Used when a user's sessions are revoked or their profile changes; the
/// cache is keyed by token hash so the whole cache is dropped.
pub fn invalidate_all() {
    cache().invalidate_all();
}
