use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Row shape of `users`, password hash included. Never serialized.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub tenant_id: u64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub password_hash: String,
    pub timezone: String,
    pub active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str =
    "id, tenant_id, email, name, role, password_hash, timezone, active, last_login_at, created_at";

/// Public view of a user as returned by the admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 7,
    "name": "Employee User",
    "email": "employee@geoattend.local",
    "role": "EMPLOYEE",
    "active": true,
    "timezone": "UTC"
}))]
pub struct UserResponse {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub timezone: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            role: Role::from_db(&u.role),
            name: u.name,
            email: u.email,
            active: u.active,
            timezone: u.timezone,
        }
    }
}

/// Compact user embedded in attendance, assignment and shift payloads.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBrief {
    pub id: u64,
    pub name: String,
    pub email: String,
}
