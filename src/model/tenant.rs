use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_TENANT_NAME: &str = "GeoAttend";
pub const DEFAULT_TENANT_SLUG: &str = "geoattend";

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub address: Option<String>,
    pub logo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}
