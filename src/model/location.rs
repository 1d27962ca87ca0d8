use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 3,
    "tenantId": 1,
    "name": "HQ",
    "address": "1 Market St, San Francisco",
    "latitude": 37.7936,
    "longitude": -122.3958,
    "radiusMeters": 150,
    "active": true,
    "createdById": 1,
    "createdAt": "2026-01-01T09:00:00Z"
}))]
pub struct Location {
    pub id: u64,
    pub tenant_id: u64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: u32,
    pub active: bool,
    pub created_by_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

pub const LOCATION_COLUMNS: &str = "id, tenant_id, name, address, latitude, longitude, \
     radius_meters, active, created_by_id, created_at";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationBrief {
    pub id: u64,
    pub name: String,
    pub address: String,
}
