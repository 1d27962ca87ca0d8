use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::location::LocationBrief;
use crate::model::user::UserBrief;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    EarlyDeparture,
    Unknown,
}

impl AttendanceStatus {
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or(AttendanceStatus::Unknown)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub tenant_id: u64,
    pub user_id: u64,
    pub location_id: Option<u64>,
    pub date: NaiveDate,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    pub clock_in_lat: f64,
    pub clock_in_lng: f64,
    pub clock_out_lat: Option<f64>,
    pub clock_out_lng: Option<f64>,
    pub clock_in_photo: Option<String>,
    pub clock_out_photo: Option<String>,
    pub break_minutes: i32,
    pub total_minutes: Option<i32>,
    pub status: String,
}

impl AttendanceRecord {
    pub fn status(&self) -> AttendanceStatus {
        AttendanceStatus::from_db(&self.status)
    }
}

pub const ATTENDANCE_COLUMNS: &str = "id, tenant_id, user_id, location_id, date, clock_in_at, \
     clock_out_at, clock_in_lat, clock_in_lng, clock_out_lat, clock_out_lng, clock_in_photo, \
     clock_out_photo, break_minutes, total_minutes, status";

/// Attendance record joined with the owning user and (optional) location.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    #[sqlx(flatten)]
    pub record: AttendanceRecord,
    pub user_name: String,
    pub user_email: String,
    pub location_name: Option<String>,
    pub location_address: Option<String>,
}

pub const ATTENDANCE_SELECT: &str = r#"
    SELECT r.id, r.tenant_id, r.user_id, r.location_id, r.date, r.clock_in_at,
           r.clock_out_at, r.clock_in_lat, r.clock_in_lng, r.clock_out_lat,
           r.clock_out_lng, r.clock_in_photo, r.clock_out_photo, r.break_minutes,
           r.total_minutes, r.status,
           u.name AS user_name, u.email AS user_email,
           l.name AS location_name, l.address AS location_address
    FROM attendance_records r
    JOIN users u ON u.id = r.user_id
    LEFT JOIN locations l ON l.id = r.location_id
"#;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub id: u64,
    pub user_id: u64,
    pub location_id: Option<u64>,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub clock_in_at: DateTime<Utc>,
    pub clock_out_at: Option<DateTime<Utc>>,
    pub clock_in_lat: f64,
    pub clock_in_lng: f64,
    pub clock_out_lat: Option<f64>,
    pub clock_out_lng: Option<f64>,
    pub clock_in_photo: Option<String>,
    pub clock_out_photo: Option<String>,
    pub break_minutes: i32,
    pub total_minutes: Option<i32>,
    pub status: AttendanceStatus,
    pub user: UserBrief,
    pub location: Option<LocationBrief>,
}

impl From<AttendanceRow> for AttendanceResponse {
    fn from(row: AttendanceRow) -> Self {
        let AttendanceRow {
            record,
            user_name,
            user_email,
            location_name,
            location_address,
        } = row;

        let location = match (record.location_id, location_name) {
            (Some(id), Some(name)) => Some(LocationBrief {
                id,
                name,
                address: location_address.unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            status: record.status(),
            id: record.id,
            user_id: record.user_id,
            location_id: record.location_id,
            date: record.date,
            clock_in_at: record.clock_in_at,
            clock_out_at: record.clock_out_at,
            clock_in_lat: record.clock_in_lat,
            clock_in_lng: record.clock_in_lng,
            clock_out_lat: record.clock_out_lat,
            clock_out_lng: record.clock_out_lng,
            clock_in_photo: record.clock_in_photo,
            clock_out_photo: record.clock_out_photo,
            break_minutes: record.break_minutes,
            total_minutes: record.total_minutes,
            user: UserBrief {
                id: record.user_id,
                name: user_name,
                email: user_email,
            },
            location,
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BreakRecord {
    pub id: u64,
    pub attendance_record_id: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_minutes: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_column_values() {
        assert_eq!(AttendanceStatus::EarlyDeparture.as_ref(), "EARLY_DEPARTURE");
        assert_eq!(AttendanceStatus::from_db("ON_TIME"), AttendanceStatus::OnTime);
        assert_eq!(AttendanceStatus::from_db("garbage"), AttendanceStatus::Unknown);
    }
}
