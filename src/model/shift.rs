use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::user::UserBrief;

/// Weekly recurring work window. `day_of_week` counts from Sunday = 0,
/// times are "HH:MM".
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Shift {
    pub id: u64,
    pub user_id: u64,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ShiftRow {
    #[sqlx(flatten)]
    pub shift: Shift,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 11,
    "userId": 7,
    "dayOfWeek": 1,
    "startTime": "09:00",
    "endTime": "17:00",
    "timezone": "UTC",
    "createdAt": "2026-01-01T09:00:00Z",
    "user": { "id": 7, "name": "Employee User", "email": "employee@geoattend.local" }
}))]
pub struct ShiftResponse {
    pub id: u64,
    pub user_id: u64,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub user: UserBrief,
}

impl From<ShiftRow> for ShiftResponse {
    fn from(row: ShiftRow) -> Self {
        let ShiftRow {
            shift,
            created_at,
            user_name,
            user_email,
        } = row;

        Self {
            id: shift.id,
            user_id: shift.user_id,
            day_of_week: shift.day_of_week,
            start_time: shift.start_time,
            end_time: shift.end_time,
            timezone: shift.timezone,
            created_at,
            user: UserBrief {
                id: shift.user_id,
                name: user_name,
                email: user_email,
            },
        }
    }
}
