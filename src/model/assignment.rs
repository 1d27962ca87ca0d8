use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::location::Location;
use crate::model::user::UserBrief;

/// Assignment joined with its user and location columns.
#[derive(Debug, sqlx::FromRow)]
pub struct AssignmentRow {
    #[sqlx(rename = "assignment_id")]
    pub id: u64,
    pub user_id: u64,
    pub location_id: u64,
    #[sqlx(rename = "assignment_created_at")]
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    #[sqlx(flatten)]
    pub location: Location,
}

pub const ASSIGNMENT_SELECT: &str = r#"
    SELECT a.id AS assignment_id, a.user_id,
           a.location_id, a.created_at AS assignment_created_at,
           u.name AS user_name, u.email AS user_email,
           l.id, l.tenant_id, l.name, l.address, l.latitude, l.longitude,
           l.radius_meters, l.active, l.created_by_id, l.created_at
    FROM user_location_assignments a
    JOIN users u ON u.id = a.user_id
    JOIN locations l ON l.id = a.location_id
"#;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: u64,
    pub user_id: u64,
    pub location_id: u64,
    pub created_at: DateTime<Utc>,
    pub user: UserBrief,
    pub location: Location,
}

impl From<AssignmentRow> for AssignmentResponse {
    fn from(row: AssignmentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            location_id: row.location_id,
            created_at: row.created_at,
            user: UserBrief {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            location: row.location,
        }
    }
}
