use crate::{
    api::employee::fetch_user,
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::shift::{Shift, ShiftResponse, ShiftRow},
    models::OkResponse,
    utils::time::{normalize_hhmm, parse_hhmm},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, MySql, MySqlPool};
use std::collections::BTreeSet;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkShiftRequest {
    pub user_id: u64,
    /// Sunday = 0 .. Saturday = 6
    #[schema(example = json!([1, 2, 3, 4, 5]))]
    pub days: Vec<u8>,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Replace shifts already scheduled on these days
    #[serde(default)]
    pub overwrite: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Serialize, ToSchema)]
pub struct BulkShiftResponse {
    pub ok: bool,
    pub created: usize,
    pub skipped: usize,
}

/// Validated bulk request: unique days, normalised "HH:MM" times.
#[derive(Debug, PartialEq)]
pub struct ShiftTemplate {
    pub days: BTreeSet<u8>,
    pub start_time: String,
    pub end_time: String,
}

pub fn validate_template(days: &[u8], start: &str, end: &str) -> Result<ShiftTemplate, ApiError> {
    if days.is_empty() {
        return Err(ApiError::bad_request("Select at least one day"));
    }
    if days.iter().any(|d| *d > 6) {
        return Err(ApiError::bad_request("Days must be between 0 (Sunday) and 6 (Saturday)"));
    }

    let (Some(start_time), Some(end_time)) = (normalize_hhmm(start), normalize_hhmm(end)) else {
        return Err(ApiError::bad_request("Times must be HH:MM"));
    };

    // Both parse: normalize_hhmm already accepted them.
    if parse_hhmm(&end_time) <= parse_hhmm(&start_time) {
        return Err(ApiError::bad_request("End time must be after start time"));
    }

    Ok(ShiftTemplate {
        days: days.iter().copied().collect(),
        start_time,
        end_time,
    })
}

/// Splits requested days into (days to write, days skipped).
pub fn plan_days(requested: &BTreeSet<u8>, existing: &BTreeSet<u8>, overwrite: bool) -> (Vec<u8>, Vec<u8>) {
    if overwrite {
        return (requested.iter().copied().collect(), Vec::new());
    }
    requested.iter().copied().partition(|d| !existing.contains(d))
}

/// The user's shift for a weekday as parsed (start, end). Rows with
/// unparseable times count as no shift.
pub(crate) async fn shift_window<'c, E>(
    executor: E,
    user_id: u64,
    day: u8,
) -> Result<Option<(NaiveTime, NaiveTime)>, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    let shift = sqlx::query_as::<_, Shift>(
        r#"
        SELECT id, user_id, day_of_week, start_time, end_time, timezone
        FROM shifts
        WHERE user_id = ? AND day_of_week = ?
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(day)
    .fetch_optional(executor)
    .await?;

    Ok(shift.and_then(|s| Some((parse_hhmm(&s.start_time)?, parse_hhmm(&s.end_time)?))))
}

#[utoipa::path(
    get,
    path = "/api/admin/shifts",
    responses((status = 200, description = "Tenant shifts with user", body = [ShiftResponse])),
    tag = "Shifts"
)]
pub async fn list_shifts(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, ShiftRow>(
        r#"
        SELECT s.id, s.user_id, s.day_of_week, s.start_time, s.end_time, s.timezone,
               s.created_at, u.name AS user_name, u.email AS user_email
        FROM shifts s
        JOIN users u ON u.id = s.user_id
        WHERE s.tenant_id = ?
        ORDER BY u.name, s.day_of_week
        "#,
    )
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<ShiftResponse> = rows.into_iter().map(ShiftResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Schedule the same window on several weekdays
#[utoipa::path(
    post,
    path = "/api/admin/shifts/bulk",
    request_body = BulkShiftRequest,
    responses(
        (status = 200, description = "Shifts written", body = BulkShiftResponse),
        (status = 400, description = "Invalid days or times"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Shifts"
)]
pub async fn bulk_create_shifts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BulkShiftRequest>,
) -> ApiResult<HttpResponse> {
    let template = validate_template(&payload.days, &payload.start_time, &payload.end_time)?;
    let timezone = payload.timezone.trim();
    if timezone.is_empty() || timezone.len() > 64 {
        return Err(ApiError::invalid_payload());
    }

    fetch_user(pool.get_ref(), auth.tenant_id, payload.user_id).await?;

    let mut tx = pool.begin().await?;

    let existing: BTreeSet<u8> =
        sqlx::query_scalar::<_, u8>("SELECT day_of_week FROM shifts WHERE user_id = ? AND tenant_id = ?")
            .bind(payload.user_id)
            .bind(auth.tenant_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

    let (write_days, skipped) = plan_days(&template.days, &existing, payload.overwrite);

    for day in &write_days {
        if payload.overwrite {
            sqlx::query("DELETE FROM shifts WHERE user_id = ? AND tenant_id = ? AND day_of_week = ?")
                .bind(payload.user_id)
                .bind(auth.tenant_id)
                .bind(*day)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO shifts (tenant_id, user_id, day_of_week, start_time, end_time, timezone)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(auth.tenant_id)
        .bind(payload.user_id)
        .bind(*day)
        .bind(&template.start_time)
        .bind(&template.end_time)
        .bind(timezone)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        user_id = payload.user_id,
        created = write_days.len(),
        skipped = skipped.len(),
        "Shifts scheduled"
    );

    Ok(HttpResponse::Ok().json(BulkShiftResponse {
        ok: true,
        created: write_days.len(),
        skipped: skipped.len(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/shifts/{id}",
    params(("id" = u64, Path, description = "Shift ID")),
    responses(
        (status = 200, description = "Deleted", body = OkResponse),
        (status = 404, description = "Shift not found")
    ),
    tag = "Shifts"
)]
pub async fn delete_shift(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let result = sqlx::query("DELETE FROM shifts WHERE id = ? AND tenant_id = ?")
        .bind(path.into_inner())
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Shift not found"));
    }

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(days: &[u8]) -> BTreeSet<u8> {
        days.iter().copied().collect()
    }

    #[test]
    fn template_normalises_and_dedupes() {
        let t = validate_template(&[5, 1, 1, 3], "9:00", "17:30").unwrap();
        assert_eq!(t.days, set(&[1, 3, 5]));
        assert_eq!(t.start_time, "09:00");
        assert_eq!(t.end_time, "17:30");
    }

    #[test]
    fn template_rejects_bad_input() {
        assert!(validate_template(&[], "09:00", "17:00").is_err());
        assert!(validate_template(&[7], "09:00", "17:00").is_err());
        assert!(validate_template(&[1], "9am", "17:00").is_err());
        assert!(validate_template(&[1], "17:00", "09:00").is_err());
        assert!(validate_template(&[1], "09:00", "09:00").is_err());
    }

    #[test]
    fn without_overwrite_existing_days_are_skipped() {
        let (write, skipped) = plan_days(&set(&[1, 2, 3]), &set(&[2, 6]), false);
        assert_eq!(write, vec![1, 3]);
        assert_eq!(skipped, vec![2]);
    }

    #[test]
    fn overwrite_writes_every_day() {
        let (write, skipped) = plan_days(&set(&[1, 2, 3]), &set(&[2]), true);
        assert_eq!(write, vec![1, 2, 3]);
        assert!(skipped.is_empty());
    }
}
