use crate::{
    api::shift::shift_window,
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::attendance::{
        ATTENDANCE_COLUMNS, ATTENDANCE_SELECT, AttendanceRecord, AttendanceResponse,
        AttendanceRow, AttendanceStatus,
    },
    utils::time::{classify_clock_in, classify_clock_out, day_of_week, worked_minutes},
};
use actix_web::{HttpResponse, http::header, web};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::{borrow::Cow, collections::BTreeMap};
use strum_macros::{AsRefStr, Display};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct AttendanceFilter {
    /// First attendance day (inclusive), YYYY-MM-DD
    pub from: Option<NaiveDate>,
    /// Last attendance day (inclusive), YYYY-MM-DD
    pub to: Option<NaiveDate>,
    pub user_id: Option<u64>,
}

/// Attendance rows of a tenant, newest first, optionally narrowed to one
/// user and an inclusive day range.
pub(crate) async fn select_records(
    pool: &MySqlPool,
    tenant_id: u64,
    filter: &AttendanceFilter,
) -> Result<Vec<AttendanceRow>, sqlx::Error> {
    let mut qb: QueryBuilder<MySql> = QueryBuilder::new(ATTENDANCE_SELECT);
    qb.push(" WHERE r.tenant_id = ").push_bind(tenant_id);

    if let Some(user_id) = filter.user_id {
        qb.push(" AND r.user_id = ").push_bind(user_id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND r.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND r.date <= ").push_bind(to);
    }
    qb.push(" ORDER BY r.clock_in_at DESC, r.id DESC");

    qb.build_query_as::<AttendanceRow>().fetch_all(pool).await
}

/// Minimal projection used by the aggregate endpoints.
#[derive(Debug, sqlx::FromRow)]
pub struct StatRow {
    pub user_id: u64,
    pub total_minutes: Option<i32>,
    pub status: String,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub total_hours: i64,
    pub late_count: usize,
    pub records: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserStats {
    pub minutes: i64,
    pub late: u32,
    pub early: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub by_user: BTreeMap<u64, UserStats>,
}

pub fn summarize(rows: &[StatRow]) -> AttendanceSummary {
    let minutes: i64 = rows.iter().map(|r| i64::from(r.total_minutes.unwrap_or(0))).sum();
    let late_count = rows
        .iter()
        .filter(|r| AttendanceStatus::from_db(&r.status) == AttendanceStatus::Late)
        .count();

    AttendanceSummary {
        total_hours: (minutes as f64 / 60.0).round() as i64,
        late_count,
        records: rows.len(),
    }
}

/// Per-employee totals. Every listed employee gets an entry, records of
/// anyone else (admins, other tenants) are ignored.
pub fn stats_by_user(employee_ids: &[u64], rows: &[StatRow]) -> BTreeMap<u64, UserStats> {
    let mut by_user: BTreeMap<u64, UserStats> = employee_ids
        .iter()
        .map(|id| (*id, UserStats::default()))
        .collect();

    for row in rows {
        let Some(stats) = by_user.get_mut(&row.user_id) else {
            continue;
        };
        stats.minutes += i64::from(row.total_minutes.unwrap_or(0));
        match AttendanceStatus::from_db(&row.status) {
            AttendanceStatus::Late => stats.late += 1,
            AttendanceStatus::EarlyDeparture => stats.early += 1,
            _ => {}
        }
    }

    by_user
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Late,
    EarlyDeparture,
    MissingClockOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: Severity,
    pub message: String,
    pub record: AttendanceResponse,
}

/// Alerts for a batch of records, newest record first. One record can
/// raise several alerts (late and never clocked out).
pub fn derive_alerts(
    mut records: Vec<AttendanceResponse>,
    now: DateTime<Utc>,
    missing_clock_out_hours: i64,
) -> Vec<Alert> {
    records.sort_by(|a, b| b.clock_in_at.cmp(&a.clock_in_at));
    let overdue = Duration::hours(missing_clock_out_hours);

    let mut alerts = Vec::new();
    for record in records {
        let mut raised = Vec::with_capacity(2);
        match record.status {
            AttendanceStatus::Late => {
                raised.push((AlertType::Late, Severity::Medium, "Late arrival".to_string()))
            }
            AttendanceStatus::EarlyDeparture => raised.push((
                AlertType::EarlyDeparture,
                Severity::Low,
                "Early departure".to_string(),
            )),
            _ => {}
        }
        if record.clock_out_at.is_none() && now - record.clock_in_at > overdue {
            raised.push((
                AlertType::MissingClockOut,
                Severity::High,
                format!("No clock-out after {missing_clock_out_hours}h"),
            ));
        }

        alerts.extend(raised.into_iter().map(|(kind, severity, message)| Alert {
            kind,
            severity,
            message,
            record: record.clone(),
        }));
    }
    alerts
}

pub const CSV_HEADER: &str = "employee,date,clock_in,clock_out,total_minutes,location";

/// RFC 4180 field: quoted when it contains a separator, quote or line break.
pub fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn render_csv(rows: &[AttendanceRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");

    for row in rows {
        let r = &row.record;
        let fields = [
            row.user_name.clone(),
            r.date.format("%Y-%m-%d").to_string(),
            iso(r.clock_in_at),
            r.clock_out_at.map(iso).unwrap_or_default(),
            r.total_minutes.map(|m| m.to_string()).unwrap_or_default(),
            row.location_name.clone().unwrap_or_default(),
        ];
        let line: Vec<Cow<'_, str>> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Total minutes and status of a record re-derived from its timestamps and
/// the shift of the clock-in weekday. Open records keep no total.
pub fn rederive(
    record: &AttendanceRecord,
    shift: Option<(NaiveTime, NaiveTime)>,
    grace_minutes: i64,
) -> (Option<i64>, AttendanceStatus) {
    let status = classify_clock_in(record.clock_in_at, shift.map(|s| s.0), grace_minutes);

    match record.clock_out_at {
        Some(out) => (
            Some(worked_minutes(record.clock_in_at, out, i64::from(record.break_minutes))),
            classify_clock_out(out, shift.map(|s| s.1), status),
        ),
        None => (None, status),
    }
}

/// Attendance records of the tenant
#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    params(AttendanceFilter),
    responses((status = 200, description = "Records with user and location", body = [AttendanceResponse])),
    tag = "Reports"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> ApiResult<HttpResponse> {
    let rows = select_records(pool.get_ref(), auth.tenant_id, &query).await?;
    let body: Vec<AttendanceResponse> = rows.into_iter().map(AttendanceResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn stat_rows(pool: &MySqlPool, tenant_id: u64) -> Result<Vec<StatRow>, sqlx::Error> {
    sqlx::query_as::<_, StatRow>(
        "SELECT user_id, total_minutes, status FROM attendance_records WHERE tenant_id = ?",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

#[utoipa::path(
    get,
    path = "/api/admin/attendance/summary",
    responses((status = 200, description = "Tenant-wide totals", body = AttendanceSummary)),
    tag = "Reports"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    let rows = stat_rows(pool.get_ref(), auth.tenant_id).await?;
    Ok(HttpResponse::Ok().json(summarize(&rows)))
}

/// Minutes worked, late arrivals and early departures per employee
#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    responses((status = 200, description = "Stats keyed by user id", body = Analytics)),
    tag = "Reports"
)]
pub async fn analytics(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let employee_ids = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE tenant_id = ? AND role = 'EMPLOYEE'",
    )
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let rows = stat_rows(pool.get_ref(), auth.tenant_id).await?;

    Ok(HttpResponse::Ok().json(Analytics {
        by_user: stats_by_user(&employee_ids, &rows),
    }))
}

/// Who is clocked in right now
#[utoipa::path(
    get,
    path = "/api/admin/live",
    responses((status = 200, description = "Open records", body = [AttendanceResponse])),
    tag = "Reports"
)]
pub async fn live(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
        "{ATTENDANCE_SELECT} WHERE r.tenant_id = ? AND r.clock_out_at IS NULL \
         ORDER BY r.clock_in_at DESC"
    ))
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<AttendanceResponse> = rows.into_iter().map(AttendanceResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/admin/export",
    params(AttendanceFilter),
    responses((status = 200, description = "CSV download", content_type = "text/csv", body = String)),
    tag = "Reports"
)]
#[instrument(skip_all, fields(tenant_id = auth.tenant_id))]
pub async fn export_csv(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> ApiResult<HttpResponse> {
    let rows = select_records(pool.get_ref(), auth.tenant_id, &query).await?;
    info!(rows = rows.len(), "Attendance exported");

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=attendance.csv"))
        .body(render_csv(&rows)))
}

/// Re-derive total minutes and status of one record
#[utoipa::path(
    post,
    path = "/api/admin/recalculate/{id}",
    params(("id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Updated record", body = AttendanceResponse),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Reports"
)]
#[instrument(skip(auth, pool, config), fields(tenant_id = auth.tenant_id))]
pub async fn recalculate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let record_id = path.into_inner();

    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records WHERE id = ? AND tenant_id = ?"
    ))
    .bind(record_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Attendance record not found"))?;

    let shift = shift_window(pool.get_ref(), record.user_id, day_of_week(record.clock_in_at)).await?;
    let (total_minutes, status) = rederive(&record, shift, config.late_grace_minutes);

    sqlx::query("UPDATE attendance_records SET total_minutes = ?, status = ? WHERE id = ?")
        .bind(total_minutes)
        .bind(status.as_ref())
        .bind(record_id)
        .execute(pool.get_ref())
        .await?;

    info!(record_id, ?total_minutes, %status, "Attendance recalculated");

    let row = sqlx::query_as::<_, AttendanceRow>(&format!("{ATTENDANCE_SELECT} WHERE r.id = ?"))
        .bind(record_id)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(row)))
}

/// Late arrivals, early departures and forgotten clock-outs
#[utoipa::path(
    get,
    path = "/api/admin/alerts",
    responses((status = 200, description = "Alerts, newest first", body = [Alert])),
    tag = "Reports"
)]
pub async fn alerts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let now = Utc::now();
    let since = now - Duration::days(config.alert_window_days);

    let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
        "{ATTENDANCE_SELECT} WHERE r.tenant_id = ? AND r.clock_in_at >= ? \
         ORDER BY r.clock_in_at DESC"
    ))
    .bind(auth.tenant_id)
    .bind(since)
    .fetch_all(pool.get_ref())
    .await?;

    let records = rows.into_iter().map(AttendanceResponse::from).collect();
    Ok(HttpResponse::Ok().json(derive_alerts(records, now, config.missing_clock_out_hours)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    fn record(id: u64, clock_in: DateTime<Utc>, clock_out: Option<DateTime<Utc>>, status: &str) -> AttendanceRecord {
        AttendanceRecord {
            id,
            tenant_id: 1,
            user_id: 7,
            location_id: Some(3),
            date: clock_in.date_naive(),
            clock_in_at: clock_in,
            clock_out_at: clock_out,
            clock_in_lat: 37.7936,
            clock_in_lng: -122.3958,
            clock_out_lat: None,
            clock_out_lng: None,
            clock_in_photo: None,
            clock_out_photo: None,
            break_minutes: 0,
            total_minutes: None,
            status: status.to_string(),
        }
    }

    fn row(record: AttendanceRecord, user: &str, location: Option<&str>) -> AttendanceRow {
        AttendanceRow {
            record,
            user_name: user.to_string(),
            user_email: "employee@geoattend.local".to_string(),
            location_name: location.map(str::to_string),
            location_address: None,
        }
    }

    fn stat(user_id: u64, minutes: Option<i32>, status: &str) -> StatRow {
        StatRow {
            user_id,
            total_minutes: minutes,
            status: status.to_string(),
        }
    }

    #[test]
    fn summary_rounds_hours_and_counts_late() {
        let rows = vec![
            stat(1, Some(200), "LATE"),
            stat(2, Some(130), "ON_TIME"),
            stat(2, None, "LATE"),
        ];
        assert_eq!(
            summarize(&rows),
            AttendanceSummary {
                total_hours: 6,
                late_count: 2,
                records: 3
            }
        );
        assert_eq!(summarize(&[]).total_hours, 0);
    }

    #[test]
    fn analytics_only_counts_listed_employees() {
        let rows = vec![
            stat(1, Some(60), "LATE"),
            stat(1, Some(30), "EARLY_DEPARTURE"),
            stat(9, Some(500), "LATE"),
        ];
        let by_user = stats_by_user(&[1, 2], &rows);

        assert_eq!(by_user.len(), 2);
        assert_eq!(by_user[&1], UserStats { minutes: 90, late: 1, early: 1 });
        assert_eq!(by_user[&2], UserStats::default());
    }

    #[test]
    fn analytics_serializes_ids_as_keys() {
        let value = serde_json::to_value(Analytics {
            by_user: stats_by_user(&[4], &[]),
        })
        .unwrap();
        assert_eq!(value["byUser"]["4"]["minutes"], 0);
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("HQ"), "HQ");
        assert_eq!(csv_field("Doe, Jane"), "\"Doe, Jane\"");
        assert_eq!(csv_field("the \"lab\""), "\"the \"\"lab\"\"\"");
        assert_eq!(csv_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn csv_export_layout() {
        let mut closed = record(1, utc(2, 9, 0), Some(utc(2, 17, 0)), "ON_TIME");
        closed.total_minutes = Some(480);
        let open = record(2, utc(3, 9, 0), None, "LATE");

        let csv = render_csv(&[
            row(closed, "Doe, Jane", Some("HQ")),
            row(open, "Sam", None),
        ]);
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "\"Doe, Jane\",2026-03-02,2026-03-02T09:00:00Z,2026-03-02T17:00:00Z,480,HQ"
        );
        assert_eq!(lines[2], "Sam,2026-03-03,2026-03-03T09:00:00Z,,,");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn alerts_cover_each_kind_newest_first() {
        let now = utc(10, 12, 0);
        let records: Vec<AttendanceResponse> = vec![
            record(1, utc(2, 9, 30), Some(utc(2, 17, 0)), "LATE"),
            record(2, utc(9, 8, 0), None, "LATE"),
            record(3, utc(5, 9, 0), Some(utc(5, 15, 0)), "EARLY_DEPARTURE"),
            record(4, utc(10, 9, 0), None, "ON_TIME"),
            record(5, utc(4, 9, 0), Some(utc(4, 17, 0)), "ON_TIME"),
        ]
        .into_iter()
        .map(|r| AttendanceResponse::from(row(r, "Sam", Some("HQ"))))
        .collect();

        let alerts = derive_alerts(records, now, 12);
        let summary: Vec<(u64, AlertType, Severity)> = alerts
            .iter()
            .map(|a| (a.record.id, a.kind, a.severity))
            .collect();

        assert_eq!(
            summary,
            vec![
                (2, AlertType::Late, Severity::Medium),
                (2, AlertType::MissingClockOut, Severity::High),
                (3, AlertType::EarlyDeparture, Severity::Low),
                (1, AlertType::Late, Severity::Medium),
            ]
        );
    }

    #[test]
    fn alert_json_shape() {
        let r = record(1, utc(2, 9, 30), None, "LATE");
        let alerts = derive_alerts(vec![AttendanceResponse::from(row(r, "Sam", None))], utc(2, 10, 0), 12);
        let value = serde_json::to_value(&alerts[0]).unwrap();

        assert_eq!(value["type"], "LATE");
        assert_eq!(value["severity"], "medium");
        assert_eq!(value["record"]["user"]["name"], "Sam");
    }

    #[test]
    fn rederive_uses_shift_and_breaks() {
        let shift = Some((NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(17, 0, 0).unwrap()));

        let mut r = record(1, utc(2, 9, 10), Some(utc(2, 17, 10)), "UNKNOWN");
        r.break_minutes = 30;
        assert_eq!(rederive(&r, shift, 5), (Some(450), AttendanceStatus::Late));

        let r = record(2, utc(2, 8, 55), Some(utc(2, 16, 0)), "ON_TIME");
        assert_eq!(rederive(&r, shift, 5), (Some(425), AttendanceStatus::EarlyDeparture));

        let r = record(3, utc(2, 8, 55), None, "LATE");
        assert_eq!(rederive(&r, shift, 5), (None, AttendanceStatus::OnTime));

        let r = record(4, utc(2, 8, 55), Some(utc(2, 12, 0)), "LATE");
        assert_eq!(rederive(&r, None, 5), (Some(185), AttendanceStatus::Unknown));
    }
}
