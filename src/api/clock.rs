use crate::{
    api::{
        attendance::{AttendanceFilter, select_records},
        shift::shift_window,
        upload::{discard_image, read_form, save_image},
    },
    auth::auth::AuthUser,
    config::Config,
    db::is_unique_violation,
    error::{ApiError, ApiResult},
    model::{
        attendance::{
            ATTENDANCE_COLUMNS, ATTENDANCE_SELECT, AttendanceRecord, AttendanceResponse,
            AttendanceRow, AttendanceStatus, BreakRecord,
        },
        location::{LOCATION_COLUMNS, Location},
    },
    utils::{
        geo::{Fence, FenceMatch, evaluate_fences, valid_coordinates},
        time::{
            attendance_day, classify_clock_in, classify_clock_out, day_of_week, minutes_between,
            worked_minutes,
        },
    },
};
use actix_multipart::Multipart;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, dev::Payload, web};
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, MySql, MySqlPool};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct ClockPayload {
    #[schema(example = 37.7936)]
    pub latitude: f64,
    pub longitude: f64,
    /// Reported GPS accuracy in meters
    pub accuracy: Option<f64>,
}

impl ClockPayload {
    fn parse_number(value: Option<&str>) -> ApiResult<f64> {
        value
            .and_then(|v| v.parse::<f64>().ok())
            .ok_or_else(ApiError::invalid_payload)
    }

    /// Builds the payload from multipart text fields.
    pub fn from_fields(latitude: Option<&str>, longitude: Option<&str>, accuracy: Option<&str>) -> ApiResult<Self> {
        Ok(Self {
            latitude: Self::parse_number(latitude)?,
            longitude: Self::parse_number(longitude)?,
            accuracy: match accuracy {
                Some(v) if !v.is_empty() => Some(Self::parse_number(Some(v))?),
                _ => None,
            },
        })
    }

    fn validate(&self) -> ApiResult<()> {
        if valid_coordinates(self.latitude, self.longitude) {
            Ok(())
        } else {
            Err(ApiError::invalid_payload())
        }
    }
}

/// Clock request body: JSON coordinates, or a multipart form with the same
/// fields plus an optional `photo`. Multipart is streamed, never buffered
/// whole, so photos are bounded by `max_upload_bytes` alone.
pub enum ClockBody {
    Json(ClockPayload),
    Form(Multipart),
}

impl FromRequest for ClockBody {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type().starts_with("multipart/") {
            let form = Multipart::from_request(req, payload);
            Box::pin(async move { form.await.map(ClockBody::Form) })
        } else {
            let json = web::Json::<ClockPayload>::from_request(req, payload);
            Box::pin(async move { json.await.map(|j| ClockBody::Json(j.into_inner())) })
        }
    }
}

/// Coordinates plus the raw bytes of an optional `photo` part.
struct ClockRequest {
    payload: ClockPayload,
    photo: Option<Vec<u8>>,
}

async fn read_clock_request(body: ClockBody, config: &Config) -> ApiResult<ClockRequest> {
    let request = match body {
        ClockBody::Json(payload) => ClockRequest { payload, photo: None },
        ClockBody::Form(multipart) => {
            let form = read_form(multipart, "photo", config.max_upload_bytes).await?;
            ClockRequest {
                payload: ClockPayload::from_fields(
                    form.field("latitude"),
                    form.field("longitude"),
                    form.field("accuracy"),
                )?,
                photo: form.file,
            }
        }
    };
    request.payload.validate()?;
    Ok(request)
}

#[derive(Debug, sqlx::FromRow)]
struct FenceRow {
    id: u64,
    latitude: f64,
    longitude: f64,
    radius_meters: u32,
}

/// Active locations assigned to the user, as geofences.
async fn assigned_fences(pool: &MySqlPool, tenant_id: u64, user_id: u64) -> Result<Vec<Fence>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FenceRow>(
        r#"
        SELECT l.id, l.latitude, l.longitude, l.radius_meters
        FROM user_location_assignments a
        JOIN locations l ON l.id = a.location_id
        WHERE a.user_id = ? AND a.tenant_id = ? AND l.active = TRUE
        "#,
    )
    .bind(user_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Fence {
            location_id: r.id,
            latitude: r.latitude,
            longitude: r.longitude,
            radius_meters: f64::from(r.radius_meters),
        })
        .collect())
}

/// The fence the caller stands in, or the error to return.
pub fn check_geofence(payload: &ClockPayload, fences: &[Fence], buffer_meters: f64) -> ApiResult<FenceMatch> {
    if fences.is_empty() {
        return Err(ApiError::bad_request("No assigned locations"));
    }
    let outcome = evaluate_fences(payload.latitude, payload.longitude, fences, buffer_meters);
    outcome
        .matched
        .ok_or(ApiError::OutsideGeofence(outcome.nearest.map(|n| n.distance)))
}

async fn open_record<'c, E>(executor: E, user_id: u64) -> Result<Option<AttendanceRecord>, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records \
         WHERE user_id = ? AND clock_out_at IS NULL ORDER BY clock_in_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

async fn fetch_row(pool: &MySqlPool, record_id: u64) -> Result<AttendanceResponse, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRow>(&format!("{ATTENDANCE_SELECT} WHERE r.id = ?"))
        .bind(record_id)
        .fetch_one(pool)
        .await
        .map(AttendanceResponse::from)
}

#[derive(Serialize, ToSchema)]
pub struct ClockResponse {
    pub ok: bool,
    pub record: AttendanceResponse,
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub active: bool,
    pub record: Option<AttendanceResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct BreakResponse {
    pub ok: bool,
    pub record: BreakRecord,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Own attendance history
#[utoipa::path(
    get,
    path = "/api/employee/attendance",
    params(DateRange),
    responses((status = 200, description = "Own records with location", body = [AttendanceResponse])),
    tag = "Employee"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateRange>,
) -> ApiResult<HttpResponse> {
    let filter = AttendanceFilter {
        from: query.from,
        to: query.to,
        user_id: Some(auth.user_id),
    };
    let rows = select_records(pool.get_ref(), auth.tenant_id, &filter).await?;
    let body: Vec<AttendanceResponse> = rows.into_iter().map(AttendanceResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/employee/status",
    responses((status = 200, description = "Whether the caller is clocked in", body = StatusResponse)),
    tag = "Employee"
)]
pub async fn status(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let row = sqlx::query_as::<_, AttendanceRow>(&format!(
        "{ATTENDANCE_SELECT} WHERE r.user_id = ? AND r.tenant_id = ? AND r.clock_out_at IS NULL \
         ORDER BY r.clock_in_at DESC LIMIT 1"
    ))
    .bind(auth.user_id)
    .bind(auth.tenant_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let record = row.map(AttendanceResponse::from);
    Ok(HttpResponse::Ok().json(StatusResponse {
        active: record.is_some(),
        record,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employee/locations",
    responses((status = 200, description = "Own active assigned locations", body = [Location])),
    tag = "Employee"
)]
pub async fn my_locations(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let locations = sqlx::query_as::<_, Location>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations \
         WHERE tenant_id = ? AND active = TRUE \
           AND id IN (SELECT location_id FROM user_location_assignments WHERE user_id = ?) \
         ORDER BY name"
    ))
    .bind(auth.tenant_id)
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(locations))
}

/// Start a shift inside an assigned geofence
#[utoipa::path(
    post,
    path = "/api/employee/clock-in",
    request_body(content = ClockPayload, description = "JSON, or multipart with an optional `photo`"),
    responses(
        (status = 200, description = "Open record", body = ClockResponse),
        (status = 400, description = "No assigned locations, outside geofence or already clocked in")
    ),
    tag = "Employee"
)]
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: ClockBody,
) -> ApiResult<HttpResponse> {
    let ClockRequest { payload, photo } = read_clock_request(body, &config).await?;

    let fences = assigned_fences(pool.get_ref(), auth.tenant_id, auth.user_id).await?;
    let fence = check_geofence(&payload, &fences, config.gps_buffer_meters).map_err(|e| {
        warn!(lat = payload.latitude, lng = payload.longitude, "Clock-in rejected: {}", e);
        e
    })?;

    if open_record(pool.get_ref(), auth.user_id).await?.is_some() {
        return Err(ApiError::bad_request("Already clocked in"));
    }

    let now = Utc::now();
    let shift = shift_window(pool.get_ref(), auth.user_id, day_of_week(now)).await?;
    let status = classify_clock_in(now, shift.map(|s| s.0), config.late_grace_minutes);

    let photo = match photo {
        Some(bytes) => Some(save_image(&config.uploads_dir, bytes).await?),
        None => None,
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance_records
            (tenant_id, user_id, location_id, date, clock_in_at, clock_in_lat, clock_in_lng,
             clock_in_photo, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(auth.user_id)
    .bind(fence.location_id)
    .bind(attendance_day(now))
    .bind(now)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(photo.as_deref())
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await;

    let record_id = match inserted {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            if let Some(name) = &photo {
                discard_image(&config.uploads_dir, name).await;
            }
            // Lost a race with a concurrent clock-in.
            if is_unique_violation(&e) {
                return Err(ApiError::bad_request("Already clocked in"));
            }
            return Err(e.into());
        }
    };

    info!(record_id, location_id = fence.location_id, distance = fence.distance, %status, "Clocked in");

    let record = fetch_row(pool.get_ref(), record_id).await?;
    Ok(HttpResponse::Ok().json(ClockResponse { ok: true, record }))
}

/// End the open shift; closes a running break first
#[utoipa::path(
    post,
    path = "/api/employee/clock-out",
    request_body(content = ClockPayload, description = "JSON, or multipart with an optional `photo`"),
    responses(
        (status = 200, description = "Closed record", body = ClockResponse),
        (status = 400, description = "Outside geofence or not clocked in")
    ),
    tag = "Employee"
)]
#[instrument(skip_all, fields(user_id = auth.user_id))]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: ClockBody,
) -> ApiResult<HttpResponse> {
    let ClockRequest { payload, photo } = read_clock_request(body, &config).await?;

    let fences = assigned_fences(pool.get_ref(), auth.tenant_id, auth.user_id).await?;
    check_geofence(&payload, &fences, config.gps_buffer_meters)?;

    let record = open_record(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Not clocked in"))?;

    let now = Utc::now();
    let photo = match photo {
        Some(bytes) => Some(save_image(&config.uploads_dir, bytes).await?),
        None => None,
    };

    let closed = close_record(pool.get_ref(), &record, &payload, photo.as_deref(), now).await;
    let (total, break_minutes, status) = match closed {
        Ok(closed) => closed,
        Err(e) => {
            if let Some(name) = &photo {
                discard_image(&config.uploads_dir, name).await;
            }
            return Err(e);
        }
    };

    info!(record_id = record.id, total, break_minutes, %status, "Clocked out");

    let record = fetch_row(pool.get_ref(), record.id).await?;
    Ok(HttpResponse::Ok().json(ClockResponse { ok: true, record }))
}

/// Closes the open record and any running break in one transaction.
/// Returns worked minutes, break minutes and the final status.
async fn close_record(
    pool: &MySqlPool,
    record: &AttendanceRecord,
    payload: &ClockPayload,
    photo: Option<&str>,
    now: DateTime<Utc>,
) -> ApiResult<(i64, i64, AttendanceStatus)> {
    let mut tx = pool.begin().await?;

    let closed_break = close_open_break(&mut tx, record.id, now).await?;
    let break_minutes = i64::from(record.break_minutes) + closed_break.unwrap_or(0);

    let shift = shift_window(&mut *tx, record.user_id, day_of_week(now)).await?;
    let status = classify_clock_out(now, shift.map(|s| s.1), record.status());
    let total = worked_minutes(record.clock_in_at, now, break_minutes);

    let updated = sqlx::query(
        r#"
        UPDATE attendance_records
        SET clock_out_at = ?, clock_out_lat = ?, clock_out_lng = ?, clock_out_photo = ?,
            break_minutes = ?, total_minutes = ?, status = ?
        WHERE id = ? AND clock_out_at IS NULL
        "#,
    )
    .bind(now)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(photo)
    .bind(break_minutes)
    .bind(total)
    .bind(status.as_ref())
    .bind(record.id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::bad_request("Not clocked in"));
    }
    tx.commit().await?;

    Ok((total, break_minutes, status))
}

/// Ends the record's open break and returns its minutes; None when no
/// break was running.
async fn close_open_break(
    tx: &mut sqlx::Transaction<'_, MySql>,
    record_id: u64,
    now: DateTime<Utc>,
) -> Result<Option<i64>, sqlx::Error> {
    let open = sqlx::query_as::<_, BreakRecord>(
        "SELECT id, attendance_record_id, started_at, ended_at, total_minutes \
         FROM break_records WHERE attendance_record_id = ? AND ended_at IS NULL LIMIT 1",
    )
    .bind(record_id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(open) = open else {
        return Ok(None);
    };

    let minutes = minutes_between(open.started_at, now);
    sqlx::query("UPDATE break_records SET ended_at = ?, total_minutes = ? WHERE id = ?")
        .bind(now)
        .bind(minutes)
        .bind(open.id)
        .execute(&mut **tx)
        .await?;

    Ok(Some(minutes))
}

#[utoipa::path(
    post,
    path = "/api/employee/break-start",
    responses(
        (status = 200, description = "Break started", body = BreakResponse),
        (status = 400, description = "Not clocked in or break already active")
    ),
    tag = "Employee"
)]
pub async fn break_start(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let record = open_record(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Not clocked in"))?;

    let running = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM break_records WHERE attendance_record_id = ? AND ended_at IS NULL LIMIT 1",
    )
    .bind(record.id)
    .fetch_optional(pool.get_ref())
    .await?;
    if running.is_some() {
        return Err(ApiError::bad_request("Break already active"));
    }

    let inserted = sqlx::query("INSERT INTO break_records (attendance_record_id, started_at) VALUES (?, ?)")
        .bind(record.id)
        .bind(Utc::now())
        .execute(pool.get_ref())
        .await;

    let break_id = match inserted {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_unique_violation(&e) => return Err(ApiError::bad_request("Break already active")),
        Err(e) => return Err(e.into()),
    };

    let record = sqlx::query_as::<_, BreakRecord>(
        "SELECT id, attendance_record_id, started_at, ended_at, total_minutes \
         FROM break_records WHERE id = ?",
    )
    .bind(break_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(BreakResponse { ok: true, record }))
}

#[utoipa::path(
    post,
    path = "/api/employee/break-end",
    responses(
        (status = 200, description = "Break ended"),
        (status = 400, description = "Not clocked in or no active break")
    ),
    tag = "Employee"
)]
pub async fn break_end(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let record = open_record(pool.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Not clocked in"))?;

    let mut tx = pool.begin().await?;
    let minutes = close_open_break(&mut tx, record.id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::bad_request("No active break"))?;

    sqlx::query("UPDATE attendance_records SET break_minutes = break_minutes + ? WHERE id = ?")
        .bind(minutes)
        .bind(record.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(record_id = record.id, minutes, "Break ended");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, http::header, test};

    fn fence(id: u64, lat: f64, lng: f64, radius: f64) -> Fence {
        Fence {
            location_id: id,
            latitude: lat,
            longitude: lng,
            radius_meters: radius,
        }
    }

    fn at(lat: f64, lng: f64) -> ClockPayload {
        ClockPayload {
            latitude: lat,
            longitude: lng,
            accuracy: None,
        }
    }

    #[::core::prelude::v1::test]
    fn multipart_fields_parse_as_numbers() {
        let p = ClockPayload::from_fields(Some("37.5"), Some("-122.25"), Some("12")).unwrap();
        assert_eq!(p, ClockPayload { latitude: 37.5, longitude: -122.25, accuracy: Some(12.0) });

        let p = ClockPayload::from_fields(Some("1"), Some("2"), Some("")).unwrap();
        assert_eq!(p.accuracy, None);

        assert!(ClockPayload::from_fields(None, Some("2"), None).is_err());
        assert!(ClockPayload::from_fields(Some("north"), Some("2"), None).is_err());
    }

    #[::core::prelude::v1::test]
    fn coordinates_must_be_on_earth() {
        assert!(at(37.0, -122.0).validate().is_ok());
        assert!(at(95.0, 0.0).validate().is_err());
    }

    #[::core::prelude::v1::test]
    fn geofence_needs_assignments() {
        let err = check_geofence(&at(0.0, 0.0), &[], 20.0).unwrap_err();
        assert_eq!(err.to_string(), "No assigned locations");
    }

    #[::core::prelude::v1::test]
    fn geofence_outside_reports_nearest() {
        let fences = [fence(1, 0.01, 0.0, 50.0)];
        match check_geofence(&at(0.0, 0.0), &fences, 20.0) {
            Err(ApiError::OutsideGeofence(Some(d))) => assert!(d > 1_000.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[::core::prelude::v1::test]
    fn geofence_inside_picks_matching_location() {
        let fences = [fence(1, 0.01, 0.0, 50.0), fence(2, 0.0005, 0.0, 100.0)];
        let hit = check_geofence(&at(0.0, 0.0), &fences, 20.0).unwrap();
        assert_eq!(hit.location_id, 2);
    }

    #[::core::prelude::v1::test]
    fn status_response_shape() {
        let value = serde_json::to_value(StatusResponse { active: false, record: None }).unwrap();
        assert_eq!(value, serde_json::json!({ "active": false, "record": null }));
    }

    async fn photo_len(body: ClockBody, config: web::Data<Config>) -> ApiResult<HttpResponse> {
        let request = read_clock_request(body, &config).await?;
        let len = request.photo.map_or(0, |p| p.len());
        Ok(HttpResponse::Ok().body(len.to_string()))
    }

    const BOUNDARY: &str = "geoattend-form-boundary";

    fn form_with_photo(photo: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in [("latitude", "37.5"), ("longitude", "-122.25")] {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"p.jpg\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(photo);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn form_request(body: Vec<u8>) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/clock")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn large_photos_stream_past_default_payload_limit() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/clock", web::post().to(photo_len)),
        )
        .await;

        let photo = vec![0xAB_u8; 1024 * 1024];
        let resp = test::call_service(&app, form_request(form_with_photo(&photo)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&test::read_body(resp).await[..], b"1048576");
    }

    #[actix_web::test]
    async fn oversized_photo_gets_json_error() {
        let config = Config {
            max_upload_bytes: 1024,
            ..Config::for_tests()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .route("/clock", web::post().to(photo_len)),
        )
        .await;

        let resp =
            test::call_service(&app, form_request(form_with_photo(&[0xAB; 4096])).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "File too large");
    }

    #[actix_web::test]
    async fn json_body_still_accepted() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Config::for_tests()))
                .route("/clock", web::post().to(photo_len)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/clock")
            .set_json(serde_json::json!({ "latitude": 37.5, "longitude": -122.25 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(&test::read_body(resp).await[..], b"0");
    }
}
