use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult},
    model::location::{LOCATION_COLUMNS, Location},
    models::OkResponse,
    utils::{
        db_utils::{SqlValue, UpdateBuilder, execute_update},
        geo::valid_coordinates,
    },
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocation {
    #[schema(example = "HQ")]
    #[validate(length(min = 1))]
    pub name: String,
    #[schema(example = "1 Market St, San Francisco")]
    #[validate(length(min = 1))]
    pub address: String,
    #[schema(example = 37.7936)]
    pub latitude: f64,
    pub longitude: f64,
    #[schema(example = 150)]
    #[validate(range(min = 1))]
    pub radius_meters: u32,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(min = 1))]
    pub radius_meters: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct LocationFilter {
    /// Include deactivated locations
    pub include_inactive: Option<bool>,
}

pub(crate) async fn fetch_location(pool: &MySqlPool, tenant_id: u64, id: u64) -> ApiResult<Location> {
    sqlx::query_as::<_, Location>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = ? AND tenant_id = ?"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Location not found"))
}

fn list_sql(include_inactive: bool) -> String {
    let active_clause = if include_inactive { "" } else { " AND active = TRUE" };
    format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE tenant_id = ?{active_clause} \
         ORDER BY created_at DESC, id DESC"
    )
}

/// The tenant's locations, newest first. Deactivated ones only on request.
pub(crate) async fn select_locations(
    pool: &MySqlPool,
    tenant_id: u64,
    include_inactive: bool,
) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>(&list_sql(include_inactive))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

/// List locations, newest first
#[utoipa::path(
    get,
    path = "/api/admin/locations",
    params(LocationFilter),
    responses((status = 200, description = "Tenant locations", body = [Location])),
    tag = "Locations"
)]
pub async fn list_locations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LocationFilter>,
) -> ApiResult<HttpResponse> {
    let locations =
        select_locations(pool.get_ref(), auth.tenant_id, query.include_inactive.unwrap_or(false)).await?;
    Ok(HttpResponse::Ok().json(locations))
}

#[utoipa::path(
    get,
    path = "/api/admin/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location", body = Location),
        (status = 404, description = "Location not found")
    ),
    tag = "Locations"
)]
pub async fn get_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let location = fetch_location(pool.get_ref(), auth.tenant_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(location))
}

#[utoipa::path(
    post,
    path = "/api/admin/locations",
    request_body = CreateLocation,
    responses(
        (status = 200, description = "Created location", body = Location),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Locations"
)]
pub async fn create_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLocation>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;
    if !valid_coordinates(payload.latitude, payload.longitude) {
        return Err(ApiError::invalid_payload());
    }

    let id = sqlx::query(
        r#"
        INSERT INTO locations
            (tenant_id, name, address, latitude, longitude, radius_meters, created_by_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.tenant_id)
    .bind(payload.name.trim())
    .bind(payload.address.trim())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.radius_meters)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?
    .last_insert_id();

    info!(location_id = id, tenant_id = auth.tenant_id, "Location created");

    let location = fetch_location(pool.get_ref(), auth.tenant_id, id).await?;
    Ok(HttpResponse::Ok().json(location))
}

#[utoipa::path(
    patch,
    path = "/api/admin/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    request_body = UpdateLocation,
    responses(
        (status = 200, description = "Updated location", body = Location),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Location not found")
    ),
    tag = "Locations"
)]
pub async fn update_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLocation>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;
    let location_id = path.into_inner();

    if payload.latitude.is_some_and(|lat| !valid_coordinates(lat, 0.0))
        || payload.longitude.is_some_and(|lng| !valid_coordinates(0.0, lng))
    {
        return Err(ApiError::invalid_payload());
    }

    fetch_location(pool.get_ref(), auth.tenant_id, location_id).await?;

    let update = UpdateBuilder::new("locations")
        .set("name", payload.name.as_ref().map(|v| SqlValue::String(v.trim().to_string())))
        .set("address", payload.address.as_ref().map(|v| SqlValue::String(v.trim().to_string())))
        .set("latitude", payload.latitude.map(SqlValue::F64))
        .set("longitude", payload.longitude.map(SqlValue::F64))
        .set("radius_meters", payload.radius_meters.map(|r| SqlValue::U64(r.into())))
        .set("active", payload.active.map(SqlValue::Bool))
        .build_for_tenant(location_id, auth.tenant_id);

    if let Some(update) = update {
        execute_update(pool.get_ref(), update).await?;
    }

    let location = fetch_location(pool.get_ref(), auth.tenant_id, location_id).await?;
    Ok(HttpResponse::Ok().json(location))
}

/// Delete a location; its assignments go with it, attendance history stays
#[utoipa::path(
    delete,
    path = "/api/admin/locations/{id}",
    params(("id" = u64, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Deleted", body = OkResponse),
        (status = 404, description = "Location not found")
    ),
    tag = "Locations"
)]
pub async fn delete_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let location_id = path.into_inner();

    let result = sqlx::query("DELETE FROM locations WHERE id = ? AND tenant_id = ?")
        .bind(location_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Location not found"));
    }

    info!(location_id, "Location deleted");
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    #[test]
    fn default_listing_hides_inactive() {
        let sql = list_sql(false);
        assert!(sql.contains("WHERE tenant_id = ? AND active = TRUE ORDER BY"));

        let sql = list_sql(true);
        assert!(sql.contains("WHERE tenant_id = ? ORDER BY"));
        assert!(!sql.contains("active = TRUE"));
    }

    async fn location(pool: &MySqlPool, tenant_id: u64, name: &str, active: bool) -> u64 {
        sqlx::query(
            "INSERT INTO locations (tenant_id, name, address, latitude, longitude, radius_meters, active) \
             VALUES (?, ?, 'somewhere', 37.79, -122.39, 100, ?)",
        )
        .bind(tenant_id)
        .bind(name)
        .bind(active)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id()
    }

    #[sqlx::test]
    #[ignore = "requires DATABASE_URL and a MySQL server"]
    async fn listing_is_tenant_scoped_and_skips_inactive(pool: MySqlPool) {
        let acme = fixtures::tenant(&pool, "acme").await;
        let other = fixtures::tenant(&pool, "other").await;
        let hq = location(&pool, acme, "HQ", true).await;
        let closed = location(&pool, acme, "Old depot", false).await;
        location(&pool, other, "Elsewhere", true).await;

        let ids: Vec<u64> = select_locations(&pool, acme, false)
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![hq]);

        let mut ids: Vec<u64> = select_locations(&pool, acme, true)
            .await
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![hq, closed]);
    }
}
