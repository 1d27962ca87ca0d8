use crate::{
    api::upload::{read_form, save_image},
    auth::auth::AuthUser,
    config::Config,
    error::{ApiError, ApiResult},
    model::tenant::Tenant,
    utils::db_utils::{SqlValue, UpdateBuilder, execute_update},
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    pub id: u64,
    pub name: String,
    pub address: Option<String>,
    /// Public path of the logo under `/uploads`
    pub logo_path: Option<String>,
}

impl From<Tenant> for TenantSettings {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            name: t.name,
            address: t.address,
            logo_path: t.logo_path,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettings {
    #[validate(length(min = 1, max = 191))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

async fn fetch_tenant(pool: &MySqlPool, tenant_id: u64) -> ApiResult<Tenant> {
    sqlx::query_as::<_, Tenant>(
        "SELECT id, name, slug, address, logo_path, created_at FROM tenants WHERE id = ?",
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Tenant not found"))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses((status = 200, description = "Tenant settings", body = TenantSettings)),
    tag = "Settings"
)]
pub async fn get_settings(auth: AuthUser, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    let tenant = fetch_tenant(pool.get_ref(), auth.tenant_id).await?;
    Ok(HttpResponse::Ok().json(TenantSettings::from(tenant)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/settings",
    request_body = UpdateSettings,
    responses(
        (status = 200, description = "Updated settings", body = TenantSettings),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateSettings>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    let update = UpdateBuilder::new("tenants")
        .set("name", payload.name.as_ref().map(|v| SqlValue::String(v.trim().to_string())))
        .set("address", payload.address.as_ref().map(|v| SqlValue::String(v.trim().to_string())))
        .build_for_id(auth.tenant_id);

    if let Some(update) = update {
        execute_update(pool.get_ref(), update).await?;
    }

    let tenant = fetch_tenant(pool.get_ref(), auth.tenant_id).await?;
    Ok(HttpResponse::Ok().json(TenantSettings::from(tenant)))
}

/// Upload the tenant logo (multipart field `logo`)
#[utoipa::path(
    post,
    path = "/api/admin/settings/logo",
    request_body(content = String, content_type = "multipart/form-data", description = "Image in field `logo`"),
    responses(
        (status = 200, description = "Updated settings", body = TenantSettings),
        (status = 400, description = "Missing, oversized or non-image file")
    ),
    tag = "Settings"
)]
pub async fn upload_logo(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let form = read_form(payload, "logo", config.max_upload_bytes).await?;
    let bytes = form.file.ok_or_else(|| ApiError::bad_request("Logo file is required"))?;

    let filename = save_image(&config.uploads_dir, bytes).await?;
    let logo_path = format!("/uploads/{filename}");

    sqlx::query("UPDATE tenants SET logo_path = ? WHERE id = ?")
        .bind(&logo_path)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    info!(tenant_id = auth.tenant_id, %logo_path, "Logo updated");

    let tenant = fetch_tenant(pool.get_ref(), auth.tenant_id).await?;
    Ok(HttpResponse::Ok().json(TenantSettings::from(tenant)))
}
