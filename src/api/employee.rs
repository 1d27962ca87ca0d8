use crate::{
    auth::{
        auth::AuthUser, handlers::insert_user, password::hash_password_blocking,
        session::revoke_user_sessions,
    },
    config::Config,
    error::{ApiError, ApiResult},
    model::{
        assignment::{ASSIGNMENT_SELECT, AssignmentResponse, AssignmentRow},
        role::Role,
        user::{USER_COLUMNS, User, UserResponse},
    },
    utils::{
        db_utils::{SqlValue, UpdateBuilder, execute_update},
        session_cache,
    },
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Jane Doe")]
    #[validate(length(min = 1))]
    pub name: String,
    #[schema(example = "jane@acme.test")]
    #[validate(email)]
    pub email: String,
    pub role: Option<Role>,
    #[schema(example = "UTC")]
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
    /// Falls back to the server's default employee password.
    #[validate(length(min = 8))]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// What an edit means for sessions that are already signed in.
#[derive(Debug, PartialEq, Eq)]
enum SessionEffect {
    Unchanged,
    /// Cached profiles (role, name, timezone) are stale.
    Refresh,
    Revoke,
}

impl UpdateEmployee {
    fn to_update(&self) -> UpdateBuilder {
        UpdateBuilder::new("users")
            .set("name", self.name.as_ref().map(|v| SqlValue::String(v.trim().to_string())))
            .set("timezone", self.timezone.clone().map(SqlValue::String))
            .set("role", self.role.map(|r| SqlValue::String(r.as_ref().to_string())))
            .set("active", self.active.map(SqlValue::Bool))
    }

    fn session_effect(&self, update: &UpdateBuilder) -> SessionEffect {
        if self.active == Some(false) {
            SessionEffect::Revoke
        } else if update.is_empty() {
            SessionEffect::Unchanged
        } else {
            SessionEffect::Refresh
        }
    }
}

pub(crate) async fn fetch_user(pool: &MySqlPool, tenant_id: u64, id: u64) -> ApiResult<User> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND tenant_id = ?"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Employee not found"))
}

/// List the tenant's users
#[utoipa::path(
    get,
    path = "/api/admin/employees",
    responses(
        (status = 200, description = "All users of the caller's tenant", body = [UserResponse]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin only")
    ),
    tag = "Employees"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = ? ORDER BY name"
    ))
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Create an employee (or admin)
#[utoipa::path(
    post,
    path = "/api/admin/employees",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Created user", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    let password = payload
        .password
        .clone()
        .unwrap_or_else(|| config.default_employee_password.clone());
    let password_hash = hash_password_blocking(password).await?;

    let id = insert_user(
        pool.get_ref(),
        auth.tenant_id,
        payload.email.trim(),
        payload.name.trim(),
        payload.role.unwrap_or(Role::Employee),
        &password_hash,
        payload.timezone.as_deref().unwrap_or("UTC"),
    )
    .await?;

    info!(user_id = id, tenant_id = auth.tenant_id, "Employee created");

    let user = fetch_user(pool.get_ref(), auth.tenant_id, id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Update name, timezone, role or active flag
#[utoipa::path(
    patch,
    path = "/api/admin/employees/{id}",
    params(("id" = u64, Path, description = "User ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;
    let user_id = path.into_inner();

    if user_id == auth.user_id && payload.active == Some(false) {
        return Err(ApiError::bad_request("Cannot deactivate yourself"));
    }

    // 404 before touching anything outside the tenant.
    fetch_user(pool.get_ref(), auth.tenant_id, user_id).await?;

    let builder = payload.to_update();
    let effect = payload.session_effect(&builder);

    if let Some(update) = builder.build_for_tenant(user_id, auth.tenant_id) {
        execute_update(pool.get_ref(), update).await?;
    }

    match effect {
        SessionEffect::Revoke => {
            revoke_user_sessions(pool.get_ref(), user_id).await?;
        }
        SessionEffect::Refresh => session_cache::invalidate_all(),
        SessionEffect::Unchanged => {}
    }
    info!(user_id, ?effect, "Employee updated");

    let user = fetch_user(pool.get_ref(), auth.tenant_id, user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Deactivate a user and revoke their sessions
#[utoipa::path(
    patch,
    path = "/api/admin/employees/{id}/deactivate",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deactivated user", body = UserResponse),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employees"
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();

    if user_id == auth.user_id {
        return Err(ApiError::bad_request("Cannot deactivate yourself"));
    }

    let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = ? AND tenant_id = ?")
        .bind(user_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        // Either missing or already inactive; the fetch below tells them apart.
        fetch_user(pool.get_ref(), auth.tenant_id, user_id).await?;
    }

    let revoked = revoke_user_sessions(pool.get_ref(), user_id).await?;
    info!(user_id, revoked, "Employee deactivated");

    let user = fetch_user(pool.get_ref(), auth.tenant_id, user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Locations assigned to one employee
#[utoipa::path(
    get,
    path = "/api/admin/employees/{id}/locations",
    params(("id" = u64, Path, description = "User ID")),
    responses((status = 200, description = "Assignments with location", body = [AssignmentResponse])),
    tag = "Employees"
)]
pub async fn employee_locations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();

    let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT} WHERE a.user_id = ? AND a.tenant_id = ? ORDER BY l.name"
    ))
    .bind(user_id)
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<AssignmentResponse> = rows.into_iter().map(AssignmentResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
