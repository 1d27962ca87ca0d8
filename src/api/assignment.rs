use crate::{
    api::{employee::fetch_user, location::fetch_location},
    auth::auth::AuthUser,
    db::is_unique_violation,
    error::{ApiError, ApiResult},
    model::assignment::{ASSIGNMENT_SELECT, AssignmentResponse, AssignmentRow},
    models::OkResponse,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    pub user_id: u64,
    pub location_id: u64,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignUser {
    pub user_id: u64,
}

async fn fetch_assignment(pool: &MySqlPool, tenant_id: u64, id: u64) -> ApiResult<AssignmentResponse> {
    sqlx::query_as::<_, AssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT} WHERE a.id = ? AND a.tenant_id = ?"
    ))
    .bind(id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?
    .map(AssignmentResponse::from)
    .ok_or_else(|| ApiError::not_found("Assignment not found"))
}

/// Both sides must belong to the caller's tenant.
async fn assign(pool: &MySqlPool, tenant_id: u64, user_id: u64, location_id: u64) -> ApiResult<AssignmentResponse> {
    fetch_user(pool, tenant_id, user_id).await?;
    fetch_location(pool, tenant_id, location_id).await?;

    let result = sqlx::query(
        "INSERT INTO user_location_assignments (tenant_id, user_id, location_id) VALUES (?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(user_id)
    .bind(location_id)
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Assignment already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(assignment_id = id, user_id, location_id, "Location assigned");
    fetch_assignment(pool, tenant_id, id).await
}

#[utoipa::path(
    get,
    path = "/api/admin/assignments",
    responses((status = 200, description = "All tenant assignments", body = [AssignmentResponse])),
    tag = "Assignments"
)]
pub async fn list_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT} WHERE a.tenant_id = ? ORDER BY u.name, l.name"
    ))
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<AssignmentResponse> = rows.into_iter().map(AssignmentResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/admin/assignments",
    request_body = CreateAssignment,
    responses(
        (status = 200, description = "Created assignment", body = AssignmentResponse),
        (status = 404, description = "User or location not found"),
        (status = 409, description = "Assignment already exists")
    ),
    tag = "Assignments"
)]
pub async fn create_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAssignment>,
) -> ApiResult<HttpResponse> {
    let assignment = assign(pool.get_ref(), auth.tenant_id, payload.user_id, payload.location_id).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/admin/assignments/{id}",
    params(("id" = u64, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Removed", body = OkResponse),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments"
)]
pub async fn delete_assignment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let assignment_id = path.into_inner();

    let result = sqlx::query("DELETE FROM user_location_assignments WHERE id = ? AND tenant_id = ?")
        .bind(assignment_id)
        .bind(auth.tenant_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Assignment not found"));
    }

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/admin/locations/{id}/assignments",
    params(("id" = u64, Path, description = "Location ID")),
    responses((status = 200, description = "Assignments of one location", body = [AssignmentResponse])),
    tag = "Assignments"
)]
pub async fn location_assignments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> ApiResult<HttpResponse> {
    let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
        "{ASSIGNMENT_SELECT} WHERE a.location_id = ? AND a.tenant_id = ? ORDER BY u.name"
    ))
    .bind(path.into_inner())
    .bind(auth.tenant_id)
    .fetch_all(pool.get_ref())
    .await?;

    let body: Vec<AssignmentResponse> = rows.into_iter().map(AssignmentResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/admin/locations/{id}/assignments",
    params(("id" = u64, Path, description = "Location ID")),
    request_body = AssignUser,
    responses(
        (status = 200, description = "Created assignment", body = AssignmentResponse),
        (status = 404, description = "User or location not found"),
        (status = 409, description = "Assignment already exists")
    ),
    tag = "Assignments"
)]
pub async fn assign_to_location(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignUser>,
) -> ApiResult<HttpResponse> {
    let assignment = assign(pool.get_ref(), auth.tenant_id, payload.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(assignment))
}
