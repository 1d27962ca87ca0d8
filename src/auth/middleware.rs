use crate::auth::auth::AuthUser;
use crate::auth::session::{SESSION_COOKIE, resolve_session};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;

/// Resolves the session cookie to a user and stores it in request
/// extensions. Requests without a valid session stop here with 401.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let token = match req.cookie(SESSION_COOKIE) {
        Some(c) if !c.value().is_empty() => c.value().to_string(),
        _ => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Unauthenticated"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let pool = req
        .app_data::<Data<MySqlPool>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Database pool missing"))?
        .clone();

    let user = match resolve_session(pool.get_ref(), &token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Invalid session"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
        Err(e) => {
            error!(error = %e, "Session lookup failed");
            let resp = HttpResponse::InternalServerError()
                .json(json!({"error": "Internal server error"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    req.extensions_mut().insert(user);

    next.call(req).await
}

/// Admin gate. Must run after `auth_middleware`.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let verdict = req.extensions().get::<AuthUser>().map(AuthUser::is_admin);

    match verdict {
        Some(true) => next.call(req).await,
        Some(false) => {
            let resp = HttpResponse::Forbidden().json(json!({"error": "Forbidden"}));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
        None => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Unauthenticated"}));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
