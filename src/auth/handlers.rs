use crate::{
    auth::{
        auth::{AuthUser, Profile},
        password::{hash_password_blocking, verify_password_blocking},
        session::{
            SESSION_COOKIE, create_session, hash_token, random_token, revoke_session,
            revoke_user_sessions,
        },
    },
    config::Config,
    db::is_unique_violation,
    error::{ApiError, ApiResult},
    model::{
        role::Role,
        tenant::{DEFAULT_TENANT_NAME, DEFAULT_TENANT_SLUG},
        user::{USER_COLUMNS, User},
    },
    models::{
        BootstrapReq, CreateAdminReq, CreatedAdmin, CreatedAdminResponse, ForgotPasswordReq,
        ForgotPasswordResponse, LoginReqDto, OkResponse, ResetPasswordReq,
    },
};
use actix_web::{
    HttpRequest, HttpResponse,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    web,
};
use chrono::{Duration, Utc};
use sqlx::{MySql, MySqlPool};
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

/// Inserts a user row. Duplicate emails surface as 409.
pub async fn insert_user<'c, E>(
    executor: E,
    tenant_id: u64,
    email: &str,
    name: &str,
    role: Role,
    password_hash: &str,
    timezone: &str,
) -> ApiResult<u64>
where
    E: sqlx::Executor<'c, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO users (tenant_id, email, name, role, password_hash, timezone)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(tenant_id)
    .bind(email)
    .bind(name)
    .bind(role.as_ref())
    .bind(password_hash)
    .bind(timezone)
    .execute(executor)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_id()),
        Err(e) if is_unique_violation(&e) => Err(ApiError::conflict("Email already in use")),
        Err(e) => Err(e.into()),
    }
}

fn session_cookie(token: String, ttl_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::days(ttl_days))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

/// Log in and receive the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in; ga_session cookie set", body = Profile),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(req, pool, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    req: HttpRequest,
    body: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    info!("Login request received");
    body.validate()?;

    debug!("Fetching user from database");

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND active = TRUE"
    ))
    .bind(&body.email)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(user) = user else {
        info!("Invalid credentials: user not found");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password_blocking(body.password.clone(), user.password_hash.clone()).await? {
        info!(user_id = user.id, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let ip = req.connection_info().realip_remote_addr().map(str::to_string);
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|ua| ua.chars().take(255).collect::<String>());

    let session =
        create_session(pool.get_ref(), user.id, config.session_ttl_days, ip, user_agent).await?;

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
        // intentionally not failing login
    }

    info!(user_id = user.id, "Login successful");

    let profile = Profile {
        id: user.id,
        role: Role::from_db(&user.role),
        name: user.name,
        email: user.email,
        timezone: user.timezone,
    };

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            session.token,
            config.session_ttl_days,
            config.cookie_secure,
        ))
        .json(profile))
}

/// Revoke the current session. Always succeeds.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session revoked, cookie cleared", body = OkResponse)),
    tag = "Auth"
)]
pub async fn logout(req: HttpRequest, pool: web::Data<MySqlPool>) -> ApiResult<HttpResponse> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            revoke_session(pool.get_ref(), cookie.value()).await?;
        }
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(OkResponse::ok()))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated user", body = Profile),
        (status = 401, description = "Unauthenticated")
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth.profile())
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordReq,
    responses(
        (status = 200, description = "Always ok, whether or not the email exists", body = ForgotPasswordResponse),
        (status = 400, description = "Invalid payload")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_forgot_password", skip_all)]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let user_id = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE email = ?")
        .bind(&body.email)
        .fetch_optional(pool.get_ref())
        .await?;

    let Some(user_id) = user_id else {
        return Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
            ok: true,
            dev_token: None,
        }));
    };

    let token = random_token();
    let expires_at = Utc::now() + Duration::minutes(config.reset_token_ttl_min);

    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .execute(pool.get_ref())
    .await?;

    info!(user_id, "Password reset token issued");

    Ok(HttpResponse::Ok().json(ForgotPasswordResponse {
        ok: true,
        dev_token: config.expose_reset_token.then_some(token),
    }))
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    id: u64,
    user_id: u64,
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordReq,
    responses(
        (status = 200, description = "Password changed, all sessions revoked", body = OkResponse),
        (status = 400, description = "Invalid payload or invalid/expired token")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_reset_password", skip_all)]
pub async fn reset_password(
    body: web::Json<ResetPasswordReq>,
    pool: web::Data<MySqlPool>,
) -> ApiResult<HttpResponse> {
    body.validate()?;

    let reset = sqlx::query_as::<_, ResetTokenRow>(
        r#"
        SELECT id, user_id
        FROM password_reset_tokens
        WHERE token_hash = ? AND used_at IS NULL AND expires_at > ?
        "#,
    )
    .bind(hash_token(&body.token))
    .bind(Utc::now())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::bad_request("Invalid or expired token"))?;

    let password_hash = hash_password_blocking(body.password.clone()).await?;

    let mut tx = pool.begin().await?;

    // Claim the token first so a concurrent reset with the same token loses.
    let claimed = sqlx::query(
        "UPDATE password_reset_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL",
    )
    .bind(Utc::now())
    .bind(reset.id)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        return Err(ApiError::bad_request("Invalid or expired token"));
    }

    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(reset.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let revoked = revoke_user_sessions(pool.get_ref(), reset.user_id).await?;
    info!(user_id = reset.user_id, revoked, "Password reset completed");

    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

/// One-time setup of the first tenant and admin
#[utoipa::path(
    post,
    path = "/api/auth/bootstrap",
    request_body = BootstrapReq,
    params(("X-Bootstrap-Token" = String, Header, description = "Must equal BOOTSTRAP_TOKEN")),
    responses(
        (status = 200, description = "Tenant and admin created", body = CreatedAdminResponse),
        (status = 400, description = "Invalid payload or bootstrap already completed"),
        (status = 403, description = "Missing or wrong bootstrap token")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_bootstrap", skip_all)]
pub async fn bootstrap(
    req: HttpRequest,
    body: web::Json<BootstrapReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    let supplied = req
        .headers()
        .get("X-Bootstrap-Token")
        .and_then(|h| h.to_str().ok());

    match (config.bootstrap_token.as_deref(), supplied) {
        (Some(expected), Some(given)) if expected == given => {}
        _ => {
            warn!("Bootstrap attempted without a valid token");
            return Err(ApiError::Forbidden("Forbidden".into()));
        }
    }

    body.validate()?;

    let user_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool.get_ref())
        .await?;
    if user_count > 0 {
        return Err(ApiError::bad_request("Bootstrap already completed"));
    }

    let password_hash = hash_password_blocking(body.password.clone()).await?;

    let mut tx = pool.begin().await?;

    let tenant_id = sqlx::query("INSERT INTO tenants (name, slug) VALUES (?, ?)")
        .bind(body.tenant_name.as_deref().unwrap_or(DEFAULT_TENANT_NAME))
        .bind(body.tenant_slug.as_deref().unwrap_or(DEFAULT_TENANT_SLUG))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::conflict("Tenant slug already in use")
            } else {
                e.into()
            }
        })?
        .last_insert_id();

    let admin_id = insert_user(
        &mut *tx,
        tenant_id,
        &body.email,
        &body.name,
        Role::Admin,
        &password_hash,
        "UTC",
    )
    .await?;

    tx.commit().await?;

    info!(tenant_id, admin_id, "Bootstrap completed");

    Ok(HttpResponse::Ok().json(CreatedAdminResponse {
        ok: true,
        admin: CreatedAdmin {
            id: admin_id,
            email: body.email.clone(),
        },
    }))
}

/// Temporary open admin creation, gated by ENABLE_ADMIN_CREATE
#[utoipa::path(
    post,
    path = "/api/auth/create-admin-open",
    request_body = CreateAdminReq,
    responses(
        (status = 200, description = "Admin created", body = CreatedAdminResponse),
        (status = 403, description = "Disabled on this server"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_create_admin_open", skip_all)]
pub async fn create_admin_open(
    body: web::Json<CreateAdminReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> ApiResult<HttpResponse> {
    if !config.enable_admin_create {
        return Err(ApiError::Forbidden("Forbidden".into()));
    }

    body.validate()?;

    let password_hash = hash_password_blocking(body.password.clone()).await?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, u64>("SELECT id FROM tenants ORDER BY id LIMIT 1")
        .fetch_optional(&mut *tx)
        .await?;

    let tenant_id = match existing {
        Some(id) => id,
        None => sqlx::query("INSERT INTO tenants (name, slug) VALUES (?, ?)")
            .bind(DEFAULT_TENANT_NAME)
            .bind(DEFAULT_TENANT_SLUG)
            .execute(&mut *tx)
            .await?
            .last_insert_id(),
    };

    let admin_id = insert_user(
        &mut *tx,
        tenant_id,
        &body.email,
        &body.name,
        Role::Admin,
        &password_hash,
        "UTC",
    )
    .await?;

    tx.commit().await?;

    warn!(tenant_id, admin_id, "Admin created through the open endpoint");

    Ok(HttpResponse::Ok().json(CreatedAdminResponse {
        ok: true,
        admin: CreatedAdmin {
            id: admin_id,
            email: body.email.clone(),
        },
    }))
}
