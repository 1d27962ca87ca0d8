use crate::{
    api::{assignment, attendance, clock, employee, health, location, settings, shift},
    auth::{
        handlers,
        middleware::{auth_middleware, require_admin},
    },
    config::Config,
    error::ApiError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;
use tracing::debug;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst size");
    Governor::new(&cfg)
}

/// Malformed bodies and query strings answer with the usual error shape.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected JSON body");
        ApiError::invalid_payload().into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected query string");
        ApiError::bad_request("Invalid query").into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .app_data(json_config())
            .app_data(query_config())
            .route("/health", web::get().to(health::health))
            // Public auth endpoints
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/forgot-password")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::forgot_password)),
                    )
                    .service(
                        web::resource("/reset-password")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::reset_password)),
                    )
                    .service(
                        web::resource("/bootstrap")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::bootstrap)),
                    )
                    .service(
                        web::resource("/create-admin-open")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::create_admin_open)),
                    )
                    .route("/logout", web::post().to(handlers::logout))
                    .service(
                        web::resource("/me")
                            .wrap(from_fn(auth_middleware))
                            .route(web::get().to(handlers::me)),
                    ),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::me)),
            )
            // Admin: auth first, then role check
            .service(
                web::scope("/admin")
                    .wrap(from_fn(require_admin))
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    // /admin/employees
                    .service(
                        web::resource("/employees")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/employees/{id}")
                            .route(web::patch().to(employee::update_employee)),
                    )
                    .service(
                        web::resource("/employees/{id}/deactivate")
                            .route(web::patch().to(employee::deactivate_employee)),
                    )
                    .service(
                        web::resource("/employees/{id}/locations")
                            .route(web::get().to(employee::employee_locations)),
                    )
                    // /admin/locations
                    .service(
                        web::resource("/locations")
                            .route(web::get().to(location::list_locations))
                            .route(web::post().to(location::create_location)),
                    )
                    .service(
                        web::resource("/locations/{id}")
                            .route(web::get().to(location::get_location))
                            .route(web::patch().to(location::update_location))
                            .route(web::delete().to(location::delete_location)),
                    )
                    .service(
                        web::resource("/locations/{id}/assignments")
                            .route(web::get().to(assignment::location_assignments))
                            .route(web::post().to(assignment::assign_to_location)),
                    )
                    // /admin/assignments
                    .service(
                        web::resource("/assignments")
                            .route(web::get().to(assignment::list_assignments))
                            .route(web::post().to(assignment::create_assignment)),
                    )
                    .service(
                        web::resource("/assignments/{id}")
                            .route(web::delete().to(assignment::delete_assignment)),
                    )
                    // /admin/shifts
                    .service(web::resource("/shifts").route(web::get().to(shift::list_shifts)))
                    .service(
                        web::resource("/shifts/bulk").route(web::post().to(shift::bulk_create_shifts)),
                    )
                    .service(web::resource("/shifts/{id}").route(web::delete().to(shift::delete_shift)))
                    // reports
                    .service(
                        web::resource("/attendance").route(web::get().to(attendance::list_attendance)),
                    )
                    .service(
                        web::resource("/attendance/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    .service(web::resource("/analytics").route(web::get().to(attendance::analytics)))
                    .service(web::resource("/live").route(web::get().to(attendance::live)))
                    .service(web::resource("/export").route(web::get().to(attendance::export_csv)))
                    .service(
                        web::resource("/recalculate/{id}").route(web::post().to(attendance::recalculate)),
                    )
                    .service(web::resource("/alerts").route(web::get().to(attendance::alerts)))
                    // /admin/settings
                    .service(
                        web::resource("/settings")
                            .route(web::get().to(settings::get_settings))
                            .route(web::patch().to(settings::update_settings)),
                    )
                    .service(
                        web::resource("/settings/logo").route(web::post().to(settings::upload_logo)),
                    ),
            )
            // Employee self-service
            .service(
                web::scope("/employee")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter)
                    .route("/attendance", web::get().to(clock::my_attendance))
                    .route("/status", web::get().to(clock::status))
                    .route("/locations", web::get().to(clock::my_locations))
                    .route("/clock-in", web::post().to(clock::clock_in))
                    .route("/clock-out", web::post().to(clock::clock_out))
                    .route("/break-start", web::post().to(clock::break_start))
                    .route("/break-end", web::post().to(clock::break_end)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};
    use sqlx::MySqlPool;
    use std::net::SocketAddr;

    // The pool never connects: every request below is answered before a
    // query would run.
    macro_rules! spawn_app {
        () => {{
            let config = Config::for_tests();
            let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
            test::init_service(
                App::new()
                    .app_data(web::Data::new(pool))
                    .app_data(web::Data::new(config.clone()))
                    .configure(|cfg| configure(cfg, config.clone())),
            )
            .await
        }};
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[actix_web::test]
    async fn health_is_public() {
        let app = spawn_app!();
        let req = test::TestRequest::get().uri("/api/health").peer_addr(peer()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ok"], true);
        assert!(body["time"].is_string());
    }

    #[actix_web::test]
    async fn admin_routes_need_a_session() {
        let app = spawn_app!();
        let req = test::TestRequest::get()
            .uri("/api/admin/employees")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Unauthenticated" }));
    }

    #[actix_web::test]
    async fn employee_routes_need_a_session() {
        let app = spawn_app!();
        for uri in ["/api/employee/status", "/api/me", "/api/auth/me"] {
            let req = test::TestRequest::get().uri(uri).peer_addr(peer()).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let req = test::TestRequest::post()
            .uri("/api/employee/clock-in")
            .peer_addr(peer())
            .set_json(json!({ "latitude": 1.0, "longitude": 2.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_rejects_invalid_payloads() {
        let app = spawn_app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .peer_addr(peer())
            .set_json(json!({ "email": "not-an-email", "password": "secret123" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid payload");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .peer_addr(peer())
            .insert_header(("content-type", "application/json"))
            .set_payload("{ nope")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid payload");
    }

    #[actix_web::test]
    async fn bootstrap_requires_the_token() {
        let app = spawn_app!();
        let req = test::TestRequest::post()
            .uri("/api/auth/bootstrap")
            .peer_addr(peer())
            .insert_header(("X-Bootstrap-Token", "guess"))
            .set_json(json!({
                "email": "admin@geoattend.local",
                "name": "Admin",
                "password": "Admin123!"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn open_admin_creation_is_off_by_default() {
        let app = spawn_app!();
        let req = test::TestRequest::post()
            .uri("/api/auth/create-admin-open")
            .peer_addr(peer())
            .set_json(json!({
                "email": "admin@geoattend.local",
                "name": "Admin",
                "password": "Admin123!"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn logout_without_cookie_clears_it_anyway() {
        let app = spawn_app!();
        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cleared = resp
            .response()
            .cookies()
            .find(|c| c.name() == "ga_session")
            .expect("removal cookie");
        assert_eq!(cleared.value(), "");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "ok": true }));
    }

    #[actix_web::test]
    async fn login_is_rate_limited_per_peer() {
        let mut config = Config::for_tests();
        config.rate_login_per_min = 1;
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config.clone()))
                .configure(|cfg| configure(cfg, config.clone())),
        )
        .await;

        let login = || {
            test::TestRequest::post()
                .uri("/api/auth/login")
                .peer_addr(peer())
                .set_json(json!({ "email": "bad", "password": "secret123" }))
                .to_request()
        };

        let first = test::call_service(&app, login()).await;
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);
        // The limiter answers with an error rather than a response.
        let status = match test::try_call_service(&app, login()).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}
