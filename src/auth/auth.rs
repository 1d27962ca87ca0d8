use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

/// The authenticated caller, placed in request extensions by
/// `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: u64,
    pub tenant_id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub timezone: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized("Unauthenticated".into())),
        )
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            timezone: self.timezone.clone(),
        }
    }
}

/// Body of `/me` and the login response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "name": "Admin User",
    "email": "admin@geoattend.local",
    "role": "ADMIN",
    "timezone": "America/Los_Angeles"
}))]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub timezone: String,
}
