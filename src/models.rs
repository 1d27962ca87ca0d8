use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@geoattend.local")]
    #[validate(email)]
    pub email: String,
    #[schema(example = "Admin123!")]
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordReq {
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ResetPasswordReq {
    #[validate(length(min = 10))]
    pub token: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReq {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub tenant_name: Option<String>,
    #[validate(length(min = 1))]
    pub tenant_slug: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateAdminReq {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_token: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedAdmin {
    pub id: u64,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedAdminResponse {
    pub ok: bool,
    pub admin: CreatedAdmin,
}

#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_email_and_six_chars() {
        let bad = LoginReqDto {
            email: "not-an-email".into(),
            password: "secret1".into(),
        };
        assert!(bad.validate().is_err());

        let short = LoginReqDto {
            email: "a@b.co".into(),
            password: "12345".into(),
        };
        assert!(short.validate().is_err());

        let good = LoginReqDto {
            email: "a@b.co".into(),
            password: "123456".into(),
        };
        assert!(good.validate().is_ok());
    }

    #[test]
    fn bootstrap_optional_fields_validate_when_present() {
        let req: BootstrapReq = serde_json::from_value(serde_json::json!({
            "email": "owner@acme.test",
            "name": "Owner",
            "password": "long-enough",
            "tenantName": ""
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
