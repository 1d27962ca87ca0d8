use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `Ok(false)` on mismatch; `Err` only for an unparsable stored hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hashed)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Argon2 is CPU bound; run it off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, ApiError> {
    actix_web::web::block(move || hash_password(&password))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ApiError::Internal
        })
}

pub async fn verify_password_blocking(password: String, hashed: String) -> Result<bool, ApiError> {
    actix_web::web::block(move || verify_password(&password, &hashed))
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Stored password hash is invalid");
            ApiError::Internal
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("Employee123!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Employee123!", &hash).unwrap());
        assert!(!verify_password("employee123!", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[actix_web::test]
    async fn blocking_wrappers_agree() {
        let hash = hash_password_blocking("Admin123!".into()).await.unwrap();
        assert!(verify_password_blocking("Admin123!".into(), hash).await.unwrap());
    }
}
