use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::config::JwtConfig;

/// One year.
const MAX_EXPIRY_HOURS: i64 = 24 * 365;

/// Issues and verifies teacher session tokens (HS256, shared secret).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

/// Claims carried by a teacher session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeacherClaims {
    /// Teacher id
    pub id: String,
    pub fullname: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, AppError> {
        if config.secret.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secret must not be empty"
            )));
        }
        if !(1..=MAX_EXPIRY_HOURS).contains(&config.expiry_hours) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT expiry must be between 1 and {} hours, got {}",
                MAX_EXPIRY_HOURS,
                config.expiry_hours
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_hours: config.expiry_hours,
        })
    }

    pub fn issue(&self, teacher_id: &str, fullname: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.expiry_hours);

        let claims = TeacherClaims {
            id: teacher_id.to_string(),
            fullname: fullname.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to encode token: {}", e))
        })
    }

    /// Validate signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<TeacherClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.required_spec_claims = ["exp".to_string()].into_iter().collect();

        let token_data = decode::<TeacherClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

}
