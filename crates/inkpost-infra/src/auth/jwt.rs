//! HS256 bearer tokens.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkpost_core::ports::{AuthError, TokenClaims, TokenService};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            expiration_hours: 24,
            issuer: "inkpost".to_string(),
        }
    }
}

/// Registered claims plus the bearer's username and roles.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    username: String,
    #[serde(default)]
    roles: Vec<String>,
    iat: i64,
    exp: i64,
    iss: String,
}

impl From<Claims> for TokenClaims {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            roles: claims.roles,
            exp: claims.exp,
        }
    }
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            config,
        }
    }
}

fn rejection(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            roles,
            iat: issued_at.timestamp(),
            exp: (issued_at + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(rejection)
    }

    fn expiration_seconds(&self) -> i64 {
        TimeDelta::hours(self.config.expiration_hours).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(issuer: &str, expiration_hours: i64) -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "inkpost-test-secret".to_string(),
            expiration_hours,
            issuer: issuer.to_string(),
        })
    }

    #[test]
    fn test_staff_roles_survive_round_trip() {
        let tokens = service("inkpost", 1);
        let moderator = Uuid::new_v4();

        let token = tokens
            .generate_token(
                moderator,
                "moderator",
                vec!["user".to_string(), "staff".to_string()],
            )
            .unwrap();
        let claims = tokens.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, moderator);
        assert_eq!(claims.username, "moderator");
        assert!(claims.is_staff());
    }

    #[test]
    fn test_garbage_is_invalid() {
        let result = service("inkpost", 1).validate_token("not.a.token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let tokens = service("inkpost", 1);
        let token = tokens
            .generate_token(Uuid::new_v4(), "alice", vec!["user".to_string()])
            .unwrap();

        let forged = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            expiration_hours: 1,
            issuer: "inkpost".to_string(),
        })
        .generate_token(Uuid::new_v4(), "alice", vec!["staff".to_string()])
        .unwrap();

        assert!(tokens.validate_token(&token).is_ok());
        assert!(matches!(
            tokens.validate_token(&forged),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_is_invalid() {
        let token = service("someone-else", 1)
            .generate_token(Uuid::new_v4(), "bob", vec![])
            .unwrap();

        assert!(service("inkpost", 1).validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("inkpost", -2);
        let token = tokens.generate_token(Uuid::new_v4(), "carol", vec![]).unwrap();

        assert!(matches!(
            tokens.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_expiration_seconds() {
        assert_eq!(service("inkpost", 24).expiration_seconds(), 86_400);
    }
}
