use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    db::UserId,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    pub user_id: UserId,
    pub kind: TokenKind,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn generate(&self, user_id: UserId, kind: TokenKind) -> AppResult<String> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            exp: (Utc::now() + ttl).timestamp(),
            user_id,
            kind,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> AppResult<Claims> {
        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?
        .claims;
        Ok(claims)
    }

    /// Verifies the token and that it was issued for `kind`.
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> AppResult<UserId> {
        let claims = self.verify_jwt(token)?;
        if claims.kind != kind {
            return Err(AppError::Unauthorized);
        }
        Ok(claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret", Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn round_trips_access_tokens() {
        let keys = keys();
        let token = keys.generate(42, TokenKind::Access).unwrap();

        assert_eq!(keys.verify_token(&token, TokenKind::Access).unwrap(), 42);
    }

    #[test]
    fn refresh_tokens_are_not_access_tokens() {
        let keys = keys();
        let token = keys.generate(7, TokenKind::Refresh).unwrap();

        assert!(matches!(
            keys.verify_token(&token, TokenKind::Access),
            Err(AppError::Unauthorized)
        ));
        assert_eq!(keys.verify_token(&token, TokenKind::Refresh).unwrap(), 7);
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let other = JwtKeys::new("other-secret", Duration::minutes(5), Duration::days(1));
        let token = other.generate(1, TokenKind::Access).unwrap();

        assert!(matches!(
            keys().verify_token(&token, TokenKind::Access),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn rejects_expired_tokens() {
        let keys = JwtKeys::new("test-secret", Duration::minutes(-10), Duration::days(1));
        let token = keys.generate(1, TokenKind::Access).unwrap();

        assert!(keys.verify_token(&token, TokenKind::Access).is_err());
    }
}
