use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    headers::{authorization::Bearer, Authorization},
    http::request::Parts,
    TypedHeader,
};

use crate::{
    db::UserId,
    error::AppError,
    utils::jwt::{JwtKeys, TokenKind},
};

/// The caller, identified by a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// The caller, identified by a valid refresh token.
#[derive(Debug, Clone, Copy)]
pub struct RefreshUser(pub UserId);

async fn bearer_user<S>(parts: &mut Parts, state: &S, kind: TokenKind) -> Result<UserId, AppError>
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;

    JwtKeys::from_ref(state).verify_token(bearer.token(), kind)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        bearer_user(parts, state, TokenKind::Access).await.map(Self)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RefreshUser
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        bearer_user(parts, state, TokenKind::Refresh).await.map(Self)
    }
}
