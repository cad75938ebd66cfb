//! Request extractors: JSON/path/query wrappers that reject with `ApiError`,
//! and the caller-identity extractors.

use std::net::SocketAddr;

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRequest, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use dogso_types::api::Claims;
use dogso_types::models::Actor;

use crate::auth::AppState;
use crate::credentials::verify_token;
use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Bearer token present but unusable is 403; absent is 401.
async fn bearer_claims(parts: &mut Parts, state: &AppState) -> Result<Option<Claims>, ApiError> {
    let header = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if rejection.is_missing() => return Ok(None),
        Err(_) => return Err(ApiError::InvalidCredential),
    };

    let claims =
        verify_token(&state.jwt_secret, header.token()).map_err(|_| ApiError::InvalidCredential)?;
    Ok(Some(claims))
}

/// Verified identity for routes that require login.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_claims(parts, state)
            .await?
            .map(AuthUser)
            .ok_or(ApiError::MissingCredential)
    }
}

/// Whoever is calling: the token's user when a bearer token is sent,
/// otherwise an anonymous actor keyed by network origin.
#[derive(Debug, Clone)]
pub struct Caller(pub Actor);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = bearer_claims(parts, state).await? {
            return Ok(Caller(Actor::Authenticated { user_id: claims.sub }));
        }

        let origin = network_origin(parts, state.settings.trust_proxy).ok_or(ApiError::MissingCredential)?;
        Ok(Caller(Actor::Anonymous { origin }))
    }
}

fn network_origin(parts: &Parts, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(first_hop) = forwarded {
            return Some(first_hop.to_string());
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
