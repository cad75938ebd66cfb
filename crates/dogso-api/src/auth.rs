use std::path::PathBuf;
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use dogso_db::Database;
use dogso_db::models::UserInsert;
use dogso_types::api::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};

use crate::blocking;
use crate::credentials::{hash_password, issue_token, verify_password};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::thumbnail::ThumbnailSource;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub thumbnails: Arc<dyn ThumbnailSource>,
    pub settings: Settings,
}

/// Runtime knobs that handlers consult.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Slug of the channel a thread lands in when the request names none.
    pub default_channel: String,
    /// Where uploaded media blobs are written.
    pub upload_dir: PathBuf,
    /// Take the anonymous caller's origin from `X-Forwarded-For`.
    pub trust_proxy: bool,
}

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_LEN: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("username, email and password are required"));
    }
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ApiError::validation("username must be 3-32 characters"));
    }
    if !email.contains('@') {
        return Err(ApiError::validation("email address is not valid"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    let password = req.password;
    let user = blocking(&state, move |state| {
        let password_hash = hash_password(&password)?;
        match state.db.create_user(&username, &email, &password_hash)? {
            UserInsert::Created(user) => Ok(user),
            UserInsert::Taken => Err(ApiError::Conflict(
                "username or email address is already in use".into(),
            )),
        }
    })
    .await?;

    let token = issue_token(&state.jwt_secret, user.id, &user.username)?;
    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary {
                id: user.id,
                username: user.username,
                email: user.email,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_string();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("email and password are required"));
    }

    let password = req.password;
    let user = blocking(&state, move |state| {
        let user = state.db.get_user_by_email(&email)?.ok_or(ApiError::BadLogin)?;
        if !verify_password(&password, &user.password) {
            return Err(ApiError::BadLogin);
        }
        Ok(user)
    })
    .await?;

    let token = issue_token(&state.jwt_secret, user.id, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user: UserSummary {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}
