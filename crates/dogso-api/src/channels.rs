use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::views::channel_view;

pub async fn list_channels(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = blocking(&state, |state| Ok(state.db.list_channels()?)).await?;
    Ok(Json(rows.into_iter().map(channel_view).collect::<Vec<_>>()))
}

pub async fn get_channel(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |state| Ok(state.db.get_channel_by_slug(&slug)?))
        .await?
        .ok_or(ApiError::NotFound("channel not found"))?;
    Ok(Json(channel_view(row)))
}
