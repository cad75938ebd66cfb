use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

use dogso_db::models::{ReactionInsert, ReactionToggle};
use dogso_types::api::{MessageResponse, ReactionAddedResponse, ReactionRequest, ToggleReactionResponse};
use dogso_types::models::{Actor, ReactionKey, ReactionKind, ReactionTarget};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};

/// Turn the request body and caller into a ledger key. Rejects unknown
/// reaction types and anonymous comment reactions.
fn reaction_key(actor: Actor, req: &ReactionRequest) -> Result<ReactionKey, ApiError> {
    let target = match (req.comment_id, req.thread_id) {
        (Some(comment_id), _) => ReactionTarget::Comment(comment_id),
        (None, Some(thread_id)) => ReactionTarget::Thread(thread_id),
        (None, None) => return Err(ApiError::validation("thread_id or comment_id is required")),
    };

    let kind = req.kind.ok_or_else(|| ApiError::validation("type is required"))?;
    if !kind.is_known() {
        let allowed: Vec<&str> = ReactionKind::ALL.iter().map(ReactionKind::as_str).collect();
        return Err(ApiError::validation(format!(
            "unknown reaction type, expected one of: {}",
            allowed.join(", ")
        )));
    }

    ReactionKey::new(actor, target, kind).ok_or(ApiError::MissingCredential)
}

pub async fn add_reaction(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(req): ApiJson<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = reaction_key(actor, &req)?;

    let id = blocking(&state, move |state| match state.db.add_reaction(&key)? {
        ReactionInsert::Added(id) => Ok(id),
        ReactionInsert::AlreadyExists => Err(ApiError::Conflict("already reacted".into())),
        ReactionInsert::TargetMissing => Err(ApiError::NotFound("reaction target not found")),
    })
    .await?;

    debug!("Recorded reaction {}", id);

    Ok((
        StatusCode::CREATED,
        Json(ReactionAddedResponse {
            message: "reaction added".into(),
            id,
        }),
    ))
}

/// Idempotent: succeeds whether or not the reaction existed.
pub async fn remove_reaction(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(req): ApiJson<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = reaction_key(actor, &req)?;

    let removed = blocking(&state, move |state| Ok(state.db.remove_reaction(&key)?)).await?;
    if !removed {
        debug!("Reaction removal matched no row");
    }

    Ok(Json(MessageResponse {
        message: "reaction removed".into(),
    }))
}

/// Add-or-remove in a single transaction.
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(req): ApiJson<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = reaction_key(actor, &req)?;

    let added = blocking(&state, move |state| match state.db.toggle_reaction(&key)? {
        ReactionToggle::Added(_) => Ok(true),
        ReactionToggle::Removed => Ok(false),
        ReactionToggle::TargetMissing => Err(ApiError::NotFound("reaction target not found")),
    })
    .await?;

    Ok(Json(ToggleReactionResponse { added }))
}
