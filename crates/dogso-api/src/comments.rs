use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use dogso_db::models::CommentInsert;
use dogso_types::api::{CommentCreatedResponse, CreateCommentRequest, ReactionCounts};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, AuthUser};
use crate::views::comment_view;

/// POST /comments. A `parent_id` naming a reply is attached to that reply's
/// top-level parent instead, so the tree stays two levels deep.
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req
        .content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("content is required"))?;
    let thread_id = req
        .thread_id
        .ok_or_else(|| ApiError::validation("thread_id is required"))?;
    let parent_id = req.parent_id;
    let user_id = claims.sub;

    let comment = blocking(&state, move |state| {
        match state.db.insert_comment(thread_id, user_id, &content, parent_id)? {
            CommentInsert::Created(row) => Ok(row),
            CommentInsert::ThreadMissing => Err(ApiError::NotFound("thread not found")),
            CommentInsert::ParentMissing => Err(ApiError::validation(
                "parent_id does not name a comment on this thread",
            )),
        }
    })
    .await?;

    info!(
        "User {} commented {} on thread {} (parent {:?})",
        user_id, comment.id, thread_id, comment.parent_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CommentCreatedResponse {
            message: "comment posted".into(),
            comment: comment_view(comment, 0, ReactionCounts::new()),
        }),
    ))
}
