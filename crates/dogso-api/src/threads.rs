use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use reqwest::Url;
use tracing::info;

use dogso_db::models::{NewThread, ThreadChanges};
use dogso_types::api::{
    CreateThreadRequest, EditThreadRequest, ListThreadsQuery, ThreadDetail, ThreadResponse, ThreadSummary,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthUser};
use crate::views::{comment_aggregate_view, reaction_counts, thread_view};

/// Longest subtitle accepted, in characters.
pub const MAX_SUBTITLE_CHARS: usize = 300;

/// Trimmed value, or `None` when blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The user-editable part of a thread, after trimming.
#[derive(Debug, Clone, PartialEq)]
struct ThreadFields {
    title: String,
    subtitle: Option<String>,
    url: Option<String>,
    media_url: Option<String>,
    media_type: Option<String>,
    tags: Option<String>,
}

impl ThreadFields {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.is_empty() {
            return Err(ApiError::validation("title is required"));
        }
        if let Some(subtitle) = &self.subtitle {
            if subtitle.chars().count() > MAX_SUBTITLE_CHARS {
                return Err(ApiError::validation(format!(
                    "subtitle must be at most {} characters",
                    MAX_SUBTITLE_CHARS
                )));
            }
        }
        if let Some(url) = &self.url {
            let parsed = Url::parse(url).map_err(|_| ApiError::validation("url is not valid"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ApiError::validation("url must be http or https"));
            }
        }
        if self.media_url.is_some() != self.media_type.is_some() {
            return Err(ApiError::validation("media_url and media_type must be sent together"));
        }
        if self.url.is_none() && self.media_url.is_none() {
            return Err(ApiError::validation("a url or a media attachment is required"));
        }
        Ok(())
    }
}

pub async fn list_threads(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListThreadsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = non_blank(query.channel);
    let rows = blocking(&state, move |state| Ok(state.db.list_threads(channel.as_deref())?)).await?;

    let threads: Vec<ThreadSummary> = rows
        .into_iter()
        .map(|agg| ThreadSummary {
            thread: thread_view(agg.thread),
            comment_count: agg.comment_count.max(0) as u64,
            reactions: reaction_counts(agg.reactions),
        })
        .collect();

    Ok(Json(threads))
}

pub async fn get_thread(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |state| Ok(state.db.get_thread_detail(id)?))
        .await?
        .ok_or(ApiError::NotFound("thread not found"))?;

    Ok(Json(ThreadDetail {
        thread: thread_view(detail.thread),
        reactions: reaction_counts(detail.reactions),
        comments: detail.comments.into_iter().map(comment_aggregate_view).collect(),
    }))
}

pub async fn create_thread(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiJson(req): ApiJson<CreateThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = ThreadFields {
        title: non_blank(req.title).unwrap_or_default(),
        subtitle: non_blank(req.subtitle),
        url: non_blank(req.url),
        media_url: non_blank(req.media_url),
        media_type: non_blank(req.media_type),
        tags: non_blank(req.tags),
    };
    fields.validate()?;

    let slug = non_blank(req.channel).unwrap_or_else(|| state.settings.default_channel.clone());
    let channel = blocking(&state, move |state| Ok(state.db.get_channel_by_slug(&slug)?))
        .await?
        .ok_or_else(|| ApiError::validation("unknown channel"))?;

    let thumbnail = match &fields.url {
        Some(url) => state.thumbnails.lookup(url).await,
        None => None,
    };

    let new = NewThread {
        title: fields.title,
        subtitle: fields.subtitle,
        url: fields.url,
        thumbnail,
        media_url: fields.media_url,
        media_type: fields.media_type,
        tags: fields.tags,
        channel_id: channel.id,
        user_id: claims.sub,
    };
    let view = blocking(&state, move |state| {
        let id = state.db.insert_thread(&new)?;
        state
            .db
            .get_thread_view(id)?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("thread {} vanished after insert", id)))
    })
    .await?;

    info!("User {} created thread {}", claims.sub, view.thread.id);

    Ok((
        StatusCode::CREATED,
        Json(ThreadResponse {
            message: "thread created".into(),
            thread: thread_view(view),
        }),
    ))
}

pub async fn edit_thread(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<EditThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let current = blocking(&state, move |state| Ok(state.db.get_thread_row(id)?))
        .await?
        .ok_or(ApiError::NotFound("thread not found"))?;

    if current.user_id != claims.sub {
        return Err(ApiError::Forbidden("only the author can edit this thread"));
    }

    // `None` keeps the stored value; a blank string clears it.
    let merge = |sent: Option<String>, stored: Option<String>| match sent {
        Some(value) => non_blank(Some(value)),
        None => stored,
    };
    let fields = ThreadFields {
        title: match req.title {
            Some(title) => title.trim().to_string(),
            None => current.title.clone(),
        },
        subtitle: merge(req.subtitle, current.subtitle.clone()),
        url: merge(req.url, current.url.clone()),
        media_url: merge(req.media_url, current.media_url.clone()),
        media_type: merge(req.media_type, current.media_type.clone()),
        tags: merge(req.tags, current.tags.clone()),
    };
    fields.validate()?;

    let thumbnail = if fields.url == current.url {
        current.thumbnail.clone()
    } else {
        match &fields.url {
            Some(url) => state.thumbnails.lookup(url).await,
            None => None,
        }
    };

    let changes = ThreadChanges {
        title: fields.title,
        subtitle: fields.subtitle,
        url: fields.url,
        thumbnail,
        media_url: fields.media_url,
        media_type: fields.media_type,
        tags: fields.tags,
    };
    let view = blocking(&state, move |state| {
        if !state.db.update_thread(id, &changes)? {
            return Err(ApiError::NotFound("thread not found"));
        }
        state
            .db
            .get_thread_view(id)?
            .ok_or(ApiError::NotFound("thread not found"))
    })
    .await?;

    info!("User {} edited thread {}", claims.sub, id);

    Ok(Json(ThreadResponse {
        message: "thread updated".into(),
        thread: thread_view(view),
    }))
}
