use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;

use crate::auth::{self, AppState};
use crate::uploads::{self, MAX_UPLOAD_SIZE, UPLOAD_URL_PREFIX};
use crate::{channels, comments, reactions, threads};

/// All HTTP routes. CORS and request tracing are layered on by the binary.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/channels", get(channels::list_channels))
        .route("/channels/{slug}", get(channels::get_channel))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/threads", get(threads::list_threads).post(threads::create_thread))
        .route("/threads/{id}", get(threads::get_thread).put(threads::edit_thread))
        .route("/comments", post(comments::create_comment))
        .route(
            "/reactions",
            post(reactions::add_reaction).delete(reactions::remove_reaction),
        )
        .route("/reactions/toggle", post(reactions::toggle_reaction))
        .route(
            "/upload",
            // multipart framing on top of the file itself
            post(uploads::upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024)),
        );

    Router::new()
        .route("/", get(health))
        .nest("/api", api)
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(&state.settings.upload_dir))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "DOGSO API is running" }))
}
