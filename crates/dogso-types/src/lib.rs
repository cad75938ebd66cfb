pub mod api;
pub mod comments;
pub mod models;
