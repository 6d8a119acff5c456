use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::remote::Resource;
use crate::views;

/// A remote collection could not be retrieved. Aborts the whole load.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch {resource}: {message}")]
    Transport { resource: Resource, message: String },
    #[error("fetch {resource}: upstream returned {status}")]
    Status { resource: Resource, status: u16 },
    #[error("decode {resource}: {message}")]
    Decode { resource: Resource, message: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serde: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Network(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("unknown user {0}")]
    UnknownUser(u64),
    #[error("post {0} not found")]
    PostNotFound(u64),
    #[error("comment {comment_id} not found on post {post_id}")]
    CommentNotFound { post_id: u64, comment_id: u64 },
    #[error("no {0} ids left to assign")]
    IdsExhausted(&'static str),
}

/// Everything a request handler can fail with.
#[derive(Debug)]
pub enum AppError {
    Board(BoardError),
    BadRequest(String),
    NotFound(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Board(e) => write!(f, "{}", e),
            Self::BadRequest(e) => write!(f, "bad request: {}", e),
            Self::NotFound(e) => write!(f, "not found: {}", e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Board(BoardError::Network(_)) => StatusCode::BAD_GATEWAY,
            Self::Board(BoardError::Storage(_) | BoardError::IdsExhausted(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Board(BoardError::UnknownUser(_)) => StatusCode::BAD_REQUEST,
            Self::Board(BoardError::PostNotFound(_) | BoardError::CommentNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown in the page banner.
    fn user_message(&self) -> String {
        match self {
            Self::Board(BoardError::Network(e)) => {
                format!("Could not load posts from the data source ({}). Try again later.", e)
            }
            Self::Board(BoardError::Storage(_)) => {
                "Local data could not be read or written. Clearing the cache may help.".into()
            }
            other => {
                let msg = other.to_string();
                let mut chars = msg.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => msg,
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }
        let page = views::page("Error", views::render_error(&self.user_message()), None);
        (status, Html(page)).into_response()
    }
}

impl From<BoardError> for AppError {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}
