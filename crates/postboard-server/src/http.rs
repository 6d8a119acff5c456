use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Html, Redirect};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::board::{Board, NewComment, NewPost, ReactionKind};
use crate::config::Config;
use crate::error::{AppError, BoardError};
use crate::loader::DataLoader;
use crate::remote::DummyJsonSource;
use crate::store::{AnyStore, FsStore, MemoryStore, Persistence};
use crate::views;

pub type LiveBoard = Board<DummyJsonSource, AnyStore>;

// ── Shared state ────────────────────────────────────────────────────

/// All requests go through the one board lock, so reads and mutations never interleave.
pub struct AppState {
    pub board: Mutex<LiveBoard>,
}

impl AppState {
    pub fn new(board: LiveBoard) -> Self {
        Self { board: Mutex::new(board) }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let store = match &config.data_dir {
            Some(dir) => AnyStore::Fs(FsStore::new(dir)),
            None => AnyStore::Memory(MemoryStore::new()),
        };
        let loader = DataLoader::new(
            DummyJsonSource::new(http, config.api_base.clone()),
            Persistence::new(store, config.storage_key.clone()),
        );
        Self::new(Board::new(loader))
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(list_posts))
        .route("/posts", post(create_post))
        .route("/posts/new", get(new_post_form))
        .route("/posts/:id", get(show_post))
        .route("/posts/:id/comments", post(create_comment))
        .route("/posts/:id/reactions/:kind", post(react))
        .route("/posts/:id/comments/:comment_id/like", post(like_comment))
        .route("/clear", post(clear))
        .fallback(not_found)
        .with_state(state)
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub cleared: bool,
}

#[derive(Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default, rename = "userId")]
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default, rename = "commentBody")]
    pub comment_body: String,
    #[serde(default, rename = "userId")]
    pub user_id: String,
}

/// Rejects blank values. The value itself is stored as submitted.
fn require_filled(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

fn parse_user_id(raw: &str) -> Result<u64, AppError> {
    require_filled("user", raw)?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id '{}'", raw)))
}

/// Non-numeric ids name no post, so they are a 404 rather than a 400.
fn parse_id(raw: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("no page at '{}'", raw)))
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let mut board = state.board.lock().await;
    let dataset = board.load_dataset().await?;
    let banner = query
        .cleared
        .then(|| views::render_notice("Local data cleared. Posts were reloaded from the source."));
    Ok(Html(views::page("Posts", views::render_list(dataset), banner)))
}

async fn new_post_form(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let mut board = state.board.lock().await;
    let dataset = board.load_dataset().await?;
    Ok(Html(views::page("New post", views::render_new_post_form(dataset), None)))
}

async fn show_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id)?;
    let mut board = state.board.lock().await;
    let dataset = board.load_dataset().await?;
    let post = dataset.find_post(id).ok_or(BoardError::PostNotFound(id))?;
    let title = post.title.clone();
    let view = views::render_detail(dataset, id).ok_or(BoardError::PostNotFound(id))?;
    Ok(Html(views::page(&title, view, None)))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PostForm>,
) -> Result<Redirect, AppError> {
    require_filled("title", &form.title)?;
    require_filled("body", &form.body)?;
    let new_post = NewPost {
        user_id: parse_user_id(&form.user_id)?,
        title: form.title,
        body: form.body,
        tags: form.tags,
    };
    let post = state.board.lock().await.submit_new_post(new_post).await?;
    Ok(Redirect::to(&views::post_href(post.id)))
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    require_filled("comment", &form.comment_body)?;
    let new_comment = NewComment {
        user_id: parse_user_id(&form.user_id)?,
        body: form.comment_body,
    };
    state.board.lock().await.submit_new_comment(id, new_comment).await?;
    Ok(Redirect::to(&views::post_href(id)))
}

async fn react(
    State(state): State<Arc<AppState>>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    let kind: ReactionKind = kind.parse().map_err(AppError::BadRequest)?;
    state.board.lock().await.increment_reaction(id, kind).await?;
    Ok(Redirect::to(&views::post_href(id)))
}

async fn like_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let id = parse_id(&id)?;
    let comment_id = parse_id(&comment_id)?;
    state
        .board
        .lock()
        .await
        .increment_comment_like(id, comment_id)
        .await?;
    Ok(Redirect::to(&views::post_href(id)))
}

async fn clear(State(state): State<Arc<AppState>>) -> Result<Redirect, AppError> {
    state.board.lock().await.clear_dataset()?;
    Ok(Redirect::to("/?cleared=true"))
}

async fn not_found() -> AppError {
    AppError::NotFound("page".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::Json;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::model::{fixtures, Dataset};
    use crate::store::SnapshotStore;

    /// Minimal stand-in for the upstream API, counting hits across all collections.
    async fn spawn_upstream(fail_posts: bool) -> (SocketAddr, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let ds = Arc::new(fixtures::dataset());

        let app = Router::new()
            .route(
                "/:resource",
                get(
                    move |Path(resource): Path<String>,
                          State((hits, ds)): State<(Arc<AtomicUsize>, Arc<Dataset>)>| async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        let items = match resource.as_str() {
                            "users" => json!(ds.users),
                            "posts" if fail_posts => {
                                return StatusCode::SERVICE_UNAVAILABLE.into_response()
                            }
                            "posts" => json!(ds.posts),
                            "comments" => json!(ds.comments),
                            _ => return StatusCode::NOT_FOUND.into_response(),
                        };
                        Json(json!({ resource: items, "total": 0, "skip": 0, "limit": 0 }))
                            .into_response()
                    },
                ),
            )
            .with_state((hits.clone(), ds));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, hits)
    }

    fn app_for(addr: SocketAddr) -> (Router, Arc<AppState>) {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let config = Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            api_base: format!("http://{}", addr),
            data_dir: None,
            storage_key: "data".into(),
        };
        let state = Arc::new(AppState::from_config(&config, http));
        (router(state.clone()), state)
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, Option<String>) {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        (resp.status(), location)
    }

    async fn stored(state: &AppState) -> Dataset {
        state.board.lock().await.loader().cache().load().unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_list_loads_once() {
        let (addr, hits) = spawn_upstream(false).await;
        let (app, _) = app_for(addr);

        let (status, html) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("href=\"/posts/2\""));
        assert!(html.find("data-key=\"post-2\"") < html.find("data-key=\"post-1\""));
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        get_page(&app, "/").await;
        get_page(&app, "/posts/1").await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_load_shows_banner() {
        let (addr, _) = spawn_upstream(true).await;
        let (app, state) = app_for(addr);

        let (status, html) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("upstream returned 503"));
        assert!(state.board.lock().await.dataset().is_none());
    }

    #[tokio::test]
    async fn test_new_post_flow() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, state) = app_for(addr);

        let (status, html) = get_page(&app, "/posts/new").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("name=\"title\""));

        let (status, location) = post_form(
            &app,
            "/posts",
            "title=Fresh&body=Some+text&tags=Hello%2C+World%21%21+foo_bar&userId=2",
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/posts/3"));

        let post = stored(&state).await.find_post(3).cloned().unwrap();
        assert_eq!(post.tags, vec!["Hello", "World", "foobar"]);
        assert_eq!(post.user_id, 2);

        let (status, html) = get_page(&app, "/posts/3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h2>Fresh</h2>"));
        assert!(html.contains("michaelw"));
    }

    #[tokio::test]
    async fn test_blank_title_rejected() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, _) = app_for(addr);
        let (status, _) = post_form(&app, "/posts", "title=+++&body=x&userId=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submitted_text_is_stored_verbatim() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, state) = app_for(addr);

        let (status, _) = post_form(
            &app,
            "/posts",
            "title=++Spaced+title+&body=%0Aline+one%0A++&tags=&userId=+1+",
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let post = stored(&state).await.find_post(3).cloned().unwrap();
        assert_eq!(post.title, "  Spaced title ");
        assert_eq!(post.body, "\nline one\n  ");
        assert_eq!(post.user_id, 1);

        post_form(&app, "/posts/3/comments", "commentBody=+indented+&userId=2").await;
        let ds = stored(&state).await;
        assert_eq!(ds.comments.last().unwrap().body, " indented ");
    }

    #[tokio::test]
    async fn test_reactions_and_comment_likes() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, state) = app_for(addr);

        let (status, location) = post_form(&app, "/posts/1/reactions/like", "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/posts/1"));
        post_form(&app, "/posts/1/reactions/dislike", "").await;
        let post = stored(&state).await.find_post(1).cloned().unwrap();
        assert_eq!((post.reactions.likes, post.reactions.dislikes), (4, 2));

        let (status, _) = post_form(&app, "/posts/1/reactions/meh", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        post_form(&app, "/posts/1/comments/3/like", "").await;
        let ds = stored(&state).await;
        assert_eq!(ds.comments.iter().find(|c| c.id == 3).unwrap().likes, 1);

        let (status, _) = post_form(&app, "/posts/1/comments/2/like", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comment_flow() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, state) = app_for(addr);

        let (status, location) =
            post_form(&app, "/posts/2/comments", "commentBody=Well+said&userId=1").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/posts/2"));
        let ds = stored(&state).await;
        let last = ds.comments.last().unwrap();
        assert_eq!((last.id, last.post_id, last.user.username.as_str()), (4, 2, "emilys"));

        let (status, _) = post_form(&app, "/posts/2/comments", "commentBody=x&userId=404").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clear_refetches() {
        let (addr, hits) = spawn_upstream(false).await;
        let (app, state) = app_for(addr);

        get_page(&app, "/").await;
        post_form(&app, "/posts/1/reactions/like", "").await;

        let (status, location) = post_form(&app, "/clear", "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/?cleared=true"));
        let board = state.board.lock().await;
        assert!(board.loader().cache().store().get_item("data").unwrap().is_none());
        drop(board);

        let (_, html) = get_page(&app, "/?cleared=true").await;
        assert!(html.contains("Local data cleared"));
        assert_eq!(hits.load(Ordering::SeqCst), 6);
        // the local like is gone with the snapshot
        assert_eq!(stored(&state).await.find_post(1).unwrap().reactions.likes, 3);
    }

    #[tokio::test]
    async fn test_not_found_pages() {
        let (addr, _) = spawn_upstream(false).await;
        let (app, _) = app_for(addr);

        assert_eq!(get_page(&app, "/posts/999").await.0, StatusCode::NOT_FOUND);
        assert_eq!(get_page(&app, "/posts/abc").await.0, StatusCode::NOT_FOUND);
        let (status, html) = get_page(&app, "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("Not found"));
        assert_eq!(get_page(&app, "/health").await, (StatusCode::OK, "ok".into()));
    }
}
