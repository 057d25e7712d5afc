use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const CLIENT_ID: &str = "mock-client-id";
pub const CLIENT_SECRET: &str = "mock-client-secret";

/// Tagging this url answers 429.
pub const THROTTLE_URL: &str = "http://mock.invalid/throttle.jpg";

/// Docids count up from here, past the 64-bit range.
pub const FIRST_DOCID: u128 = 123_456_789_012_345_678_901_234_567_890;

const DEFAULT_MODEL: &str = "general-v1.3";
const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".mov", ".avi", ".webm"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TagRequest {
    #[serde(rename = "url")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub local_ids: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub docids: Vec<String>,
    pub url: Vec<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub dissimilar_docids: Vec<String>,
    pub similar_docids: Vec<String>,
    pub search_click: Vec<String>,
}

#[derive(Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Default)]
pub struct MockState {
    pub tokens: RwLock<HashSet<String>>,
    pub feedback: RwLock<Vec<FeedbackForm>>,
    next_docid: AtomicU64,
}

pub type Shared = Arc<MockState>;

type Failure = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_state(Shared::default())
}

pub fn app_with_state(state: Shared) -> Router {
    Router::new()
        .route("/v1/token/", post(issue_token))
        .route("/v1/info/", get(info))
        .route("/v1/tag/", post(tag))
        .route("/v1/feedback/", post(feedback))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn failure(status: StatusCode, code: &str, msg: &str) -> Failure {
    (status, Json(json!({ "status_code": code, "status_msg": msg })))
}

async fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let known = match token {
        Some(token) => state.tokens.read().await.contains(token),
        None => false,
    };
    if known {
        Ok(())
    } else {
        Err(failure(
            StatusCode::UNAUTHORIZED,
            "TOKEN_INVALID",
            "Token is not valid. Please use valid tokens.",
        ))
    }
}

async fn issue_token(
    State(state): State<Shared>,
    Form(form): Form<TokenForm>,
) -> Result<Json<Value>, Failure> {
    if form.grant_type != "client_credentials"
        || form.client_id != CLIENT_ID
        || form.client_secret != CLIENT_SECRET
    {
        tracing::warn!(client_id = %form.client_id, "rejected token request");
        return Err(failure(
            StatusCode::UNAUTHORIZED,
            "TOKEN_APP_INVALID",
            "Application for this token is not valid.",
        ));
    }
    let token = Uuid::new_v4().simple().to_string();
    state.tokens.write().await.insert(token.clone());
    tracing::info!("issued access token");
    Ok(Json(json!({
        "access_token": token,
        "expires_in": 172_800,
        "scope": "api_access",
        "token_type": "Bearer",
    })))
}

async fn info(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers).await?;
    Ok(Json(json!({
        "status_code": "OK",
        "status_msg": "All images in request have completed successfully. ",
        "results": {
            "max_image_size": 100_000,
            "default_language": "en",
            "max_video_size": 100_000,
            "max_image_bytes": 10_485_760,
            "min_image_size": 1,
            "default_model": DEFAULT_MODEL,
            "max_video_bytes": 104_857_600,
            "max_video_duration": 1800,
            "max_batch_size": 128,
            "max_video_batch_size": 1,
            "min_video_size": 1,
            "api_version": 0.1,
        }
    })))
}

fn is_video(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn tag_payload(video: bool) -> Value {
    if video {
        json!({
            "classes": [["train", "railway"], ["train"]],
            "catids": [["1", "2"], ["1"]],
            "probs": [[0.99, 0.97], [0.95]],
        })
    } else {
        json!({
            "classes": ["train", "railway", "transportation system"],
            "catids": ["1", "2", "3"],
            "probs": [0.99, 0.97, 0.95],
        })
    }
}

fn big_number(value: u128) -> Result<Number, Failure> {
    value.to_string().parse().map_err(|_| {
        failure(StatusCode::INTERNAL_SERVER_ERROR, "CLARIFAI_ERROR", "docid overflow")
    })
}

async fn tag(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(input): Json<TagRequest>,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers).await?;
    if input.urls.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "ALL_ERROR", "Missing url."));
    }
    if input.urls.iter().any(|url| url == THROTTLE_URL) {
        return Err(failure(StatusCode::TOO_MANY_REQUESTS, "THROTTLED", "Request limit reached."));
    }

    let mut results = Vec::with_capacity(input.urls.len());
    for (i, url) in input.urls.iter().enumerate() {
        let docid = FIRST_DOCID + u128::from(state.next_docid.fetch_add(1, Ordering::Relaxed));
        results.push(json!({
            "docid": big_number(docid)?,
            "docid_str": format!("{docid:032x}"),
            "url": url,
            "status_code": "OK",
            "status_msg": "OK",
            "local_id": input.local_ids.get(i).cloned().unwrap_or_default(),
            "result": { "tag": tag_payload(is_video(url)) },
        }));
    }
    tracing::info!(count = results.len(), "tagged urls");

    Ok(Json(json!({
        "status_code": "OK",
        "status_msg": "All images in request have completed successfully. ",
        "meta": {
            "tag": {
                "timestamp": 1_451_945_197.398_036,
                "model": input.model.as_deref().unwrap_or(DEFAULT_MODEL),
                "config": "34fb1111b4d5f67cf1b8665ebc603704",
            }
        },
        "results": results,
    })))
}

async fn feedback(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(form): Json<FeedbackForm>,
) -> Result<Json<Value>, Failure> {
    authorize(&state, &headers).await?;
    match (form.docids.is_empty(), form.url.is_empty()) {
        (true, true) => {
            return Err(failure(StatusCode::BAD_REQUEST, "ALL_ERROR", "Missing docids or url."))
        }
        (false, false) => {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "ALL_ERROR",
                "Provide exactly one of docids or url.",
            ))
        }
        _ => {}
    }
    state.feedback.write().await.push(form);
    Ok(Json(json!({
        "status_code": "OK",
        "status_msg": "Feedback successfully recorded. ",
    })))
}
