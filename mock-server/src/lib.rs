use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct CreateNote {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct ListNotes {
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

/// What `/echo` saw of a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Note>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/mirror", any(mirror))
        .route("/status/{code}", any(status))
        .route("/bytes/{len}", get(bytes))
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", get(get_note).delete(delete_note))
        .route("/notes/{id}/body", put(put_note_body).get(get_note_body))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Answers with the request body, labelled with the request's content type.
async fn mirror(headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.into_response();
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        response.headers_mut().insert(CONTENT_TYPE, content_type.clone());
    }
    response
}

async fn status(Path(code): Path<u16>) -> Result<Response, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return Ok(status.into_response());
    }
    Ok((status, format!("status {code}")).into_response())
}

/// `len` bytes of filler, for exercising large bodies.
async fn bytes(Path(len): Path<usize>) -> Response {
    Bytes::from(vec![b'x'; len]).into_response()
}

async fn list_notes(State(db): State<Db>, Query(params): Query<ListNotes>) -> Json<Vec<Note>> {
    let notes = db.read().await;
    let mut matching: Vec<Note> = notes
        .values()
        .filter(|note| params.tag.as_ref().is_none_or(|tag| note.tags.contains(tag)))
        .cloned()
        .collect();
    matching.sort_by(|a, b| a.title.cmp(&b.title));
    if let Some(limit) = params.limit {
        matching.truncate(limit);
    }
    Json(matching)
}

async fn create_note(State(db): State<Db>, Json(input): Json<CreateNote>) -> (StatusCode, Json<Note>) {
    let note = Note {
        id: Uuid::new_v4(),
        title: input.title,
        body: input.body,
        tags: input.tags,
    };
    db.write().await.insert(note.id, note.clone());
    (StatusCode::CREATED, Json(note))
}

async fn get_note(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<Note>, StatusCode> {
    let notes = db.read().await;
    notes.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_note(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    let mut notes = db.write().await;
    notes.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn get_note_body(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<String, StatusCode> {
    let notes = db.read().await;
    notes.get(&id).map(|note| note.body.clone()).ok_or(StatusCode::NOT_FOUND)
}

async fn put_note_body(State(db): State<Db>, Path(id): Path<Uuid>, body: String) -> Result<StatusCode, StatusCode> {
    let mut notes = db.write().await;
    let note = notes.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    note.body = body;
    Ok(StatusCode::NO_CONTENT)
}
