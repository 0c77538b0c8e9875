use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Note};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder().method(method).uri(uri).body(String::new()).unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_request() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/echo/some/path?a=1&b")
                .header("x-test", "yes")
                .body("payload".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.path, "/echo/some/path");
    assert_eq!(echo.query.as_deref(), Some("a=1&b"));
    assert_eq!(echo.headers.get("x-test").map(String::as_str), Some("yes"));
    assert_eq!(echo.body, "payload");
}

#[tokio::test]
async fn echo_root_has_no_query() {
    let resp = app().oneshot(empty_request("GET", "/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.path, "/echo");
    assert!(echo.query.is_none());
    assert!(echo.body.is_empty());
}

// --- mirror ---

#[tokio::test]
async fn mirror_returns_body_and_content_type() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mirror")
                .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body("hello".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_bytes(resp).await.as_ref(), b"hello");
}

// --- status ---

#[tokio::test]
async fn status_answers_with_requested_code() {
    let resp = app().oneshot(empty_request("GET", "/status/418")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_bytes(resp).await.as_ref(), b"status 418");

    let resp = app().oneshot(empty_request("DELETE", "/status/204")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_rejects_invalid_code() {
    let resp = app().oneshot(empty_request("GET", "/status/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- bytes ---

#[tokio::test]
async fn bytes_returns_requested_length() {
    let resp = app().oneshot(empty_request("GET", "/bytes/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), b"xxxxx");
}

// --- notes ---

#[tokio::test]
async fn create_note_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/notes", r#"{"title":"Buy milk","tags":["shop"]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let note: Note = body_json(resp).await;
    assert_eq!(note.title, "Buy milk");
    assert_eq!(note.tags, ["shop"]);
}

#[tokio::test]
async fn create_note_malformed_json_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/notes", r#"{"not_title":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_note_not_found() {
    let resp = app()
        .oneshot(empty_request("GET", "/notes/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn note_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create two
    let mut ids = Vec::new();
    for body in [r#"{"title":"b","tags":["x"]}"#, r#"{"title":"a"}"#] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("POST", "/notes", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let note: Note = body_json(resp).await;
        ids.push(note.id);
    }

    // list is sorted by title and filterable by tag
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/notes"))
        .await
        .unwrap();
    let notes: Vec<Note> = body_json(resp).await;
    let titles: Vec<&str> = notes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["a", "b"]);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/notes?tag=x"))
        .await
        .unwrap();
    let notes: Vec<Note> = body_json(resp).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, ids[0]);

    // replace the body as text
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("PUT")
                .uri(format!("/notes/{}/body", ids[0]))
                .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body("new body".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/notes/{}/body", ids[0])))
        .await
        .unwrap();
    assert_eq!(body_bytes(resp).await.as_ref(), b"new body");

    // delete, then it is gone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/notes/{}", ids[0])))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/notes/{}", ids[0])))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
