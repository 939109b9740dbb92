use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use cloudshare::{build_with, Backends, LanguageModel};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use share_docs::{Document, MemoryDocumentStore};
use share_media::MemoryMediaStore;
use tower::ServiceExt;

const BOUNDARY: &str = "cloudshare-test-boundary";

struct Harness {
    router: Router,
    media: Arc<MemoryMediaStore>,
    docs: Arc<MemoryDocumentStore>,
}

impl Harness {
    fn new(chat: Option<Arc<dyn LanguageModel>>) -> Self {
        let media = Arc::new(MemoryMediaStore::new());
        let docs = Arc::new(MemoryDocumentStore::new());
        let ax = build_with(Backends {
            media: media.clone(),
            documents: docs.clone(),
            chat,
        })
        .unwrap();

        Self {
            router: ax.router(),
            media,
            docs,
        }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn seed(&self, id: &str, name: &str, file_url: &str) {
        let fields = json!({
            "name": name,
            "message": "hello",
            "fileUrl": file_url,
            "createdAt": "2024-03-05T10:00:00Z",
        });
        self.docs
            .insert_raw("data", Document::new(id, fields.as_object().cloned().unwrap()))
            .await;
    }
}

async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(res: Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_post(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_ok() {
    let h = Harness::new(None);
    let res = h.send(get("/health")).await;

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(text_body(res).await, "ok");
}

// ---- REST: /submissions ----

#[tokio::test]
async fn submissions_is_registered_once_with_its_hooks() {
    let docs = Arc::new(MemoryDocumentStore::new());
    let ax = build_with(Backends {
        media: Arc::new(MemoryMediaStore::new()),
        documents: docs.clone(),
        chat: None,
    })
    .unwrap();
    assert_eq!(ax.app.service_names(), vec!["submissions".to_string()]);

    let fields = json!({"name": "Ada", "message": "m", "fileUrl": "https://cdn.example/a.png"});
    docs.insert_raw("data", Document::new("a", fields.as_object().cloned().unwrap()))
        .await;
    let res = ax.router().oneshot(get("/submissions/a")).await.unwrap();
    assert_eq!(json_body(res).await["fileKind"], "image");

    let unconfirmed = Request::builder()
        .method("DELETE")
        .uri("/submissions/a")
        .body(Body::empty())
        .unwrap();
    let res = ax.router().oneshot(unconfirmed).await.unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(docs.len("data").await, 1);
}

#[tokio::test]
async fn create_uploads_then_stores_the_record() {
    let h = Harness::new(None);
    let body = multipart(&[("name", "Ada"), ("message", "notes")], Some(("report.pdf", b"%PDF")));

    let res = h.send(multipart_post("/submissions", body)).await;
    assert_eq!(res.status().as_u16(), 200);

    let created = json_body(res).await;
    assert_eq!(created["name"], "Ada");
    assert_eq!(created["message"], "notes");
    assert!(created["fileUrl"].as_str().unwrap().ends_with("/report.pdf"));
    assert!(created["createdAt"].is_string());

    assert_eq!(h.media.upload_calls(), 1);
    assert_eq!(h.docs.create_calls(), 1);
    assert_eq!(h.docs.len("data").await, 1);
}

#[tokio::test]
async fn create_with_missing_fields_touches_no_store() {
    let h = Harness::new(None);
    let body = multipart(&[("name", "  "), ("message", "notes")], None);

    let res = h.send(multipart_post("/submissions", body)).await;
    assert_eq!(res.status().as_u16(), 400);

    let err = json_body(res).await;
    assert_eq!(err["name"], "BadRequest");
    assert_eq!(err["message"], "All fields are required.");
    assert_eq!(err["errors"]["name"], json!(["required"]));
    assert_eq!(err["errors"]["file"], json!(["required"]));
    assert!(err["errors"].get("message").is_none());

    assert_eq!(h.media.upload_calls(), 0);
    assert_eq!(h.docs.create_calls(), 0);
}

#[tokio::test]
async fn failed_upload_writes_nothing() {
    let h = Harness::new(None);
    h.media.fail_uploads(true);
    let body = multipart(&[("name", "Ada"), ("message", "m")], Some(("a.png", b"png")));

    let res = h.send(multipart_post("/submissions", body)).await;
    assert_eq!(res.status().as_u16(), 502);

    let err = json_body(res).await;
    assert_eq!(err["message"], "File upload failed.");
    assert_eq!(h.media.upload_calls(), 1);
    assert_eq!(h.docs.create_calls(), 0);
}

#[tokio::test]
async fn failed_write_is_a_bad_gateway() {
    let h = Harness::new(None);
    h.docs.fail_writes(true);
    let body = multipart(&[("name", "Ada"), ("message", "m")], Some(("a.png", b"png")));

    let res = h.send(multipart_post("/submissions", body)).await;
    assert_eq!(res.status().as_u16(), 502);
    assert_eq!(json_body(res).await["message"], "Submission failed.");
    assert_eq!(h.docs.len("data").await, 0);
}

#[tokio::test]
async fn find_lists_valid_records_with_file_kind() {
    let h = Harness::new(None);
    h.seed("a", "Ada", "https://cdn.example/u/photo.JPG").await;
    h.seed("b", "Bob", "https://cdn.example/u/clip.mp4?v=1").await;
    h.docs
        .insert_raw("data", Document::new("broken", json!({"name": "x"}).as_object().cloned().unwrap()))
        .await;

    let res = h.send(get("/submissions")).await;
    assert_eq!(res.status().as_u16(), 200);

    let list = json_body(res).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);

    let kind_of = |id: &str| {
        list.iter()
            .find(|r| r["id"] == id)
            .map(|r| r["fileKind"].clone())
            .unwrap()
    };
    assert_eq!(kind_of("a"), "image");
    assert_eq!(kind_of("b"), "video");
}

#[tokio::test]
async fn get_unknown_record_is_404() {
    let h = Harness::new(None);
    let res = h.send(get("/submissions/nope")).await;

    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(json_body(res).await["name"], "NotFound");
}

#[tokio::test]
async fn remove_requires_confirmation() {
    let h = Harness::new(None);
    h.seed("a", "Ada", "https://cdn.example/a.zip").await;

    let unconfirmed = Request::builder()
        .method("DELETE")
        .uri("/submissions/a")
        .body(Body::empty())
        .unwrap();
    let res = h.send(unconfirmed).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["data"]["id"], "a");
    assert_eq!(h.docs.delete_calls(), 0);

    let confirmed = Request::builder()
        .method("DELETE")
        .uri("/submissions/a?confirm=true")
        .body(Body::empty())
        .unwrap();
    let res = h.send(confirmed).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["name"], "Ada");
    assert_eq!(h.docs.len("data").await, 0);
    assert_eq!(h.media.destroy_calls(), 0);

    let again = Request::builder()
        .method("DELETE")
        .uri("/submissions/a?confirm=true")
        .body(Body::empty())
        .unwrap();
    assert_eq!(h.send(again).await.status().as_u16(), 404);
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let h = Harness::new(None);
    let req = Request::builder()
        .method("PATCH")
        .uri("/submissions/a")
        .body(Body::empty())
        .unwrap();

    let res = h.send(req).await;
    assert_eq!(res.status().as_u16(), 405);
    assert_eq!(json_body(res).await["name"], "MethodNotAllowed");
}

// ---- Pages ----

#[tokio::test]
async fn index_page_renders_the_form() {
    let h = Harness::new(None);
    let res = h.send(get("/")).await;

    assert_eq!(res.status().as_u16(), 200);
    let html = text_body(res).await;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("Submit the Request"));
    assert!(!html.contains("chat-form"));
}

#[tokio::test]
async fn page_submit_success_clears_the_form() {
    let h = Harness::new(None);
    let body = multipart(&[("name", "Ada"), ("message", "see attached")], Some(("a.png", b"png")));

    let res = h.send(multipart_post("/", body)).await;
    assert_eq!(res.status().as_u16(), 200);

    let html = text_body(res).await;
    assert!(html.contains("Submitted successfully!"));
    assert!(!html.contains("value=\"Ada\""));
    assert_eq!(h.docs.len("data").await, 1);
}

#[tokio::test]
async fn page_submit_failure_keeps_the_fields() {
    let h = Harness::new(None);
    h.media.fail_uploads(true);
    let body = multipart(&[("name", "Ada"), ("message", "see attached")], Some(("a.png", b"png")));

    let html = text_body(h.send(multipart_post("/", body)).await).await;
    assert!(html.contains("File upload failed."));
    assert!(html.contains("value=\"Ada\""));
    assert!(html.contains("File Attached! a.png"));
    assert_eq!(h.docs.create_calls(), 0);
}

#[tokio::test]
async fn page_submit_with_empty_fields_reports_them() {
    let h = Harness::new(None);
    let body = multipart(&[("name", ""), ("message", "")], None);

    let html = text_body(h.send(multipart_post("/", body)).await).await;
    assert!(html.contains("All fields are required."));
    assert_eq!(h.media.upload_calls(), 0);
}

#[tokio::test]
async fn dashboard_renders_each_kind() {
    let h = Harness::new(None);
    h.seed("img", "Ada", "https://cdn.example/a.png").await;
    h.seed("vid", "Bob", "https://cdn.example/b.mp4").await;
    h.seed("zip", "Cy", "https://cdn.example/c.zip").await;
    h.seed("doc", "Di", "https://cdn.example/d.pdf").await;

    let res = h.send(get("/dashboard")).await;
    assert_eq!(res.status().as_u16(), 200);

    let html = text_body(res).await;
    assert!(html.contains("<img src=\"https://cdn.example/a.png\""));
    assert!(html.contains("type=\"video/mp4\""));
    assert!(html.contains("Download ZIP"));
    assert!(html.contains("Open File"));
    assert!(html.contains("Date: 2024-03-05"));
    assert!(html.contains("Are you sure you want to delete this client?"));
}

#[tokio::test]
async fn dashboard_delete_needs_confirmation() {
    let h = Harness::new(None);
    h.seed("a", "Ada", "https://cdn.example/a.png").await;

    let form = |body: &'static str| {
        Request::builder()
            .method("POST")
            .uri("/dashboard/a/delete")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    };

    let html = text_body(h.send(form("")).await).await;
    assert!(html.contains("submission-a"));
    assert_eq!(h.docs.delete_calls(), 0);

    let html = text_body(h.send(form("confirm=yes")).await).await;
    assert!(html.contains("Ada deleted successfully!"));
    assert!(!html.contains("submission-a"));
    assert_eq!(h.docs.len("data").await, 0);
}

#[tokio::test]
async fn dashboard_delete_targets_ids_with_url_delimiters() {
    let h = Harness::new(None);
    h.seed("a", "Ada", "https://cdn.example/a.png").await;
    h.seed("a?b", "Bea", "https://cdn.example/b.png").await;

    let html = text_body(h.send(get("/dashboard")).await).await;
    assert!(html.contains("action=\"/dashboard/a%3Fb/delete\""));

    let req = Request::builder()
        .method("POST")
        .uri("/dashboard/a%3Fb/delete")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("confirm=yes"))
        .unwrap();
    let html = text_body(h.send(req).await).await;

    assert!(html.contains("Bea deleted successfully!"));
    assert!(html.contains("submission-a\""));
    assert_eq!(h.docs.len("data").await, 1);
}

#[tokio::test]
async fn dashboard_delete_failure_is_silent() {
    let h = Harness::new(None);
    h.seed("a", "Ada", "https://cdn.example/a.png").await;
    h.docs.fail_deletes(true);

    let req = Request::builder()
        .method("POST")
        .uri("/dashboard/a/delete")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("confirm=yes"))
        .unwrap();
    let html = text_body(h.send(req).await).await;

    assert!(html.contains("submission-a"));
    assert!(!html.contains("deleted successfully"));
    assert!(!html.contains("class=\"notice"));
}

// ---- /api/deleteFile ----

#[tokio::test]
async fn delete_file_rejects_other_methods() {
    let h = Harness::new(None);
    let res = h.send(get("/api/deleteFile")).await;

    assert_eq!(res.status().as_u16(), 405);
    assert_eq!(json_body(res).await, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn delete_file_requires_public_id() {
    let h = Harness::new(None);
    let res = h.send(json_post("/api/deleteFile", json!({"publicId": ""}))).await;

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await, json!({"error": "Missing publicId"}));
    assert_eq!(h.media.destroy_calls(), 0);
}

#[tokio::test]
async fn delete_file_returns_the_store_result() {
    let h = Harness::new(None);
    let res = h.send(json_post("/api/deleteFile", json!({"publicId": "abc"}))).await;

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["result"]["result"], "not found");
    assert_eq!(h.media.destroy_calls(), 1);
}

#[tokio::test]
async fn delete_file_failure_is_500_with_details() {
    let h = Harness::new(None);
    h.media.fail_destroys(true);
    let res = h.send(json_post("/api/deleteFile", json!({"publicId": "abc"}))).await;

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["error"], "Failed to delete from Cloudinary");
    assert!(body["details"].as_str().unwrap().contains("destroy disabled"));
}

// ---- /chat ----

enum Reply {
    Text(&'static str),
    Empty,
    Fail,
}

struct Scripted {
    reply: Reply,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LanguageModel for Scripted {
    async fn generate(&self, _system_instruction: &str, _text: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Text(t) => Ok(Some(t.to_string())),
            Reply::Empty => Ok(None),
            Reply::Fail => Err(anyhow!("connection reset")),
        }
    }
}

#[tokio::test]
async fn chat_reply_is_appended_to_a_new_session() {
    let model = Scripted::new(Reply::Text("Hello! Upload a file on the home page."));
    let h = Harness::new(Some(model.clone()));

    let res = h.send(json_post("/chat", json!({"text": "  hi  "}))).await;
    assert_eq!(res.status().as_u16(), 200);

    let body = json_body(res).await;
    let session = body["session"].as_str().unwrap().to_string();
    assert_eq!(
        body["messages"],
        json!([
            {"sender": "user", "label": "You", "text": "hi"},
            {"sender": "bot", "label": "CloudShareBot", "text": "Hello! Upload a file on the home page."},
        ])
    );

    let res = h.send(get(&format!("/chat/{session}"))).await;
    assert_eq!(json_body(res).await["messages"].as_array().unwrap().len(), 2);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);

    let html = text_body(h.send(get("/")).await).await;
    assert!(html.contains("chat-form"));
}

#[tokio::test]
async fn chat_blank_input_is_ignored() {
    let model = Scripted::new(Reply::Text("unused"));
    let h = Harness::new(Some(model.clone()));

    let body = json_body(h.send(json_post("/chat", json!({"text": "   "}))).await).await;
    assert!(body["session"].is_null());
    assert_eq!(body["messages"], json!([]));
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn chat_failures_become_fixed_replies() {
    let h = Harness::new(Some(Scripted::new(Reply::Empty)));
    let body = json_body(h.send(json_post("/chat", json!({"text": "hi"}))).await).await;
    assert_eq!(
        body["messages"][1]["text"],
        "Sorry, I couldn't understand your request. Please try rephrasing."
    );

    let h = Harness::new(Some(Scripted::new(Reply::Fail)));
    let body = json_body(h.send(json_post("/chat", json!({"text": "hi"}))).await).await;
    assert_eq!(body["messages"][1]["text"], "Oops! Something went wrong. Please try again later.");
}

#[tokio::test]
async fn chat_session_keeps_its_transcript() {
    let h = Harness::new(Some(Scripted::new(Reply::Text("ok"))));

    let first = json_body(h.send(json_post("/chat", json!({"text": "one"}))).await).await;
    let session = first["session"].clone();

    let second = json_body(h.send(json_post("/chat", json!({"session": session, "text": "two"}))).await).await;
    assert_eq!(second["session"], session);
    assert_eq!(second["messages"].as_array().unwrap().len(), 4);
    assert_eq!(second["messages"][2]["text"], "two");
}

#[tokio::test]
async fn chat_rejects_malformed_json_and_unknown_sessions() {
    let h = Harness::new(Some(Scripted::new(Reply::Text("ok"))));

    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = h.send(req).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["name"], "BadRequest");

    let res = h.send(get("/chat/missing")).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn chat_is_not_mounted_without_a_model() {
    let h = Harness::new(None);
    let res = h.send(json_post("/chat", json!({"text": "hi"}))).await;
    assert_eq!(res.status().as_u16(), 404);
}
