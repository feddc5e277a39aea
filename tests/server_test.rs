use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::Router;
use tower::ServiceExt;

use askfast::config::Settings;
use askfast::script::ScriptRegistry;
use askfast::server::{AppState, ScriptListResponse, create_router};

const HOST: &str = "http://dialogs.example.com";

fn app() -> Router {
    let settings = Settings {
        host: HOST.to_string(),
        ..Settings::default()
    };
    create_router(AppState::new(ScriptRegistry::with_builtin().unwrap(), settings))
}

async fn send(request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Option<String>, String) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(uri: &str, body: &str) -> (StatusCode, Option<String>, String) {
    send(
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn lists_scripts() {
    let (status, _, body) = get("/dialogs").await;
    assert_eq!(status, StatusCode::OK);
    let list: ScriptListResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(list.scripts, ["party"]);
}

#[tokio::test]
async fn first_question_lists_answers() {
    let (status, content_type, body) =
        get("/dialogs/party?preferred_medium=audio/wav&responder=bob").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let json = json(&body);
    assert_eq!(json["type"], "closed");
    assert_eq!(json["answers"].as_array().unwrap().len(), 3);
    assert_eq!(
        json["answers"][1]["callback"],
        format!("{HOST}/dialogs/party/questions/11")
    );
}

#[tokio::test]
async fn get_question_runs_step() {
    let (status, _, body) = get("/dialogs/party/questions/10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["question_text"], "text://Thanks for making time!");
}

#[tokio::test]
async fn unknown_question_says_fallback() {
    let (status, _, body) = get("/dialogs/party/questions/42").await;
    assert_eq!(status, StatusCode::OK);
    let json = json(&body);
    assert_eq!(json["type"], "comment");
    assert_eq!(
        json["question_text"],
        "text://Something went wrong in this conversation.."
    );
}

#[tokio::test]
async fn post_to_callback_runs_step() {
    let (status, _, body) = post(
        "/dialogs/party/questions/11",
        r#"{"dialog_id": "d-1", "question_id": "1", "responder": "bob"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["question_text"], "text://We will miss you!");
}

#[tokio::test]
async fn post_answer_text_to_question_resolves_it() {
    let (status, _, body) = post("/dialogs/party/questions/1", r#"{"answer_text": "Yup"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["question_text"], "text://Thanks for making time!");
}

#[tokio::test]
async fn post_referral_answer_redirects() {
    let (status, _, body) = post("/dialogs/party/questions/1", r#"{"answer_id": "12"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        format!(r#"{{"type":"referral","url":"{HOST}/questionanswer"}}"#)
    );
}

#[tokio::test]
async fn post_numeric_answer_id_with_null_extras() {
    let (status, _, body) = post(
        "/dialogs/party/questions/1",
        r#"{"dialog_id": "d-1", "answer_id": 11, "extras": null}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["question_text"], "text://We will miss you!");
}

#[tokio::test]
async fn get_announced_redirect_says_transfer() {
    let (status, _, body) = get("/dialogs/party/questions/12").await;
    assert_eq!(status, StatusCode::OK);
    let json = json(&body);
    assert_eq!(json["type"], "comment");
    assert_eq!(
        json["question_text"],
        "text://Transferring you to Appointment agent"
    );
}

#[tokio::test]
async fn post_to_redirect_step_redirects() {
    let (status, _, body) = post("/dialogs/party/questions/12", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        format!(r#"{{"type":"referral","url":"{HOST}/questionanswer"}}"#)
    );
}

#[tokio::test]
async fn post_unknown_answer_is_not_acceptable() {
    let (status, _, body) = post("/dialogs/party/questions/1", r#"{"answer_id": "99"}"#).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert!(json(&body)["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn post_with_garbage_body_reasks_question() {
    let (status, _, body) = post("/dialogs/party/questions/1", "not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["type"], "closed");
}

#[tokio::test]
async fn answer_text_is_plain_text() {
    let (status, content_type, body) = get("/dialogs/party/answers/10").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(body, "Yup");
}

#[tokio::test]
async fn unknown_answer_text_is_not_acceptable() {
    let (status, _, _) = get("/dialogs/party/answers/99").await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
}

#[tokio::test]
async fn unknown_script_is_not_found() {
    let (status, _, body) = get("/dialogs/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json(&body)["error"].as_str().unwrap().contains("nope"));
}
