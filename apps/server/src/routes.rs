//! Router, shared state, and request handlers.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use templatesmith_editor::{
    TemplateEditor, check_upload_extension, content_disposition, content_type_for,
};
use templatesmith_shared::{DEFAULT_SOURCE_FILENAME, EditRequest, EditResult};

use crate::error::ApiError;

/// Uploads larger than this are rejected before reaching the handler.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const X_PROMPT_TOKENS: HeaderName = HeaderName::from_static("x-prompt-tokens");
const X_COMPLETION_TOKENS: HeaderName = HeaderName::from_static("x-completion-tokens");
const X_TOTAL_TOKENS: HeaderName = HeaderName::from_static("x-total-tokens");

/// Headers browsers may read from the edit response.
const EXPOSED_HEADERS: [HeaderName; 4] = [
    X_COMPLETION_TOKENS,
    X_PROMPT_TOKENS,
    X_TOTAL_TOKENS,
    header::CONTENT_DISPOSITION,
];

/// Handler state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    editor: Arc<TemplateEditor>,
}

impl AppState {
    pub fn new(editor: TemplateEditor) -> Self {
        Self {
            editor: Arc::new(editor),
        }
    }
}

/// All routes with CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/modify-template", post(modify_template))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive().expose_headers(EXPOSED_HEADERS))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "model": state.editor.model() }))
}

/// JSON form of the edit request.
#[derive(Debug, Deserialize)]
struct ModifyTemplateJson {
    #[serde(default)]
    template_content: String,
    #[serde(default)]
    prompt: String,
    api_key: Option<String>,
}

#[instrument(skip_all)]
async fn modify_template(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let edit = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {e}")))?;
        read_multipart(multipart).await?
    } else {
        let Json(body) = Json::<ModifyTemplateJson>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        EditRequest::new(body.template_content, body.prompt)
            .with_credential(body.api_key)
            .with_source_filename(Some(DEFAULT_SOURCE_FILENAME.to_string()))
    };

    // Detached so a client disconnect does not abort the upstream call.
    let editor = Arc::clone(&state.editor);
    let result = tokio::spawn(async move { editor.apply_edit(edit).await })
        .await
        .map_err(|e| ApiError::Internal(format!("edit task failed: {e}")))??;

    info!(
        filename = %result.output_filename,
        bytes = result.content.len(),
        total_tokens = result.usage.total_units,
        "sending modified template"
    );
    Ok(attachment(result))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

async fn read_multipart(mut multipart: Multipart) -> Result<EditRequest, ApiError> {
    let mut document = String::new();
    let mut filename = None;
    let mut prompt = String::new();
    let mut api_key = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "template_file" => {
                let upload = field.file_name().unwrap_or_default().to_string();
                check_upload_extension(&upload)?;
                filename = Some(upload);
                document = field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Template file is not valid UTF-8 text: {e}"))
                })?;
            }
            "prompt" => prompt = field_text(field).await?,
            "api_key" => api_key = Some(field_text(field).await?),
            _ => {}
        }
    }

    Ok(EditRequest::new(document, prompt)
        .with_credential(api_key)
        .with_source_filename(filename))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart data: {e}")))
}

/// Document bytes as a download, with token accounting in headers.
fn attachment(result: EditResult) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&result.output_filename)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&result.output_filename))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(X_PROMPT_TOKENS, HeaderValue::from(result.usage.prompt_units));
    headers.insert(
        X_COMPLETION_TOKENS,
        HeaderValue::from(result.usage.completion_units),
    );
    headers.insert(X_TOTAL_TOKENS, HeaderValue::from(result.usage.total_units));

    (StatusCode::OK, headers, result.content.into_bytes()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use templatesmith_editor::{DebugArtifacts, FieldCatalog, RuleBook, StaticChat};
    use templatesmith_shared::{EditorConfig, Usage};

    const DOC: &str = "<fo:root>\n  <fo:block>Invoice</fo:block>\n</fo:root>";

    fn test_server(chat: Arc<StaticChat>, default_credential: Option<&str>) -> TestServer {
        let config = EditorConfig {
            api_base_url: "http://127.0.0.1:9/v1".into(),
            model: "gpt-4o".into(),
            max_tokens: 8000,
            temperature: 0.1,
            request_timeout_secs: 5,
            default_credential: default_credential.map(String::from),
            debug_dir: None,
            rules_path: None,
        };
        let editor = TemplateEditor::with_chat(
            config,
            chat,
            &RuleBook::embedded().unwrap(),
            FieldCatalog::embedded().unwrap(),
            DebugArtifacts::disabled(),
        );
        TestServer::new(router(AppState::new(editor))).unwrap()
    }

    fn fenced_reply() -> Arc<StaticChat> {
        Arc::new(StaticChat::replying(
            format!("```xml\n{DOC}\n```"),
            Usage::new(1200, 340),
        ))
    }

    #[tokio::test]
    async fn health_reports_model() {
        let server = test_server(fenced_reply(), None);
        let response = server.get("/api/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok", "model": "gpt-4o" }));
    }

    #[tokio::test]
    async fn json_request_returns_attachment_with_usage() {
        let chat = fenced_reply();
        let server = test_server(chat.clone(), None);

        let response = server
            .post("/api/modify-template")
            .json(&json!({
                "template_content": DOC,
                "prompt": "bold the header",
                "api_key": "sk-test"
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), DOC);
        assert_eq!(response.header("x-prompt-tokens"), "1200");
        assert_eq!(response.header("x-completion-tokens"), "340");
        assert_eq!(response.header("x-total-tokens"), "1540");
        assert_eq!(response.header("content-type"), "application/xml");
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"template_modified.xml\""
        );
        assert_exposes_usage_headers(&response);
        assert_eq!(chat.calls(), 1);
    }

    fn assert_exposes_usage_headers(response: &axum_test::TestResponse) {
        let exposed = response
            .header("access-control-expose-headers")
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert_ne!(exposed, "*");
        for name in [
            "x-prompt-tokens",
            "x-completion-tokens",
            "x-total-tokens",
            "content-disposition",
        ] {
            assert!(exposed.contains(name), "{name} missing from {exposed}");
        }
    }

    #[tokio::test]
    async fn cross_origin_request_exposes_usage_headers() {
        let server = test_server(fenced_reply(), Some("sk-default"));

        let response = server
            .post("/api/modify-template")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://localhost:3000"),
            )
            .json(&json!({ "template_content": DOC, "prompt": "x" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("access-control-allow-origin"), "*");
        assert_exposes_usage_headers(&response);
    }

    #[tokio::test]
    async fn multipart_upload_derives_filename() {
        let server = test_server(fenced_reply(), Some("sk-default"));

        let form = MultipartForm::new()
            .add_part(
                "template_file",
                Part::bytes(DOC.as_bytes().to_vec()).file_name("invoice.fo.vm"),
            )
            .add_text("prompt", "add a GSTIN column");

        let response = server.post("/api/modify-template").multipart(form).await;

        response.assert_status_ok();
        assert_eq!(response.text(), DOC);
        assert_eq!(
            response.header("content-disposition"),
            "attachment; filename=\"invoice_modified.fo.vm\""
        );
        assert_eq!(response.header("content-type"), "application/octet-stream");
    }

    #[tokio::test]
    async fn bad_extension_is_rejected() {
        let chat = fenced_reply();
        let server = test_server(chat.clone(), Some("sk-default"));

        let form = MultipartForm::new()
            .add_part(
                "template_file",
                Part::bytes(DOC.as_bytes().to_vec()).file_name("notes.txt"),
            )
            .add_text("prompt", "anything");

        let response = server.post("/api/modify-template").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "error": "Invalid file type. Allowed types: .xml, .fo, .vm, .xsl, .xslt"
        }));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected() {
        let chat = fenced_reply();
        let server = test_server(chat.clone(), Some("sk-default"));

        let response = server
            .post("/api/modify-template")
            .json(&json!({ "template_content": DOC }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Prompt is required" }));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected() {
        let server = test_server(fenced_reply(), None);

        let response = server
            .post("/api/modify-template")
            .json(&json!({ "template_content": DOC, "prompt": "x" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "API key is required" }));
    }

    #[tokio::test]
    async fn upstream_failure_is_500() {
        let server = test_server(Arc::new(StaticChat::failing()), Some("sk-default"));

        let response = server
            .post("/api/modify-template")
            .json(&json!({ "template_content": DOC, "prompt": "x" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "Template modification failed" }));
    }

    #[test]
    fn multipart_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        assert!(is_multipart(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_multipart(&headers));
    }
}
