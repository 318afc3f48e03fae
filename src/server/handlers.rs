//! Request handlers.
//!
//! JSON bodies are taken as raw bytes and parsed here, so a malformed body
//! is reported through the error envelope like any other validation error.

use super::AppState;
use super::envelope::{ApiResult, success};
use crate::documents::DocumentId;
use crate::error::DocfillError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    document: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateBody {
    tag: Option<String>,
    prompt: Option<String>,
    example_limit: Option<usize>,
    document: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TestBody {
    tag: Option<String>,
    document: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderBody {
    document: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PdfBody {
    html: Option<String>,
}

/// Parse a JSON body; an empty body yields the default value.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, DocfillError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| DocfillError::Validation(format!("invalid JSON body: {}", e)))
}

/// Treat empty strings as absent.
fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn root() -> Json<Value> {
    success(json!({
        "message": "docfill running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let mut multipart = multipart
        .map_err(|e| DocfillError::Validation(format!("expected a multipart form: {}", e)))?;

    let mut html = None;
    let mut xml = None;
    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DocfillError::Validation(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DocfillError::Validation(format!("failed to read field '{}': {}", name, e)))?;
        match name.as_str() {
            "html" => html = Some(bytes),
            "xml" => xml = Some(bytes),
            "document" => document = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    let (Some(html), Some(xml)) = (html, xml) else {
        return Err(DocfillError::Validation(
            "Both html and xml files required (fields: html, xml).".to_string(),
        )
        .into());
    };
    let document = DocumentId::or_default(document.as_deref())?;
    let stored = state.service.upload(&document, &html, &xml)?;

    Ok(success(json!({
        "document": stored.document,
        "html_path": stored.html_path.display().to_string(),
        "xml_path": stored.xml_path.display().to_string(),
    })))
}

pub async fn tags(
    State(state): State<AppState>,
    query: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query
        .map_err(|e| DocfillError::Validation(format!("invalid query: {}", e.body_text())))?;
    let document = DocumentId::or_default(query.document.as_deref())?;
    let placeholders = state.service.tags(&document)?;
    Ok(success(json!({ "placeholders": placeholders })))
}

pub async fn list_rules(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let rules = state.service.list_rules()?;
    Ok(success(json!({ "rules": rules })))
}

pub async fn remove_rule(
    State(state): State<AppState>,
    tag: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(tag) = tag
        .map_err(|e| DocfillError::Validation(format!("invalid rule tag: {}", e.body_text())))?;
    let path = state.service.remove_rule(&tag)?;
    Ok(success(json!({
        "tag": tag,
        "removed": path.display().to_string(),
    })))
}

pub async fn generate_rule(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body: GenerateBody = parse_body(&body)?;
    let (Some(tag), Some(prompt)) = (required(body.tag), required(body.prompt)) else {
        return Err(DocfillError::Validation("tag and prompt are required".to_string()).into());
    };
    let document = DocumentId::or_default(body.document.as_deref())?;

    let rule = state
        .service
        .generate_rule(&document, &tag, &prompt, body.example_limit)
        .await?;

    Ok(success(json!({
        "tag": rule.tag,
        "rule_file": rule.path.display().to_string(),
        "generated_code": rule.code,
    })))
}

pub async fn test_rule(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body: TestBody = parse_body(&body)?;
    let Some(tag) = required(body.tag) else {
        return Err(DocfillError::Validation("tag required".to_string()).into());
    };
    let document = DocumentId::or_default(body.document.as_deref())?;

    let value = state.service.test_rule(&document, &tag).await?;
    Ok(success(json!({ "tag": tag, "value": value })))
}

pub async fn render_document(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body: RenderBody = parse_body(&body)?;
    let document = DocumentId::or_default(body.document.as_deref())?;

    let result = state.service.render(&document).await?;
    Ok(success(json!({
        "html": result.html,
        "placeholders": result.placeholders,
    })))
}

pub async fn document_pdf(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let body: PdfBody = parse_body(&body)?;
    let Some(html) = required(body.html) else {
        return Err(DocfillError::Validation("html required in body".to_string()).into());
    };

    let pdf = state.service.export_pdf(&html).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"document.pdf\"",
            ),
        ],
        pdf,
    )
        .into_response())
}
