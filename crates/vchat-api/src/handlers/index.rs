//! Upload page and format listing.

use axum::response::Html;
use axum::Json;
use serde::Serialize;

use vchat_models::{VideoFormat, DEFAULT_MIME_TYPE};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Minimal upload form page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
pub struct FormatInfo {
    pub extension: &'static str,
    pub mime_type: &'static str,
}

#[derive(Serialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
    pub default_mime_type: &'static str,
}

/// List accepted video extensions and the MIME type each is uploaded as.
pub async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: VideoFormat::ALL
            .iter()
            .map(|f| FormatInfo {
                extension: f.extension(),
                mime_type: f.mime_type(),
            })
            .collect(),
        default_mime_type: DEFAULT_MIME_TYPE,
    })
}
