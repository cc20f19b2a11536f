//! Gemini REST client implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use vchat_models::{AssetName, RemoteVideoAsset};

use crate::config::{GeminiConfig, GenerationSettings, GENERATION_SETTINGS};
use crate::error::{GeminiError, GeminiResult};
use crate::service::VideoModelService;
use crate::types::{
    ApiErrorEnvelope, Content, CreateFileRequest, FileMetadata, FileResource, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, Part, UploadFileResponse,
};

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    settings: GenerationSettings,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GeminiError::config_error(e.to_string()))?;

        Ok(Self {
            config,
            settings: GENERATION_SETTINGS,
            client,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn key(&self) -> [(&'static str, &str); 1] {
        [("key", self.config.api_key.as_str())]
    }

    /// Start a resumable upload session and return the session URL.
    async fn start_upload(
        &self,
        size: u64,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<String> {
        let request = CreateFileRequest {
            file: FileMetadata {
                display_name: display_name.to_string(),
            },
        };

        let response = self
            .client
            .post(self.url("upload/v1beta/files"))
            .query(&self.key())
            .timeout(self.config.request_timeout)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&request)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let response = ensure_success(response).await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GeminiError::upload_failed("Upload session URL missing from response"))
    }
}

#[async_trait]
impl VideoModelService for GeminiClient {
    async fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<RemoteVideoAsset> {
        let size = tokio::fs::metadata(path).await?.len();
        debug!("Uploading {} ({} bytes, {})", path.display(), size, mime_type);

        let upload_url = self.start_upload(size, mime_type, display_name).await?;

        let file = tokio::fs::File::open(path).await?;
        let body = Body::wrap_stream(ReaderStream::new(file));

        let response = self
            .client
            .post(&upload_url)
            .timeout(self.config.upload_timeout)
            .header(CONTENT_LENGTH, size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(body)
            .send()
            .await
            .map_err(|e| match GeminiError::from_reqwest(e) {
                GeminiError::RequestFailed(msg) => GeminiError::upload_failed(msg),
                other => other,
            })?;

        let response = ensure_success(response).await?;
        let uploaded: UploadFileResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::invalid_response(format!("Failed to parse upload response: {}", e)))?;

        let asset = uploaded.file.into_asset();
        info!(asset = %asset.name, state = %asset.state, "Uploaded {}", display_name);
        Ok(asset)
    }

    async fn get_file(&self, name: &AssetName) -> GeminiResult<RemoteVideoAsset> {
        let response = self
            .client
            .get(self.url(&format!("v1beta/{}", name)))
            .query(&self.key())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let response = ensure_success(response).await?;
        let file: FileResource = response
            .json()
            .await
            .map_err(|e| GeminiError::invalid_response(format!("Failed to parse file status: {}", e)))?;

        Ok(file.into_asset())
    }

    async fn generate(
        &self,
        asset: &RemoteVideoAsset,
        prompt: &str,
        timeout: Duration,
    ) -> GeminiResult<Option<String>> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::file(asset), Part::text(prompt)],
            }],
            generation_config: GenerationConfig {
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.url(&format!("v1beta/models/{}:generateContent", self.settings.model)))
            .query(&self.key())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        let response = ensure_success(response).await?;
        let generated: GenerateContentResponse = response.json().await.map_err(|e| {
            GeminiError::invalid_response(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = generated.text();
        if text.is_none() {
            let block_reason = generated
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            let finish_reason = generated
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref());
            warn!(
                asset = %asset.name,
                block_reason = ?block_reason,
                finish_reason = ?finish_reason,
                "No text in Gemini response"
            );
        }
        Ok(text)
    }

    async fn delete(&self, name: &AssetName) -> GeminiResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("v1beta/{}", name)))
            .query(&self.key())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(GeminiError::from_reqwest)?;

        ensure_success(response).await?;
        info!(asset = %name, "Deleted remote file");
        Ok(())
    }
}

/// Turn a non-2xx response into `GeminiError::Api`, preferring the message
/// from Google's error envelope.
async fn ensure_success(response: Response) -> GeminiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(GeminiError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use vchat_models::AssetState;
    use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        let config = GeminiConfig::new("test-key").with_base_url(server.uri());
        GeminiClient::new(config).unwrap()
    }

    fn active_asset() -> RemoteVideoAsset {
        RemoteVideoAsset {
            name: AssetName::new("files/abc123"),
            uri: "https://example.test/v1beta/files/abc123".to_string(),
            mime_type: "video/quicktime".to_string(),
            state: AssetState::Active,
            display_name: Some("clip.mov".to_string()),
            size_bytes: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_resumable_upload() {
        let server = MockServer::start().await;
        let session_url = format!("{}/upload/session/xyz", server.uri());

        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .and(query_param("key", "test-key"))
            .and(header("X-Goog-Upload-Protocol", "resumable"))
            .and(header("X-Goog-Upload-Command", "start"))
            .and(header("X-Goog-Upload-Header-Content-Type", "video/quicktime"))
            .and(header("X-Goog-Upload-Header-Content-Length", "5"))
            .and(body_partial_json(serde_json::json!({"file": {"displayName": "clip.mov"}})))
            .respond_with(ResponseTemplate::new(200).insert_header(UPLOAD_URL_HEADER, session_url.as_str()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload/session/xyz"))
            .and(headers("X-Goog-Upload-Command", vec!["upload", "finalize"]))
            .and(header("X-Goog-Upload-Offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "file": {
                    "name": "files/abc123",
                    "displayName": "clip.mov",
                    "mimeType": "video/quicktime",
                    "uri": "https://example.test/v1beta/files/abc123",
                    "state": "PROCESSING"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"video").unwrap();

        let asset = client_for(&server)
            .upload(file.path(), "video/quicktime", "clip.mov")
            .await
            .unwrap();

        assert_eq!(asset.name.as_str(), "files/abc123");
        assert_eq!(asset.state, AssetState::Processing);
    }

    #[tokio::test]
    async fn test_slow_upload_uses_upload_timeout() {
        let server = MockServer::start().await;
        let session_url = format!("{}/upload/session/slow", server.uri());

        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(200).insert_header(UPLOAD_URL_HEADER, session_url.as_str()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload/session/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(400))
                    .set_body_json(serde_json::json!({
                        "file": {
                            "name": "files/slow",
                            "mimeType": "video/mp4",
                            "uri": "https://example.test/v1beta/files/slow",
                            "state": "PROCESSING"
                        }
                    })),
            )
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"video").unwrap();

        let mut config = GeminiConfig::new("test-key").with_base_url(server.uri());
        config.request_timeout = Duration::from_millis(100);
        config.upload_timeout = Duration::from_secs(5);
        let client = GeminiClient::new(config.clone()).unwrap();

        let asset = client.upload(file.path(), "video/mp4", "clip.mp4").await.unwrap();
        assert_eq!(asset.name.as_str(), "files/slow");

        config.upload_timeout = Duration::from_millis(100);
        let err = GeminiClient::new(config)
            .unwrap()
            .upload(file.path(), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Timeout));
    }

    #[tokio::test]
    async fn test_upload_without_session_url_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"video").unwrap();

        let err = client_for(&server)
            .upload(file.path(), "video/mp4", "clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_get_file_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/abc123"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "files/abc123",
                "mimeType": "video/quicktime",
                "uri": "https://example.test/v1beta/files/abc123",
                "state": "ACTIVE"
            })))
            .mount(&server)
            .await;

        let asset = client_for(&server)
            .get_file(&AssetName::new("files/abc123"))
            .await
            .unwrap();
        assert_eq!(asset.state, AssetState::Active);
    }

    #[tokio::test]
    async fn test_generate_sends_file_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"fileData": {"mimeType": "video/quicktime", "fileUri": "https://example.test/v1beta/files/abc123"}},
                        {"text": "Describe this video"}
                    ]
                }],
                "generationConfig": {"maxOutputTokens": 1500}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "A cat plays piano."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate(&active_asset(), "Describe this video", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("A cat plays piano."));
    }

    #[tokio::test]
    async fn test_generate_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate(&active_asset(), "Describe this video", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Timeout));
    }

    #[tokio::test]
    async fn test_api_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/files/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "File files/gone not found.", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete(&AssetName::new("files/gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Api { status: 404, .. }));
        assert_eq!(err.to_string(), "Gemini API returned 404: File files/gone not found.");
    }

    #[tokio::test]
    async fn test_delete_file() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/files/abc123"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete(&AssetName::new("files/abc123"))
            .await
            .unwrap();
    }
}
