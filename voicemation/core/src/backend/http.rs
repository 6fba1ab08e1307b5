//! HTTP Generation Client
//!
//! Backend for the generation service's single endpoint.
//!
//! # Service API
//!
//! `POST {base}/generate_audio` accepts either
//! - JSON `{"text": ..., "inDepthMode": bool}` for typed prompts, or
//! - multipart with an `audio` file part and an `inDepthMode` text field
//!   (`"true"`/`"false"`) for recorded prompts.
//!
//! The JSON response carries the media URL as `video_url` or `videoUrl` and the
//! recognized prompt as `prompt` or `text`; both spellings are accepted. Media
//! URLs are relative to the base address.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::traits::{
    GenerationBackend, GenerationFailure, GenerationInput, GenerationPayload, GenerationSuccess,
};
use crate::messages::ArtifactId;

/// Default address of a locally running generation service
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";

/// Path of the generation endpoint
pub const GENERATE_PATH: &str = "/generate_audio";

/// Response body of the generation endpoint
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default, rename = "videoUrl")]
    video_url_camel: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl GenerateResponse {
    /// Media URL under either spelling
    fn media_url(&self) -> Option<&str> {
        non_empty(self.video_url.as_deref()).or_else(|| non_empty(self.video_url_camel.as_deref()))
    }

    /// Resolved source text under either spelling
    fn source_text(&self) -> Option<&str> {
        non_empty(self.prompt.as_deref()).or_else(|| non_empty(self.text.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// HTTP client for the generation service
#[derive(Clone, Debug)]
pub struct GenerationClient {
    /// Base address without trailing slash
    base_url: String,
    /// HTTP client (no request timeout)
    http_client: reqwest::Client,
}

impl GenerationClient {
    /// Create a client for the given base address
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create from the `VOICEMATION_BASE_URL` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("VOICEMATION_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Base address
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}{GENERATE_PATH}", self.base_url)
    }

    /// Resolve a media URL returned by the service against the base address
    ///
    /// Absolute URLs are kept as they are.
    #[must_use]
    pub fn resolve_media_url(&self, url: &str) -> String {
        if reqwest::Url::parse(url).is_ok() {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }

    /// Send the request for one input
    async fn post(&self, input: &GenerationInput) -> Result<reqwest::Response, GenerationFailure> {
        let request = self.http_client.post(self.generate_url());

        let request = match &input.payload {
            GenerationPayload::Text(text) => request.json(&serde_json::json!({
                "text": text,
                "inDepthMode": input.mode.in_depth(),
            })),
            GenerationPayload::Audio(clip) => {
                let part = reqwest::multipart::Part::bytes(clip.bytes.clone())
                    .file_name(clip.file_name.clone())
                    .mime_str(&clip.mime_type)
                    .map_err(|e| GenerationFailure::network(format!("Invalid audio upload: {e}")))?;
                let form = reqwest::multipart::Form::new()
                    .part("audio", part)
                    .text("inDepthMode", input.mode.in_depth().to_string());
                request.multipart(form)
            }
        };

        request
            .send()
            .await
            .map_err(|e| GenerationFailure::network(e.to_string()))
    }

    /// Turn a response into a success or a classified failure
    async fn classify(
        &self,
        response: reqwest::Response,
        input: &GenerationInput,
    ) -> Result<GenerationSuccess, GenerationFailure> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<GenerateResponse>(&body)
                .ok()
                .and_then(|r| r.error);
            return Err(GenerationFailure::http(status.as_u16(), detail.as_deref()));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            GenerationFailure::application(Some(&format!(
                "Invalid response from generation service: {e}"
            )))
        })?;

        match (body.success, body.media_url()) {
            (true, Some(url)) => {
                // Assigned at receipt, never by the service
                let artifact_id = ArtifactId::next();
                let source_text = body
                    .source_text()
                    .unwrap_or_else(|| input.fallback_source_text())
                    .to_string();
                Ok(GenerationSuccess {
                    artifact_id,
                    source_text,
                    media_url: self.resolve_media_url(url),
                })
            }
            _ => Err(GenerationFailure::application(body.error.as_deref())),
        }
    }

    /// Stream an artifact's media into a local file
    ///
    /// Returns the number of bytes written.
    pub async fn download_media(&self, url: &str, dest: &Path) -> anyhow::Result<u64> {
        let url = self.resolve_media_url(url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Media download returned {}", response.status());
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Media download interrupted")?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::info!(url = %url, path = %dest.display(), bytes = written, "Downloaded media");
        Ok(written)
    }
}

impl Default for GenerationClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl GenerationBackend for GenerationClient {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn submit(&self, input: GenerationInput) -> Result<GenerationSuccess, GenerationFailure> {
        let start = Instant::now();
        tracing::info!(
            kind = input.kind(),
            mode = %input.mode,
            url = %self.generate_url(),
            "Submitting generation request"
        );

        let response = self.post(&input).await?;
        let result = self.classify(response, &input).await;

        match &result {
            Ok(success) => tracing::info!(
                artifact_id = %success.artifact_id,
                url = %success.media_url,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Generation succeeded"
            ),
            Err(failure) => tracing::warn!(
                kind = ?failure.kind,
                error = %failure.message,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Generation failed"
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GenerationClient::new("http://localhost:5001/");
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.generate_url(), "http://localhost:5001/generate_audio");
    }

    #[test]
    fn test_resolve_media_url() {
        let client = GenerationClient::default();
        assert_eq!(
            client.resolve_media_url("/video/media/out.mp4"),
            "http://localhost:5001/video/media/out.mp4"
        );
        assert_eq!(
            client.resolve_media_url("out.mp4"),
            "http://localhost:5001/out.mp4"
        );
        assert_eq!(
            client.resolve_media_url("https://cdn.example.com/a.mp4"),
            "https://cdn.example.com/a.mp4"
        );
    }

    #[test]
    fn test_response_aliases() {
        let snake: GenerateResponse =
            serde_json::from_str(r#"{"success": true, "video_url": "/a.mp4", "prompt": "p"}"#)
                .unwrap();
        assert_eq!(snake.media_url(), Some("/a.mp4"));
        assert_eq!(snake.source_text(), Some("p"));

        let camel: GenerateResponse =
            serde_json::from_str(r#"{"success": true, "videoUrl": "/b.mp4", "text": "t"}"#)
                .unwrap();
        assert_eq!(camel.media_url(), Some("/b.mp4"));
        assert_eq!(camel.source_text(), Some("t"));

        let both: GenerateResponse = serde_json::from_str(
            r#"{"success": true, "video_url": "/c.mp4", "videoUrl": "/c.mp4", "prompt": "x", "text": "x"}"#,
        )
        .unwrap();
        assert_eq!(both.media_url(), Some("/c.mp4"));

        let empty: GenerateResponse =
            serde_json::from_str(r#"{"success": true, "video_url": "", "videoUrl": "/d.mp4"}"#)
                .unwrap();
        assert_eq!(empty.media_url(), Some("/d.mp4"));
        assert_eq!(empty.source_text(), None);
    }

    #[test]
    fn test_missing_success_defaults_to_false() {
        let body: GenerateResponse = serde_json::from_str(r#"{"error": "No text provided"}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("No text provided"));
    }
}
