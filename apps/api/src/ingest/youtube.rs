//! Client for the external YouTube transcription extraction service.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::retry_after_from_headers;
use crate::models::log_entry::{lenient_partials, PartialLogEntry};

const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("YouTube extraction endpoint is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Extraction service error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u32 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionRequest<'a> {
    youtube_url: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YoutubeExtraction {
    pub transcription: String,
    pub summary: String,
    pub video_title: Option<String>,
    pub video_id: Option<String>,
    #[serde(deserialize_with = "lenient_partials")]
    pub logs: Vec<PartialLogEntry>,
}

#[derive(Clone)]
pub struct YoutubeClient {
    client: Client,
    endpoint: Option<String>,
}

impl YoutubeClient {
    pub fn new(endpoint: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self { client, endpoint }
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn extract(&self, youtube_url: &str) -> Result<YoutubeExtraction, ExtractionError> {
        let endpoint = self.endpoint.as_deref().ok_or(ExtractionError::NotConfigured)?;

        let response = self
            .client
            .post(endpoint)
            .json(&ExtractionRequest { youtube_url })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = retry_after_from_headers(response.headers());
            warn!(retry_after, "YouTube extraction rate limited");
            return Err(ExtractionError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let extraction: YoutubeExtraction = response.json().await?;
        info!(
            records = extraction.logs.len(),
            transcript_chars = extraction.transcription.len(),
            "YouTube extraction complete"
        );
        Ok(extraction)
    }
}

/// Video id from a watch, shorts, embed, live or youtu.be URL.
pub fn parse_youtube_video_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(host);

    let id = match host {
        "youtu.be" => url.path_segments()?.next()?.to_string(),
        "youtube.com" | "music.youtube.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())?,
                "shorts" | "embed" | "live" => segments.next()?.to_string(),
                _ => return None,
            }
        }
        _ => return None,
    };

    is_video_id(&id).then_some(id)
}

fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_url() {
        assert_eq!(
            parse_youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(
            parse_youtube_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            parse_youtube_video_id("https://m.youtube.com/shorts/a1B2c3D4e5_").as_deref(),
            Some("a1B2c3D4e5_")
        );
    }

    #[test]
    fn test_rejects_other_urls() {
        assert!(parse_youtube_video_id("https://vimeo.com/123456").is_none());
        assert!(parse_youtube_video_id("https://www.youtube.com/watch?v=short").is_none());
        assert!(parse_youtube_video_id("https://www.youtube.com/channel/UCabcdefghij").is_none());
        assert!(parse_youtube_video_id("not a url").is_none());
    }

    #[test]
    fn test_fractional_retry_after_rounds_up() {
        use crate::llm_client::DEFAULT_RETRY_AFTER_SECS;
        use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_from_headers(&headers), DEFAULT_RETRY_AFTER_SECS);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2.5"));
        assert_eq!(retry_after_from_headers(&headers), 3);
    }

    #[test]
    fn test_extraction_keeps_valid_records() {
        let extraction: YoutubeExtraction = serde_json::from_str(
            r#"{"transcription": "t", "videoId": "dQw4w9WgXcQ",
                "logs": [{"id": 1, "timestamp": "2024-05-08 09:30"}, "x"]}"#,
        )
        .unwrap();
        assert_eq!(extraction.logs.len(), 1);
        assert_eq!(extraction.logs[0].id.as_deref(), Some("1"));
        assert!(extraction.logs[0].timestamp.is_some());
        assert!(extraction.summary.is_empty());
    }

    #[tokio::test]
    async fn test_extract_without_endpoint_fails() {
        let client = YoutubeClient::new(None);
        let err = client
            .extract("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotConfigured));
    }
}
