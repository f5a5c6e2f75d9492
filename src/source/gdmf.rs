//! Client for the paginated asset query service
//!
//! Requests are JSON bodies POSTed to the service. The answer is a signed
//! token whose payload segment carries `PostingDate` and `Assets`; the
//! signature is not checked.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::{debug, warn};

use super::SourceError;
use super::request::AssetRequest;
use super::traits::{QueryResponse, QuerySource};
use crate::package::RawRecord;

#[derive(Debug, Deserialize)]
struct TokenPayload {
    #[serde(rename = "PostingDate")]
    posting_date: Option<String>,
    #[serde(rename = "Assets", default)]
    assets: Vec<RawRecord>,
}

pub struct GdmfSource {
    client: reqwest::Client,
    url: String,
}

impl GdmfSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("ota-catalog")
                .timeout(timeout)
                .build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl QuerySource for GdmfSource {
    async fn query(&self, request: &AssetRequest) -> Result<QueryResponse, SourceError> {
        let body = request.to_json().to_string();

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Content-type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Query service returned status {} for build {} ({})",
                status, request.build, request.audience
            );
            return Err(SourceError::Status(status.as_u16()));
        }

        let token = response.text().await?;
        let payload = decode_token(&token)?;
        debug!(
            "Build {} / audience {}: {} assets",
            request.build,
            request.audience,
            payload.assets.len()
        );

        Ok(QueryResponse {
            posting_date: payload.posting_date,
            assets: payload.assets,
        })
    }
}

fn decode_token(token: &str) -> Result<TokenPayload, SourceError> {
    let segment = token
        .trim()
        .split('.')
        .nth(1)
        .ok_or_else(|| SourceError::InvalidResponse("response is not a token".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| {
            warn!("Failed to decode token payload: {}", e);
            SourceError::InvalidResponse(e.to_string())
        })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("Failed to parse token payload: {}", e);
        SourceError::InvalidResponse(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::request::RequestKind;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn token(payload: serde_json::Value) -> String {
        format!(
            "eyJhbGciOiJub25lIn0.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    fn request() -> AssetRequest {
        AssetRequest {
            audience: "01c1d682-6e8f-4908-b724-5501fe3f5e5c".to_string(),
            asset_type: "com.apple.MobileAsset.SoftwareUpdate".to_string(),
            build: "20A362".to_string(),
            version: "16.0".to_string(),
            device: "iPhone14,2".to_string(),
            model: Some("D63AP".to_string()),
            requested_version: None,
            supervised: false,
            kind: RequestKind::Standard,
        }
    }

    #[tokio::test]
    async fn query_decodes_token_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/assets")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "AssetAudience": "01c1d682-6e8f-4908-b724-5501fe3f5e5c",
                "Build": "20A362"
            })))
            .with_status(200)
            .with_body(token(json!({
                "PostingDate": "2022-09-12",
                "Assets": [{ "Build": "20A362", "OSVersion": "16.0" }]
            })))
            .create_async()
            .await;

        let source =
            GdmfSource::new(&format!("{}/v2/assets", server.url()), Duration::from_secs(5))
                .unwrap();
        let response = source.query(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.posting_date.as_deref(), Some("2022-09-12"));
        assert_eq!(response.assets.len(), 1);
        assert_eq!(response.assets[0]["Build"], "20A362");
    }

    #[tokio::test]
    async fn query_without_assets_returns_empty() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/assets")
            .with_status(200)
            .with_body(token(json!({})))
            .create_async()
            .await;

        let source =
            GdmfSource::new(&format!("{}/v2/assets", server.url()), Duration::from_secs(5))
                .unwrap();
        let response = source.query(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response, QueryResponse::default());
    }

    #[tokio::test]
    async fn query_reports_http_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/assets")
            .with_status(500)
            .create_async()
            .await;

        let source =
            GdmfSource::new(&format!("{}/v2/assets", server.url()), Duration::from_secs(5))
                .unwrap();
        let result = source.query(&request()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::Status(500))));
    }

    #[test]
    fn decode_token_rejects_plain_text() {
        assert!(matches!(
            decode_token("not a token"),
            Err(SourceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn decode_token_accepts_padded_payload() {
        let payload = format!(
            "x.{}==.y",
            URL_SAFE_NO_PAD.encode(json!({ "PostingDate": "2023-01-23" }).to_string())
        );
        assert_eq!(
            decode_token(&payload).unwrap().posting_date.as_deref(),
            Some("2023-01-23")
        );
    }
}
