use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::domain::config::ServiceConfig;
use crate::domain::DomainError;
use crate::ports::{ResultHandle, SubmitRequest, TransformService};

/// Success body of the submit endpoint.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    filename: String,
}

/// HTTP client for the remote transformation service.
///
/// Wire format: submit is a multipart POST with fields `file` and `prompt`;
/// the result is fetched as raw bytes by the handle the service returned.
pub struct HttpTransformService {
    client: Client,
    base_url: Url,
}

impl HttpTransformService {
    pub fn new(config: &ServiceConfig) -> Result<Self, DomainError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DomainError::Config(format!("Invalid service base URL: {}", e)))?;

        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("Retune/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DomainError::HttpRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn submit_url(&self) -> Result<Url, DomainError> {
        self.base_url
            .join("/process-wav/")
            .map_err(|e| DomainError::Config(e.to_string()))
    }

    fn download_url(&self, handle: &ResultHandle) -> Result<Url, DomainError> {
        self.base_url
            .join(&format!("/download/{}", handle.as_str()))
            .map_err(|e| DomainError::Config(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TransformService for HttpTransformService {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<ResultHandle, DomainError> {
        let url = self.submit_url()?;

        let file_part = Part::bytes(request.payload.to_vec())
            .file_name(request.file_name.to_string())
            .mime_str(request.mime_type)
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;
        let form = Form::new()
            .part("file", file_part)
            .text("prompt", request.prompt.to_string());

        info!(
            url = %url,
            file = %request.file_name,
            payload_bytes = request.payload.len(),
            "submitting transformation"
        );

        let response = self
            .client
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Service(format!("HTTP {} for {}", status, url)));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Service(format!("Malformed submit response: {}", e)))?;

        debug!(filename = %body.filename, "submission accepted");
        Ok(ResultHandle::new(body.filename))
    }

    async fn fetch_result(&self, handle: &ResultHandle) -> Result<Vec<u8>, DomainError> {
        let url = self.download_url(handle)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DomainError::HttpRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Service(format!("HTTP {} for {}", status, url)));
        }

        let expected = response.content_length().unwrap_or(0);
        let mut bytes = Vec::with_capacity(expected as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DomainError::HttpRequest(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }

        info!(url = %url, size_bytes = bytes.len(), "result downloaded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> HttpTransformService {
        HttpTransformService::new(&ServiceConfig {
            base_url: base_url.to_string(),
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_urls() {
        let service = service("http://localhost:8000");
        assert_eq!(
            service.submit_url().unwrap().as_str(),
            "http://localhost:8000/process-wav/"
        );
        assert_eq!(
            service
                .download_url(&ResultHandle::new("out_42.wav"))
                .unwrap()
                .as_str(),
            "http://localhost:8000/download/out_42.wav"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = HttpTransformService::new(&ServiceConfig {
            base_url: "not a url".to_string(),
            ..ServiceConfig::default()
        });
        assert!(matches!(result, Err(DomainError::Config(_))));
    }
}
