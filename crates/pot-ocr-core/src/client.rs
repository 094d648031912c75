//! Recognition client for the local OCR service

use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::error::{ErrorKind, Result};
use crate::extract::extract_text;
use crate::host::PluginHost;
use crate::probe::local_client;
use crate::supervisor::ServiceSupervisor;
use crate::types::{
    ErrorBody, RecognitionRequest, RecognitionResult, ResultStatus, SupportedLanguages,
};

/// Talks to the OCR service, starting it first when it is not up.
///
/// One supervised attempt per call; there are no retries.
pub struct OcrClient {
    supervisor: ServiceSupervisor,
    client: reqwest::Client,
}

impl OcrClient {
    pub fn new(config: ServiceConfig) -> Self {
        let client = local_client();
        Self {
            supervisor: ServiceSupervisor::with_client(config, client.clone()),
            client,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        self.supervisor.config()
    }

    pub fn supervisor(&self) -> &ServiceSupervisor {
        &self.supervisor
    }

    /// Recognize a base64-encoded image and return its text, one line per
    /// detected text line.
    pub async fn recognize(
        &self,
        image_base64: &str,
        language: &str,
        host: &dyn PluginHost,
    ) -> Result<String> {
        if image_base64.trim().is_empty() {
            return Err(ErrorKind::InvalidRequest("image data is empty".to_string()).into());
        }

        self.supervisor.ensure_running(host).await?;

        let url = self.config().endpoint().ocr_url();
        tracing::debug!("Sending OCR request to {} (language: {})", url, language);

        let response = self
            .client
            .post(&url)
            .timeout(self.config().request_timeout())
            .json(&RecognitionRequest {
                image: image_base64,
                language,
            })
            .send()
            .await?;

        let result: RecognitionResult = decode_json(check_status(response).await?).await?;

        if result.status != Some(ResultStatus::Success) {
            let message = result
                .error
                .unwrap_or_else(|| "OCR processing failed".to_string());
            return Err(ErrorKind::Processing(message).into());
        }

        let text = extract_text(&result.data);
        tracing::info!(
            "OCR finished: {} lines, {} chars",
            result.data.len(),
            text.chars().count()
        );
        Ok(text)
    }

    /// Languages the service accepts, from `GET /languages`.
    pub async fn supported_languages(&self, host: &dyn PluginHost) -> Result<SupportedLanguages> {
        self.supervisor.ensure_running(host).await?;

        let response = self
            .client
            .get(self.config().endpoint().languages_url())
            .timeout(self.config().request_timeout())
            .send()
            .await?;

        decode_json(check_status(response).await?).await
    }
}

/// Reading the body is transport; a body that is not the expected JSON is
/// `ErrorKind::InvalidResponse`.
async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Passes success responses through; turns anything else into `ErrorKind::Http`.
async fn check_status(response: reqwest::Response) -> std::result::Result<reqwest::Response, ErrorKind> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| "Unknown error".to_string());

    Err(ErrorKind::Http {
        status: status.as_u16(),
        message,
    })
}
