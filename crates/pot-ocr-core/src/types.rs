//! Wire types of the local OCR service

use serde::{Deserialize, Serialize};

/// Body of `POST /ocr`
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionRequest<'a> {
    /// Base64-encoded image bytes
    pub image: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Error,
    /// Any status string this client does not know
    #[serde(other)]
    Unknown,
}

/// Response of `POST /ocr`
#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResult {
    /// Absent when the service omits it; only `Success` counts as success
    #[serde(default)]
    pub status: Option<ResultStatus>,
    #[serde(default)]
    pub data: Vec<TextLine>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One recognized line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Corner points of the detected text box
    #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<[f64; 2]>>,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Response of `GET /languages`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedLanguages {
    pub languages: Vec<String>,
    pub default: String,
}

/// Error body the service sends with non-success statuses
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
