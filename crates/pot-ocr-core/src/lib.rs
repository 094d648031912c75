//! pot-ocr Core - local OCR service supervision and recognition
//!
//! This crate keeps a local OCR HTTP service available and talks to it.
//! It is host-independent: process creation and plugin paths come from a
//! [`host::PluginHost`] (the CLI's `SystemHost`, a plugin runtime, or a test
//! double).

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod host;
pub mod platform;
pub mod probe;
pub mod supervisor;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::OcrClient;
pub use config::{ServiceConfig, ServiceEndpoint};
pub use error::{ErrorKind, LaunchError, RecognitionError, Result, SupervisorError};
pub use extract::extract_text;
pub use host::{LaunchOptions, PluginHost, ProcessHandle, StdioMode, SystemHost};
pub use platform::OsType;
pub use probe::{HealthProbe, ProbeOutcome};
pub use supervisor::{Readiness, ServiceSupervisor};
pub use types::{RecognitionResult, ResultStatus, SupportedLanguages, TextLine};

/// Plugin entry point: recognize `image_base64` using the host's service
/// configuration.
pub async fn recognize(image_base64: &str, language: &str, host: &dyn PluginHost) -> Result<String> {
    OcrClient::new(host.service_config())
        .recognize(image_base64, language, host)
        .await
}
