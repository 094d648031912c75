//! Stub OCR service and fake host shared by the unit tests

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::{ServiceConfig, ServiceEndpoint};
use crate::error::LaunchError;
use crate::host::{LaunchOptions, PluginHost, ProcessHandle};
use crate::platform::OsType;

/// Serves `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> ServiceEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ServiceEndpoint::new("127.0.0.1", port)
}

/// A port nothing listens on (until someone binds it).
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Fast timeouts so failure paths finish quickly.
pub fn fast_config(port: u16) -> ServiceConfig {
    ServiceConfig::default()
        .with_port(port)
        .with_startup_timeout(Duration::from_millis(600))
        .with_probe_timeouts(Duration::from_millis(200), Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(100))
        .with_request_timeout(Duration::from_secs(5))
}

#[derive(Debug, Clone)]
pub struct RecordedLaunch {
    pub command: String,
    pub args: Vec<String>,
    pub options: LaunchOptions,
}

pub enum LaunchBehavior {
    /// Pretend the process started, but nothing ever listens
    Silent,
    /// Fail like a missing interpreter
    Fail,
    /// Start serving `app` on `port` after `delay`
    Serve {
        port: u16,
        delay: Duration,
        app: fn() -> Router,
    },
}

pub struct FakeHost {
    pub os_type: OsType,
    pub plugin_dir: PathBuf,
    pub behavior: LaunchBehavior,
    pub config: ServiceConfig,
    pub launches: Mutex<Vec<RecordedLaunch>>,
}

impl FakeHost {
    pub fn new(behavior: LaunchBehavior) -> Self {
        Self {
            os_type: OsType::Linux,
            plugin_dir: PathBuf::from("/plugins/ocr"),
            behavior,
            config: ServiceConfig::default(),
            launches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_os(mut self, os_type: OsType) -> Self {
        self.os_type = os_type;
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn launches(&self) -> Vec<RecordedLaunch> {
        self.launches.lock().unwrap().clone()
    }
}

impl PluginHost for FakeHost {
    fn plugin_dir(&self) -> PathBuf {
        self.plugin_dir.clone()
    }

    fn cache_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn os_type(&self) -> OsType {
        self.os_type
    }

    fn service_config(&self) -> ServiceConfig {
        self.config.clone()
    }

    fn run(
        &self,
        command: &str,
        args: &[String],
        options: &LaunchOptions,
    ) -> Result<ProcessHandle, LaunchError> {
        self.launches.lock().unwrap().push(RecordedLaunch {
            command: command.to_string(),
            args: args.to_vec(),
            options: options.clone(),
        });

        match &self.behavior {
            LaunchBehavior::Silent => {}
            LaunchBehavior::Fail => {
                return Err(LaunchError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", command),
                )))
            }
            LaunchBehavior::Serve { port, delay, app } => {
                let (port, delay, app) = (*port, *delay, app());
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
                    axum::serve(listener, app).await.unwrap();
                });
            }
        }

        Ok(ProcessHandle { pid: 4242 })
    }
}
