//! Host environment abstraction
//!
//! The plugin host owns process creation and knows where the plugin's files
//! live. `PluginHost` is the seam the supervisor talks to:
//! - CLI: `SystemHost` spawns through `std::process::Command`
//! - Tests: a fake host records launches without spawning anything

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ServiceConfig;
use crate::error::LaunchError;
use crate::platform::OsType;

/// What happens to a launched process's stdout/stderr
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdioMode {
    Ignore,
    AppendTo(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run outside the caller's process group so it outlives the caller
    pub detached: bool,
    pub stdio: StdioMode,
}

impl LaunchOptions {
    /// Detached with output discarded
    pub fn background() -> Self {
        Self {
            detached: true,
            stdio: StdioMode::Ignore,
        }
    }
}

/// Opaque handle to a launched process. Nothing keeps it for termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
}

/// Capabilities the core needs from whoever embeds it
pub trait PluginHost: Send + Sync {
    /// Directory holding the bundled service script
    fn plugin_dir(&self) -> PathBuf;

    /// Scratch directory owned by the plugin
    fn cache_dir(&self) -> PathBuf;

    fn os_type(&self) -> OsType;

    /// Service settings used by the top-level `recognize` entry point
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default()
    }

    /// Start `command` with `args`, returning once the process exists
    fn run(
        &self,
        command: &str,
        args: &[String],
        options: &LaunchOptions,
    ) -> Result<ProcessHandle, LaunchError>;
}

/// Host backed by the real OS
#[derive(Debug, Clone)]
pub struct SystemHost {
    plugin_dir: PathBuf,
    cache_dir: PathBuf,
    os_type: OsType,
    config: ServiceConfig,
}

impl SystemHost {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("pot-ocr");

        Self {
            plugin_dir: plugin_dir.into(),
            cache_dir,
            os_type: OsType::current(),
            config: ServiceConfig::default(),
        }
    }

    pub fn with_service_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = dir;
        self
    }
}

impl PluginHost for SystemHost {
    fn plugin_dir(&self) -> PathBuf {
        self.plugin_dir.clone()
    }

    fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
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
        let mut cmd = Command::new(command);
        cmd.args(args).stdin(Stdio::null());

        match &options.stdio {
            StdioMode::Ignore => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
            StdioMode::AppendTo(path) => {
                let log_file = open_service_log(path)?;
                cmd.stdout(Stdio::from(log_file.try_clone()?))
                    .stderr(Stdio::from(log_file));
            }
        }

        if options.detached {
            detach(&mut cmd);
        }

        // The child is dropped here without being killed or waited on.
        let child = cmd.spawn()?;
        Ok(ProcessHandle { pid: child.id() })
    }
}

fn open_service_log(path: &Path) -> Result<std::fs::File, LaunchError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "\n--- OCR service start ---")?;
    Ok(file)
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}
