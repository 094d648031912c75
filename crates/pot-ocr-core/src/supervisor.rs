//! OCR service lifecycle supervision
//!
//! `ensure_running` walks a small state machine:
//!
//! ```text
//! Probing ─reachable──────────────────────────────▶ Running
//!    │
//!    └─unreachable─▶ Launching ─▶ WaitingReady ─ok─▶ Running
//!                        │              └─budget──▶ TimedOut
//!                        └─spawn error─▶ failed
//! ```
//!
//! The launched process is never tracked or stopped; it is meant to outlive
//! the call and serve later requests.
//!
//! Tasks sharing one `ServiceSupervisor` launch at most once: whoever holds
//! the launch guard spawns, the others only wait for readiness. Separate
//! processes can still each launch a service; the later one fails to bind
//! the port and exits.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::ServiceConfig;
use crate::error::SupervisorError;
use crate::host::{LaunchOptions, PluginHost, ProcessHandle, StdioMode};
use crate::probe::{local_client, HealthProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SupervisorState {
    Probing,
    Running,
    Launching,
    WaitingReady,
    TimedOut,
}

/// How the service came to be ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The first probe succeeded; nothing was launched
    AlreadyRunning,
    /// This call launched the service and saw it become healthy
    Launched {
        handle: ProcessHandle,
        waited: Duration,
    },
    /// Another task sharing this supervisor was launching; this call waited
    AwaitedLaunch { waited: Duration },
}

pub struct ServiceSupervisor {
    config: ServiceConfig,
    probe: HealthProbe,
    launch_guard: Mutex<()>,
}

impl ServiceSupervisor {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_client(config, local_client())
    }

    pub fn with_client(config: ServiceConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            probe: HealthProbe::new(client),
            launch_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn probe(&self) -> &HealthProbe {
        &self.probe
    }

    /// Make sure the service answers `/health`, launching it through `host`
    /// if needed.
    pub async fn ensure_running(
        &self,
        host: &dyn PluginHost,
    ) -> Result<Readiness, SupervisorError> {
        let endpoint = self.config.endpoint();

        transition(SupervisorState::Probing);
        if self
            .probe
            .probe(&endpoint, self.config.initial_probe_timeout())
            .await
            .is_reachable()
        {
            transition(SupervisorState::Running);
            return Ok(Readiness::AlreadyRunning);
        }

        // Held until readiness is settled so concurrent callers don't respawn.
        let guard = self.launch_guard.try_lock().ok();
        let handle = if guard.is_some() {
            transition(SupervisorState::Launching);
            Some(self.launch(host)?)
        } else {
            tracing::info!("OCR service launch already in progress; waiting for it");
            None
        };

        transition(SupervisorState::WaitingReady);
        let waited = match self.wait_until_ready().await {
            Ok(waited) => waited,
            Err(e) => {
                transition(SupervisorState::TimedOut);
                tracing::warn!("OCR service not ready on {}: {}", endpoint.base_url(), e);
                return Err(e);
            }
        };
        drop(guard);

        transition(SupervisorState::Running);
        tracing::info!(
            "OCR service ready on {} after {}ms",
            endpoint.base_url(),
            waited.as_millis()
        );

        Ok(match handle {
            Some(handle) => Readiness::Launched { handle, waited },
            None => Readiness::AwaitedLaunch { waited },
        })
    }

    fn launch(&self, host: &dyn PluginHost) -> Result<ProcessHandle, SupervisorError> {
        let command = host.os_type().interpreter();
        let script = host.plugin_dir().join(&self.config.service_script);

        let stdio = match &self.config.service_log {
            Some(path) => StdioMode::AppendTo(path.clone()),
            None => StdioMode::Ignore,
        };
        let options = LaunchOptions {
            detached: true,
            stdio,
        };

        tracing::info!("Launching OCR service: {} {}", command, script.display());

        let handle = host
            .run(command, &[script.to_string_lossy().into_owned()], &options)
            .map_err(|source| SupervisorError::Launch {
                command: command.to_string(),
                source,
            })?;

        tracing::debug!("OCR service process spawned, pid {}", handle.pid);
        Ok(handle)
    }

    async fn wait_until_ready(&self) -> Result<Duration, SupervisorError> {
        let endpoint = self.config.endpoint();
        let budget = self.config.startup_timeout();
        let started = Instant::now();

        while started.elapsed() < budget {
            if self
                .probe
                .probe(&endpoint, self.config.poll_probe_timeout())
                .await
                .is_reachable()
            {
                return Ok(started.elapsed());
            }

            let remaining = budget.saturating_sub(started.elapsed());
            tokio::time::sleep(self.config.poll_interval().min(remaining)).await;
        }

        Err(SupervisorError::StartupTimeout(budget))
    }
}

fn transition(state: SupervisorState) {
    tracing::debug!(?state, "OCR service supervisor");
}
