use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{error, info};

use crate::config::InstallerConfig;
use crate::lock;
use crate::process::{exit_code_of, EnvPolicy};

const IDLE_LABEL: &str = "Install ALG";
const BUSY_LABEL: &str = "Installing...";

/// Whether this session booted from the live ISO.
pub fn is_live_iso(marker: impl AsRef<Path>) -> bool {
    marker.as_ref().exists()
}

/// What the install button should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallStatus {
    pub running: bool,
    pub enabled: bool,
    pub label: &'static str,
}

/// Tracks the single installer launch of this process.
///
/// `launch` is fire-and-forget; the flag is raised under the lock before the
/// installer starts and lowered under the same lock whichever way it ends.
#[derive(Clone)]
pub struct InstallMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    running: AtomicBool,
    guard: Mutex<()>,
    command: Vec<String>,
    env: EnvPolicy,
}

impl InstallMonitor {
    pub fn new(command: Vec<String>, env: EnvPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                running: AtomicBool::new(false),
                guard: Mutex::new(()),
                command,
                env,
            }),
        }
    }

    pub fn from_config(config: &InstallerConfig, env: EnvPolicy) -> Self {
        Self::new(config.command.clone(), env)
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    pub fn poll(&self) -> InstallStatus {
        let running = self.is_running();
        InstallStatus {
            running,
            enabled: !running,
            label: if running { BUSY_LABEL } else { IDLE_LABEL },
        }
    }

    /// Start the installer unless one is already running.
    ///
    /// Returns whether this call started it.
    pub fn launch(&self) -> bool {
        {
            let _guard = lock(&self.inner.guard);
            if self.inner.running.load(Ordering::Acquire) {
                info!("Installer is already running");
                return false;
            }
            self.inner.running.store(true, Ordering::Release);
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("installer".to_string())
            .spawn(move || {
                let _reset = ResetOnExit(&inner);
                inner.run_installer();
            });

        if let Err(e) = spawned {
            error!("Failed to start installer thread: {}", e);
            self.inner.reset();
            return false;
        }
        true
    }
}

impl Inner {
    fn run_installer(&self) {
        let Some((program, args)) = self.command.split_first() else {
            error!("No installer command configured");
            return;
        };

        info!("Launching installer: {} {:?}", program, args);
        let mut cmd = Command::new(program);
        cmd.args(args);
        self.env.apply(&mut cmd);

        match cmd.output() {
            Ok(output) if output.status.success() => {
                info!(
                    "Installer finished: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
            Ok(output) => {
                error!("Installer exit code: {}", exit_code_of(output.status));
                error!("Error: {}", String::from_utf8_lossy(&output.stderr).trim());
            }
            Err(e) => error!("Failed to start installer {}: {}", program, e),
        }
    }

    fn reset(&self) {
        let _guard = lock(&self.guard);
        self.running.store(false, Ordering::Release);
    }
}

/// Lowers the running flag when the installer thread ends, panics included.
struct ResetOnExit<'a>(&'a Inner);

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        self.0.reset();
    }
}
