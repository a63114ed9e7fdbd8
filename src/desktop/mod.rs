mod theme;

pub use theme::{is_dark_theme, ThemeManager};

use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

use crate::error::{Result, WelcomeError};
use crate::process::{exit_code_of, EnvPolicy};

/// Desktop environment the panel is running under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesktopEnv {
    Kde,
    Gnome,
    Xfce,
    Other(String),
}

impl DesktopEnv {
    pub fn detect() -> Self {
        Self::from_id(&std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default())
    }

    /// Parse an identifier such as `KDE`, `GNOME` or `ubuntu:GNOME`.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim().to_lowercase();
        for token in id.split(':') {
            match token {
                "kde" | "plasma" => return DesktopEnv::Kde,
                "gnome" => return DesktopEnv::Gnome,
                "xfce" => return DesktopEnv::Xfce,
                _ => {}
            }
        }
        DesktopEnv::Other(id)
    }

    pub fn name(&self) -> &str {
        match self {
            DesktopEnv::Kde => "kde",
            DesktopEnv::Gnome => "gnome",
            DesktopEnv::Xfce => "xfce",
            DesktopEnv::Other(id) => id,
        }
    }

    /// Terminal running a full system upgrade.
    pub fn system_update_command(&self) -> Option<LaunchSpec> {
        match self {
            DesktopEnv::Xfce => Some(LaunchSpec::new(
                "xfce4-terminal",
                ["-x", "pkexec", "pacman", "--noconfirm", "-Syu"],
            )),
            DesktopEnv::Gnome => Some(LaunchSpec::new(
                "gnome-terminal",
                ["--", "sudo", "pacman", "--noconfirm", "-Syu"],
            )),
            DesktopEnv::Kde => Some(
                LaunchSpec::new("konsole", ["-e", "sudo", "pacman", "--noconfirm", "-Syu"])
                    .sanitized(),
            ),
            DesktopEnv::Other(_) => None,
        }
    }

    /// Display and resolution settings panel.
    pub fn display_settings_command(&self) -> Option<LaunchSpec> {
        match self {
            DesktopEnv::Xfce => Some(LaunchSpec::new("bash", ["-c", "xfce4-display-settings"])),
            DesktopEnv::Gnome => Some(LaunchSpec::new("gnome-control-center", ["display"])),
            DesktopEnv::Kde => Some(LaunchSpec::new("kcmshell6", ["kcm_kscreen"]).sanitized()),
            DesktopEnv::Other(_) => None,
        }
    }
}

/// A desktop helper started detached from the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Strip library and plugin paths before launching
    pub sanitize: bool,
}

impl LaunchSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            sanitize: false,
        }
    }

    fn sanitized(mut self) -> Self {
        self.sanitize = true;
        self
    }

    /// Start without waiting; the child is reaped on a background thread.
    pub fn launch_detached(&self, env: &EnvPolicy) -> Result<()> {
        info!("Launching {} {:?}", self.program, self.args);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if self.sanitize {
            env.apply(&mut cmd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| WelcomeError::Command(format!("failed to launch {}: {e}", self.program)))?;

        let program = self.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => debug!("{} exited", program),
            Ok(status) => warn!("{} exited with code {}", program, exit_code_of(status)),
            Err(e) => warn!("Failed to wait for {}: {}", program, e),
        });

        Ok(())
    }
}

/// Open a terminal running a system upgrade.
pub fn update_system(desktop: &DesktopEnv, env: &EnvPolicy) -> Result<()> {
    desktop
        .system_update_command()
        .ok_or_else(|| WelcomeError::Unsupported(desktop.name().to_string()))?
        .launch_detached(env)
}

/// Open the display settings panel.
pub fn open_display_settings(desktop: &DesktopEnv, env: &EnvPolicy) -> Result<()> {
    desktop
        .display_settings_command()
        .ok_or_else(|| WelcomeError::Unsupported(desktop.name().to_string()))?
        .launch_detached(env)
}
