use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::mirrors::{Protocol, SortKey};

const DEFAULT_CONFIG_PATH: &str = "/etc/alg-welcome/config.toml";
const USER_CONFIG_FILE: &str = "alg-welcome/config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WelcomeConfig {
    pub mirrors: MirrorsConfig,
    pub installer: InstallerConfig,
    pub environment: EnvironmentConfig,
    pub autostart: AutostartConfig,
}

impl WelcomeConfig {
    /// Load the per-user config if present, otherwise the system-wide one.
    pub fn load() -> Result<Self> {
        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Self::load_from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: WelcomeConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(USER_CONFIG_FILE))
    }
}

/// Mirror refresh helper and the defaults shown in the form
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorsConfig {
    /// Refresh tool executable
    pub program: String,
    /// Elevation helper prepended to the command; empty runs the tool directly
    pub privilege_wrapper: String,
    pub mirrorlist_path: String,
    /// Countries offered in the picker
    pub countries: Vec<String>,
    pub default_max_mirrors: u32,
    pub default_timeout_secs: u32,
    pub default_sort: SortKey,
    pub default_protocols: Vec<Protocol>,
}

impl Default for MirrorsConfig {
    fn default() -> Self {
        Self {
            program: "reflector".to_string(),
            privilege_wrapper: "pkexec".to_string(),
            mirrorlist_path: "/etc/pacman.d/mirrorlist".to_string(),
            countries: [
                "Australia",
                "Brazil",
                "Canada",
                "China",
                "France",
                "Germany",
                "India",
                "Japan",
                "Netherlands",
                "Russia",
                "Sweden",
                "United Kingdom",
                "United States",
                "Worldwide",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            default_max_mirrors: 5,
            default_timeout_secs: 10,
            default_sort: SortKey::Rate,
            default_protocols: vec![Protocol::Https],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Command and arguments that launch the installer
    pub command: Vec<String>,
    /// Path whose existence marks a live ISO session
    pub live_marker: String,
    pub poll_interval_ms: u64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "bash".to_string(),
                "-c".to_string(),
                "/etc/calamares/launch.sh".to_string(),
            ],
            live_marker: "/run/archiso".to_string(),
            poll_interval_ms: 2000,
        }
    }
}

/// Variables stripped from helper environments
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub remove: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            remove: vec![
                "LD_LIBRARY_PATH".to_string(),
                "QT_PLUGIN_PATH".to_string(),
                "QT_QPA_PLATFORM_THEME".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutostartConfig {
    /// Desktop entry copied into the user's autostart directory
    pub source: String,
    pub file_name: String,
}

impl Default for AutostartConfig {
    fn default() -> Self {
        Self {
            source: "/usr/share/applications/welcome.desktop".to_string(),
            file_name: "welcome.desktop".to_string(),
        }
    }
}
