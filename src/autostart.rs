use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::AutostartConfig;
use crate::error::{Result, WelcomeError};

/// The panel's entry in the user's autostart directory.
#[derive(Debug, Clone)]
pub struct Autostart {
    source: PathBuf,
    target: PathBuf,
}

impl Autostart {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// `None` when the user's config directory cannot be determined.
    pub fn from_config(config: &AutostartConfig) -> Option<Self> {
        let dir = dirs::config_dir()?.join("autostart");
        Some(Self::new(&config.source, dir.join(&config.file_name)))
    }

    pub fn is_enabled(&self) -> bool {
        self.target.exists()
    }

    pub fn set_enabled(&self, enable: bool) -> Result<()> {
        if enable == self.is_enabled() {
            info!(
                "Autostart is already {}",
                if enable { "enabled" } else { "disabled" }
            );
            return Ok(());
        }

        if !enable {
            fs::remove_file(&self.target)?;
            info!("Autostart disabled");
            return Ok(());
        }

        if !self.source.exists() {
            warn!("Source file {:?} not found", self.source);
            return Err(WelcomeError::Command(format!(
                "desktop entry {} not found",
                self.source.display()
            )));
        }
        if let Some(dir) = self.target.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::copy(&self.source, &self.target)?;
        info!("Autostart enabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_entry_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("welcome.desktop");
        fs::write(&source, "[Desktop Entry]\nName=Welcome\n").unwrap();
        let autostart = Autostart::new(&source, dir.path().join("autostart/welcome.desktop"));

        assert!(!autostart.is_enabled());
        autostart.set_enabled(true).unwrap();
        autostart.set_enabled(true).unwrap();
        assert!(autostart.is_enabled());

        autostart.set_enabled(false).unwrap();
        autostart.set_enabled(false).unwrap();
        assert!(!autostart.is_enabled());
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let autostart = Autostart::new(dir.path().join("absent.desktop"), dir.path().join("out.desktop"));

        assert!(autostart.set_enabled(true).is_err());
        assert!(!autostart.is_enabled());
    }
}
