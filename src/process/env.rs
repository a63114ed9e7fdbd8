use std::process::Command;

use crate::config::EnvironmentConfig;

/// Variables removed from a helper's inherited environment.
///
/// Library, plugin and platform-theme search paths set for the panel itself
/// leak into privileged helpers otherwise, and Qt/GTK children then load the
/// wrong plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPolicy {
    remove: Vec<String>,
}

impl EnvPolicy {
    pub fn new<I, S>(remove: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            remove: remove.into_iter().map(Into::into).collect(),
        }
    }

    /// Inherit everything unchanged.
    pub fn inherit() -> Self {
        Self { remove: Vec::new() }
    }

    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.remove.iter().cloned())
    }

    pub fn removed(&self) -> &[String] {
        &self.remove
    }

    pub fn apply(&self, cmd: &mut Command) {
        for var in &self.remove {
            cmd.env_remove(var);
        }
    }
}

impl Default for EnvPolicy {
    fn default() -> Self {
        Self::from_config(&EnvironmentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strips_library_plugin_and_theme_paths() {
        let policy = EnvPolicy::default();
        assert_eq!(
            policy.removed(),
            ["LD_LIBRARY_PATH", "QT_PLUGIN_PATH", "QT_QPA_PLATFORM_THEME"]
        );
    }

    #[test]
    fn apply_marks_variables_removed() {
        let mut cmd = Command::new("true");
        cmd.env("QT_PLUGIN_PATH", "/opt/qt/plugins");
        EnvPolicy::new(["QT_PLUGIN_PATH"]).apply(&mut cmd);

        let removed: Vec<_> = cmd
            .get_envs()
            .filter(|(key, value)| *key == "QT_PLUGIN_PATH" && value.is_none())
            .collect();
        assert_eq!(removed.len(), 1);
    }
}
