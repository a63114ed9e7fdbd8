use ini::Ini;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use super::DesktopEnv;
use crate::error::{Result, WelcomeError};

const KDE_DEFAULT_SCHEME: &str = "org.kde.breeze.desktop";
const KDE_DARK_SCHEME: &str = "org.kde.breezedark.desktop";
const DARK_KEYWORDS: [&str; 5] = ["dark", "breezedark", "qogirdark", "prefer-dark", "orchis-dark"];

const GNOME_INTERFACE: &str = "org.gnome.desktop.interface";
const GNOME_USER_THEME: &str = "org.gnome.shell.extensions.user-theme";

pub fn is_dark_theme(theme: &str) -> bool {
    let theme = theme.to_lowercase();
    DARK_KEYWORDS.iter().any(|keyword| theme.contains(keyword))
}

struct GnomeTheme {
    icons: &'static str,
    shell: &'static str,
    gtk: &'static str,
    color_scheme: &'static str,
}

const GNOME_DARK: GnomeTheme = GnomeTheme {
    icons: "Tela-circle-dark",
    shell: "Orchis-Red-Dark",
    gtk: "Orchis-Red-Dark",
    color_scheme: "prefer-dark",
};

const GNOME_LIGHT: GnomeTheme = GnomeTheme {
    icons: "Tela-circle",
    shell: "Orchis-Red-Light",
    gtk: "Orchis-Red-Light",
    color_scheme: "prefer-light",
};

/// Reads and switches the light/dark theme of a supported desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeManager {
    Kde { home: PathBuf, config_files: Vec<PathBuf> },
    Gnome,
    Xfce,
}

impl ThemeManager {
    pub fn for_desktop(desktop: &DesktopEnv) -> Option<Self> {
        match desktop {
            DesktopEnv::Kde => {
                let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
                Some(Self::kde(home))
            }
            DesktopEnv::Gnome => Some(ThemeManager::Gnome),
            DesktopEnv::Xfce => Some(ThemeManager::Xfce),
            DesktopEnv::Other(id) => {
                warn!("Unsupported desktop environment: {}", id);
                None
            }
        }
    }

    pub fn kde(home: PathBuf) -> Self {
        let config_files = vec![
            home.join(".config/kdeglobals"),
            home.join(".kde4/share/config/kdeglobals"),
            PathBuf::from("/etc/kde/kdeglobals"),
        ];
        ThemeManager::Kde { home, config_files }
    }

    pub fn current_theme(&self) -> String {
        let theme = match self {
            ThemeManager::Kde { config_files, .. } => kde_look_and_feel(config_files),
            ThemeManager::Gnome => {
                let scheme = gsettings_get(GNOME_INTERFACE, "color-scheme");
                if scheme.is_empty() {
                    gsettings_get(GNOME_INTERFACE, "gtk-theme")
                } else {
                    scheme
                }
            }
            ThemeManager::Xfce => xfconf_get("xsettings", "/Net/ThemeName"),
        };
        info!("Current theme: {}", theme);
        theme
    }

    pub fn set_theme(&self, dark: bool) -> Result<()> {
        match self {
            ThemeManager::Kde { home, config_files } => {
                let current = kde_look_and_feel(config_files);
                if current.contains("org.kde.breeze") {
                    let style = if dark { KDE_DARK_SCHEME } else { KDE_DEFAULT_SCHEME };
                    run("lookandfeeltool", &["--apply", style])?;
                    info!("KDE theme changed to {}", style);
                } else {
                    let (style, decoration) = if dark {
                        ("Qogirdark", "__aurorae__svg__Qogir-dark-circle")
                    } else {
                        ("Qogirlight", "__aurorae__svg__Qogir-light-circle")
                    };
                    let kwinrc = home.join(".config/kwinrc");
                    run("plasma-apply-colorscheme", &[style])?;
                    run(
                        "kwriteconfig6",
                        &[
                            "--file",
                            &kwinrc.to_string_lossy(),
                            "--group",
                            "org.kde.kdecoration2",
                            "--key",
                            "theme",
                            decoration,
                        ],
                    )?;
                    run("qdbus6", &["org.kde.KWin", "/KWin", "reconfigure"])?;
                    info!("KDE theme changed to {}", style);
                }
            }
            ThemeManager::Gnome => {
                let theme = if dark { &GNOME_DARK } else { &GNOME_LIGHT };
                run("gsettings", &["set", GNOME_INTERFACE, "icon-theme", theme.icons])?;
                run("gsettings", &["set", GNOME_INTERFACE, "gtk-theme", theme.gtk])?;
                run("gsettings", &["set", GNOME_INTERFACE, "color-scheme", theme.color_scheme])?;
                // Needs the user-theme extension
                run("gsettings", &["set", GNOME_USER_THEME, "name", theme.shell])?;
                info!("GNOME theme set to {}", theme.gtk);
            }
            ThemeManager::Xfce => {
                let style = xfce_style(&xfconf_get("xsettings", "/Net/ThemeName"), dark);
                run("xfconf-query", &["-c", "xsettings", "-p", "/Net/ThemeName", "-s", style])?;
                run("xfconf-query", &["-c", "xfwm4", "-p", "/general/theme", "-s", style])?;
                info!("XFCE theme set to {}", style);
            }
        }
        Ok(())
    }
}

fn kde_look_and_feel(config_files: &[PathBuf]) -> String {
    config_files
        .iter()
        .find_map(|path| load_ini(path).and_then(|ini| look_and_feel_from(&ini)))
        .unwrap_or_else(|| KDE_DEFAULT_SCHEME.to_string())
}

fn load_ini(path: &Path) -> Option<Ini> {
    if !path.exists() {
        return None;
    }
    match Ini::load_from_file(path) {
        Ok(ini) => Some(ini),
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            None
        }
    }
}

/// Plain breeze installs name the package; themed ones only set a colour scheme.
fn look_and_feel_from(ini: &Ini) -> Option<String> {
    let color_scheme = ini
        .get_from(Some("General"), "ColorScheme")
        .map(format_color_scheme);

    match ini.get_from(Some("KDE"), "LookAndFeelPackage") {
        Some(package) => {
            let formatted = format_color_scheme(package);
            if formatted == KDE_DEFAULT_SCHEME || formatted == KDE_DARK_SCHEME {
                Some(formatted)
            } else {
                color_scheme
            }
        }
        None => color_scheme,
    }
}

fn format_color_scheme(scheme: &str) -> String {
    match scheme {
        "breeze" => KDE_DEFAULT_SCHEME.to_string(),
        "breezedark" => KDE_DARK_SCHEME.to_string(),
        _ if scheme.ends_with(".colors") => Path::new(scheme)
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| scheme.to_string()),
        _ => scheme.to_string(),
    }
}

fn xfce_style(current: &str, dark: bool) -> &'static str {
    match (current.contains("Qogir"), dark) {
        (true, true) => "Qogir-Dark",
        (true, false) => "Qogir-Light",
        (false, true) => "Adwaita-dark",
        (false, false) => "Adwaita",
    }
}

fn gsettings_get(schema: &str, key: &str) -> String {
    query("gsettings", &["get", schema, key]).replace(['\'', '"'], "")
}

fn xfconf_get(channel: &str, property: &str) -> String {
    query("xfconf-query", &["-c", channel, "-p", property])
}

fn query(program: &str, args: &[&str]) -> String {
    match Command::new(program).args(args).output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        Err(e) => {
            warn!("Failed to run {}: {}", program, e);
            String::new()
        }
    }
}

fn run(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program).args(args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(WelcomeError::Command(format!(
            "{} failed with code {:?}",
            program,
            status.code()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_theme_keywords() {
        assert!(is_dark_theme("org.kde.breezedark.desktop"));
        assert!(is_dark_theme("prefer-dark"));
        assert!(is_dark_theme("Orchis-Red-Dark"));
        assert!(!is_dark_theme("org.kde.breeze.desktop"));
        assert!(!is_dark_theme("prefer-light"));
    }

    #[test]
    fn color_scheme_names_are_normalised() {
        assert_eq!(format_color_scheme("breeze"), KDE_DEFAULT_SCHEME);
        assert_eq!(format_color_scheme("breezedark"), KDE_DARK_SCHEME);
        assert_eq!(format_color_scheme("/usr/share/color-schemes/Qogirdark.colors"), "Qogirdark");
        assert_eq!(format_color_scheme("Qogirlight"), "Qogirlight");
    }

    #[test]
    fn breeze_package_wins_over_color_scheme() {
        let ini = Ini::load_from_str(
            "[General]\nColorScheme=BreezeClassic\n\n[KDE]\nLookAndFeelPackage=org.kde.breezedark.desktop\n",
        )
        .unwrap();
        assert_eq!(look_and_feel_from(&ini).as_deref(), Some(KDE_DARK_SCHEME));
    }

    #[test]
    fn themed_package_falls_back_to_color_scheme() {
        let ini = Ini::load_from_str(
            "[General]\nColorScheme=Qogirdark\n\n[KDE]\nLookAndFeelPackage=com.github.vinceliuice.Qogir-dark\n",
        )
        .unwrap();
        assert_eq!(look_and_feel_from(&ini).as_deref(), Some("Qogirdark"));

        let empty = Ini::load_from_str("[Icons]\nTheme=breeze\n").unwrap();
        assert_eq!(look_and_feel_from(&empty), None);
    }

    #[test]
    fn kde_reads_first_usable_config_file() {
        let home = tempfile::tempdir().unwrap();
        let manager = ThemeManager::kde(home.path().to_path_buf());
        let ThemeManager::Kde { config_files, .. } = &manager else {
            unreachable!()
        };
        assert_eq!(kde_look_and_feel(&config_files[..2]), KDE_DEFAULT_SCHEME);

        std::fs::create_dir_all(home.path().join(".config")).unwrap();
        std::fs::write(
            home.path().join(".config/kdeglobals"),
            "[KDE]\nLookAndFeelPackage=breezedark\n",
        )
        .unwrap();
        assert_eq!(kde_look_and_feel(&config_files[..2]), KDE_DARK_SCHEME);
    }

    #[test]
    fn xfce_keeps_theme_family() {
        assert_eq!(xfce_style("Qogir-Light", true), "Qogir-Dark");
        assert_eq!(xfce_style("Qogir-Dark", false), "Qogir-Light");
        assert_eq!(xfce_style("Adwaita", true), "Adwaita-dark");
        assert_eq!(xfce_style("Greybird", false), "Adwaita");
    }
}
