use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::autostart::Autostart;
use crate::config::{MirrorsConfig, WelcomeConfig};
use crate::desktop::{self, is_dark_theme, DesktopEnv, ThemeManager};
use crate::install::{self, InstallMonitor, InstallStatus};
use crate::mirrors::{
    LogRecord, Protocol, RefreshSettings, RunState, SortKey, UpdateCoordinator, UpdateRequest,
    MAX_MIRRORS_RANGE, TIMEOUT_RANGE,
};
use crate::process::{EnvPolicy, ProcessRunner};
use crate::sink::{ChannelSink, EventSink, RunEvent};
use crate::ui::Theme;

pub const LOG_CAPACITY: usize = 500;

/// Entries of the action list, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Install,
    UpdateSystem,
    Mirrors,
    Display,
    Theme,
    Autostart,
}

impl PanelAction {
    pub const ALL: [PanelAction; 6] = [
        PanelAction::Install,
        PanelAction::UpdateSystem,
        PanelAction::Mirrors,
        PanelAction::Display,
        PanelAction::Theme,
        PanelAction::Autostart,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PanelAction::Install => "Install ALG",
            PanelAction::UpdateSystem => "Update System",
            PanelAction::Mirrors => "Update Mirrorlist",
            PanelAction::Display => "Screen Resolution",
            PanelAction::Theme => "Dark Theme",
            PanelAction::Autostart => "Launch at Start",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Actions,
    Mirrors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorField {
    Countries,
    Protocols,
    MaxMirrors,
    Timeout,
    Sort,
}

impl MirrorField {
    const ORDER: [MirrorField; 5] = [
        MirrorField::Countries,
        MirrorField::Protocols,
        MirrorField::MaxMirrors,
        MirrorField::Timeout,
        MirrorField::Sort,
    ];

    fn step(self, forward: bool) -> Self {
        let len = Self::ORDER.len();
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ORDER[next]
    }
}

/// Editable state behind a mirror refresh request
#[derive(Debug, Clone)]
pub struct MirrorForm {
    pub countries: Vec<(String, bool)>,
    pub country_cursor: usize,
    pub protocols: [(Protocol, bool); 2],
    pub protocol_cursor: usize,
    pub max_mirrors: u32,
    pub timeout_secs: u32,
    pub sort: SortKey,
    pub field: MirrorField,
}

impl MirrorForm {
    pub fn from_config(config: &MirrorsConfig) -> Self {
        let enabled = |p: Protocol| config.default_protocols.contains(&p);
        Self {
            countries: config.countries.iter().map(|c| (c.clone(), false)).collect(),
            country_cursor: 0,
            protocols: [
                (Protocol::Https, enabled(Protocol::Https)),
                (Protocol::Http, enabled(Protocol::Http)),
            ],
            protocol_cursor: 0,
            max_mirrors: config.default_max_mirrors,
            timeout_secs: config.default_timeout_secs,
            sort: config.default_sort,
            field: MirrorField::Countries,
        }
    }

    pub fn selected_countries(&self) -> impl Iterator<Item = &str> {
        self.countries
            .iter()
            .filter(|(_, selected)| *selected)
            .map(|(name, _)| name.as_str())
    }

    pub fn request(&self) -> UpdateRequest {
        UpdateRequest::new(self.selected_countries())
            .with_protocols(
                self.protocols
                    .iter()
                    .filter(|(_, enabled)| *enabled)
                    .map(|(p, _)| *p),
            )
            .with_max_mirrors(self.max_mirrors)
            .with_timeout_secs(self.timeout_secs)
            .with_sort(self.sort)
    }

    fn move_cursor(&mut self, down: bool) {
        let (cursor, len) = match self.field {
            MirrorField::Countries => (&mut self.country_cursor, self.countries.len()),
            MirrorField::Protocols => (&mut self.protocol_cursor, self.protocols.len()),
            _ => return,
        };
        if len == 0 {
            return;
        }
        *cursor = if down { (*cursor + 1) % len } else { (*cursor + len - 1) % len };
    }

    fn toggle(&mut self) {
        match self.field {
            MirrorField::Countries => {
                if let Some((_, selected)) = self.countries.get_mut(self.country_cursor) {
                    *selected = !*selected;
                }
            }
            MirrorField::Protocols => {
                if let Some((_, enabled)) = self.protocols.get_mut(self.protocol_cursor) {
                    *enabled = !*enabled;
                }
            }
            _ => {}
        }
    }

    fn adjust(&mut self, increase: bool) {
        let step = |value: u32, range: &std::ops::RangeInclusive<u32>| {
            let value = if increase { value.saturating_add(1) } else { value.saturating_sub(1) };
            value.clamp(*range.start(), *range.end())
        };
        match self.field {
            MirrorField::MaxMirrors => self.max_mirrors = step(self.max_mirrors, &MAX_MIRRORS_RANGE),
            MirrorField::Timeout => self.timeout_secs = step(self.timeout_secs, &TIMEOUT_RANGE),
            MirrorField::Sort => {
                self.sort = if increase { self.sort.next() } else { self.sort.prev() };
            }
            _ => {}
        }
    }
}

/// Message displayed to the user
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

/// Presentation state of the welcome panel.
pub struct WelcomeApp {
    pub config: WelcomeConfig,
    pub theme: Theme,
    pub desktop: DesktopEnv,
    env: EnvPolicy,

    // Installer
    install: InstallMonitor,
    pub install_status: InstallStatus,
    pub live_iso: bool,

    // Mirror refresh; the sink is owned here and only lent to the coordinator
    coordinator: UpdateCoordinator,
    _sink: Arc<dyn EventSink>,
    pub refresh_state: RunState,
    pub log: VecDeque<LogRecord>,
    pub last_command: Option<String>,
    pub form: MirrorForm,

    // Navigation
    pub focus: Focus,
    pub selected_action: usize,

    // Desktop toggles
    theme_manager: Option<ThemeManager>,
    pub dark_theme: bool,
    autostart: Option<Autostart>,
    pub autostart_enabled: bool,

    pub message: Option<Message>,
    pub should_exit: bool,
}

impl WelcomeApp {
    /// Build the panel; run events for the UI loop arrive on the returned receiver.
    pub fn new(config: WelcomeConfig, desktop: DesktopEnv) -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let env = EnvPolicy::from_config(&config.environment);
        let (sink, rx) = ChannelSink::new();
        let sink: Arc<dyn EventSink> = Arc::new(sink);

        let coordinator = UpdateCoordinator::new(
            RefreshSettings::from_config(&config.mirrors),
            ProcessRunner::new(env.clone()),
            Arc::downgrade(&sink),
        );
        let install = InstallMonitor::from_config(&config.installer, env.clone());
        let live_iso = install::is_live_iso(&config.installer.live_marker);

        let theme_manager = ThemeManager::for_desktop(&desktop);
        let dark_theme = theme_manager
            .as_ref()
            .is_some_and(|m| is_dark_theme(&m.current_theme()));
        let autostart = Autostart::from_config(&config.autostart);
        let autostart_enabled = autostart.as_ref().is_some_and(Autostart::is_enabled);

        info!("Welcome panel on {} (live ISO: {})", desktop.name(), live_iso);

        let app = Self {
            form: MirrorForm::from_config(&config.mirrors),
            theme: Theme::default(),
            install_status: install.poll(),
            install,
            live_iso,
            coordinator,
            _sink: sink,
            refresh_state: RunState::Idle,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            last_command: None,
            focus: Focus::Actions,
            selected_action: 0,
            theme_manager,
            dark_theme,
            autostart,
            autostart_enabled,
            message: None,
            should_exit: false,
            desktop,
            env,
            config,
        };
        (app, rx)
    }

    pub fn selected(&self) -> PanelAction {
        PanelAction::ALL[self.selected_action.min(PanelAction::ALL.len() - 1)]
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_state == RunState::Running
    }

    pub fn set_error(&mut self, text: String) {
        self.message = Some(Message { text, is_error: true });
    }

    pub fn set_info(&mut self, text: String) {
        self.message = Some(Message { text, is_error: false });
    }

    /// Re-read the installer flag for the install button.
    pub fn poll_installer(&mut self) {
        self.install_status = self.install.poll();
    }

    pub fn handle_run_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Log(record) => {
                if self.log.len() >= LOG_CAPACITY {
                    self.log.pop_front();
                }
                self.log.push_back(record);
            }
            RunEvent::Finished(code) => {
                self.refresh_state = RunState::Finished(code);
                if code == 0 {
                    self.set_info("Mirrorlist updated".to_string());
                } else {
                    self.set_error(format!("Mirror refresh failed with code {code}"));
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return;
        }

        // Any key dismisses the current message
        self.message = None;

        match self.focus {
            Focus::Actions => self.handle_actions_key(key),
            Focus::Mirrors => self.handle_mirrors_key(key),
        }
    }

    fn handle_actions_key(&mut self, key: KeyEvent) {
        let len = PanelAction::ALL.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.request_exit(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_action = (self.selected_action + 1) % len;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_action = (self.selected_action + len - 1) % len;
            }
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Char(' ') => {
                self.activate(self.selected());
            }
            _ => {}
        }
    }

    fn handle_mirrors_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Actions,
            KeyCode::Char('q') => self.request_exit(),
            KeyCode::Tab => self.form.field = self.form.field.step(true),
            KeyCode::BackTab => self.form.field = self.form.field.step(false),
            KeyCode::Char('j') | KeyCode::Down => self.form.move_cursor(true),
            KeyCode::Char('k') | KeyCode::Up => self.form.move_cursor(false),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('+') => self.form.adjust(true),
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('-') => self.form.adjust(false),
            KeyCode::Char(' ') => self.form.toggle(),
            KeyCode::Enter => self.start_refresh(),
            _ => {}
        }
    }

    fn request_exit(&mut self) {
        if self.is_refreshing() {
            self.set_error("Mirror refresh in progress, please wait".to_string());
        } else {
            self.should_exit = true;
        }
    }

    fn activate(&mut self, action: PanelAction) {
        match action {
            PanelAction::Install => self.launch_installer(),
            PanelAction::UpdateSystem => {
                match desktop::update_system(&self.desktop, &self.env) {
                    Ok(()) => self.set_info("System update started in a terminal".to_string()),
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            PanelAction::Mirrors => self.focus = Focus::Mirrors,
            PanelAction::Display => {
                if let Err(e) = desktop::open_display_settings(&self.desktop, &self.env) {
                    self.set_error(e.to_string());
                }
            }
            PanelAction::Theme => self.toggle_theme(),
            PanelAction::Autostart => self.toggle_autostart(),
        }
    }

    fn launch_installer(&mut self) {
        if !self.live_iso {
            self.set_error("The installer is only available on the live ISO".to_string());
            return;
        }
        if self.install.launch() {
            self.set_info("Installer started".to_string());
        } else {
            self.set_info("Installer is already running".to_string());
        }
        self.poll_installer();
    }

    fn toggle_theme(&mut self) {
        let Some(manager) = self.theme_manager.clone() else {
            self.set_error(format!("Theme switching is not supported on {}", self.desktop.name()));
            return;
        };
        let dark = !self.dark_theme;
        self.dark_theme = dark;

        // Theme tools can take a while; keep them off the UI thread.
        std::thread::spawn(move || {
            if let Err(e) = manager.set_theme(dark) {
                error!("Failed to switch theme: {}", e);
            }
        });
    }

    fn toggle_autostart(&mut self) {
        let Some(autostart) = &self.autostart else {
            self.set_error("No config directory for autostart".to_string());
            return;
        };
        let enable = !self.autostart_enabled;
        match autostart.set_enabled(enable) {
            Ok(()) => self.autostart_enabled = enable,
            Err(e) => {
                warn!("Failed to toggle autostart: {}", e);
                self.set_error(e.to_string());
            }
        }
    }

    fn start_refresh(&mut self) {
        let request = self.form.request();
        match self.coordinator.start(&request) {
            Ok(()) => {
                self.log.clear();
                self.refresh_state = RunState::Running;
                self.last_command = Some(self.coordinator.command_line(&request));
                self.set_info("Refreshing mirrors...".to_string());
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }
}
