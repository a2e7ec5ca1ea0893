use crate::{
    config::{LauncherConfig, Settings},
    launch,
    library::{self, Catalog},
    nav::{Action, Input, Navigator, DEFAULT_VISIBLE_ROWS},
    rating::Rating,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

pub struct App {
    pub settings: Settings,
    pub catalog: Catalog,
    pub config: LauncherConfig,
    pub nav: Navigator,
    pub logs: Vec<LogEntry>,
    pub status: String,
    pub should_quit: bool,
    /// Name of the mod handed to the game, once one has been started.
    pub launched: Option<String>,
    config_path: PathBuf,
    log_path: PathBuf,
}

impl App {
    pub fn initialize(settings: Settings) -> Result<Self> {
        let report = library::scan_mods(&settings.mods_dir, &settings.launch_prefix, settings.save_mode)
            .context("scan mods folder")?;
        let config_path = settings.ratings_path();
        let (config, load_error) = match LauncherConfig::try_load(&config_path) {
            Ok(config) => (config.unwrap_or_default(), None),
            Err(err) => (LauncherConfig::default(), Some(err)),
        };

        let mut app = App::new(settings, Catalog::new(report.mods), config);
        if let Some(err) = load_error {
            app.log_info(format!("Config unreadable, starting fresh: {err:#}"));
        }
        for skipped in report.skipped {
            app.log_warn(format!("No mods found in {}", skipped.display()));
        }
        app.log_info(format!(
            "Loaded {} mod(s) from {}",
            app.catalog.len(),
            app.settings.mods_dir.display()
        ));
        Ok(app)
    }

    pub fn new(settings: Settings, catalog: Catalog, config: LauncherConfig) -> Self {
        let initial_row = config
            .last_run
            .as_deref()
            .and_then(|name| catalog.index_of(name))
            .unwrap_or(0);
        let nav = Navigator::new(
            catalog.len(),
            initial_row,
            DEFAULT_VISIBLE_ROWS,
            settings.repeat_timing(),
        );
        let status = if catalog.is_empty() {
            "No mods found".to_string()
        } else {
            "Ready".to_string()
        };
        Self {
            config_path: settings.ratings_path(),
            log_path: settings.log_path(),
            settings,
            catalog,
            config,
            nav,
            logs: Vec::new(),
            status,
            should_quit: false,
            launched: None,
        }
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn rating_at(&self, index: usize) -> Rating {
        self.catalog
            .get(index)
            .map(|entry| self.config.rating(&entry.name))
            .unwrap_or_default()
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.catalog
            .get(self.nav.selected_row())
            .map(|entry| entry.name.as_str())
    }

    pub fn tick(&mut self, now: Instant) {
        self.nav.tick(now);
    }

    pub fn handle_input(&mut self, input: Input, now: Instant) {
        if let Some(action) = self.nav.handle(input, now) {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Launch(index) => self.launch(index),
            Action::CycleRating(index) => self.cycle_rating(index),
        }
    }

    fn cycle_rating(&mut self, index: usize) {
        let Some(name) = self.catalog.get(index).map(|entry| entry.name.clone()) else {
            return;
        };
        let rating = self.config.cycle_rating(&name);
        self.status = format!("{name}: {}", rating.display_name());
        self.save_config();
    }

    fn launch(&mut self, index: usize) {
        let Some(entry) = self.catalog.get(index).cloned() else {
            return;
        };
        self.config.set_last_run(&entry.name);
        self.save_config();

        match launch::spawn_detached(&entry.launch_command, &self.settings.game_dir) {
            Ok(child) => {
                self.log_info(format!("Launched {} (pid {})", entry.name, child.id()));
                self.status = format!("Launched {}", entry.name);
                self.launched = Some(entry.name);
                self.should_quit = true;
            }
            Err(err) => {
                self.status = format!("Launch failed: {err}");
                self.log_error(format!("Launch {} failed: {err}", entry.name));
            }
        }
    }

    fn save_config(&mut self) {
        if let Err(err) = self.config.save(&self.config_path) {
            self.status = format!("Save failed: {err}");
            self.log_error(format!("Save failed: {err:#}"));
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.config
            .save(&self.config_path)
            .context("save launcher config on exit")
    }

    pub fn hint(&self) -> &'static str {
        if self.catalog.is_empty() {
            "q quit"
        } else {
            "↑↓ move | ←→ column | Enter launch/rate | PgUp/PgDn page | q quit"
        }
    }

    pub fn log_info(&mut self, message: String) {
        self.push_log(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: String) {
        self.push_log(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: String) {
        self.push_log(LogLevel::Error, message);
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        self.logs.push(LogEntry {
            level,
            message: message.clone(),
        });

        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
        }

        let _ = append_log_file(&self.log_path, level, &message);
    }
}

pub fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn log_timestamp() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn append_log_file(path: &Path, level: LogLevel, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{} [{label}] {message}", log_timestamp())
}
