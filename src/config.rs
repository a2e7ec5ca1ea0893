use crate::{
    library::SaveMode,
    nav::{RepeatTiming, DEFAULT_REPEAT_DELAY_MS, DEFAULT_REPEAT_RATE_MS},
    rating::Rating,
};
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

const SETTINGS_FILE: &str = "settings.json";
const RATINGS_FILE: &str = "gzfe.json";
const DEFAULT_LAUNCH_PREFIX: &str =
    "/usr/bin/flatpak run --branch=stable --arch=x86_64 --command=gzdoom.sh org.zdoom.GZDoom";

/// Launcher settings, kept in the platform data dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mods_dir: PathBuf,
    /// Working directory the game is started in.
    pub game_dir: PathBuf,
    pub launch_prefix: String,
    pub save_mode: SaveMode,
    pub repeat_delay_ms: u64,
    pub repeat_rate_ms: u64,
    /// Overrides where ratings and the last-run mod are stored.
    pub config_path: Option<PathBuf>,
    #[serde(skip)]
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let home = BaseDirs::new()
            .map(|base| base.home_dir().to_path_buf())
            .unwrap_or_default();
        Self {
            mods_dir: home.join("games/doom/pwads"),
            game_dir: home.join(".var/app/org.zdoom.GZDoom/.config/gzdoom"),
            launch_prefix: DEFAULT_LAUNCH_PREFIX.to_string(),
            save_mode: SaveMode::PerMod,
            repeat_delay_ms: DEFAULT_REPEAT_DELAY_MS,
            repeat_rate_ms: DEFAULT_REPEAT_RATE_MS,
            config_path: None,
            data_dir: PathBuf::new(),
        }
    }
}

impl Settings {
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_in(&base_data_dir()?)
    }

    pub fn load_or_create_in(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).context("create app data dir")?;
        let path = data_dir.join(SETTINGS_FILE);
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read settings")?;
            let mut settings: Settings = serde_json::from_str(&raw)
                .with_context(|| format!("parse settings {}", path.display()))?;
            settings.data_dir = data_dir.to_path_buf();
            return Ok(settings);
        }

        let settings = Settings {
            data_dir: data_dir.to_path_buf(),
            ..Settings::default()
        };
        settings.save()?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).context("create app data dir")?;
        let path = self.data_dir.join(SETTINGS_FILE);
        let raw = serde_json::to_string_pretty(self).context("serialize settings")?;
        fs::write(path, raw).context("write settings")?;
        Ok(())
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(RATINGS_FILE))
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("gzfe.log")
    }

    pub fn repeat_timing(&self) -> RepeatTiming {
        RepeatTiming::from_millis(self.repeat_delay_ms, self.repeat_rate_ms.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModState {
    #[serde(default)]
    pub rating: Rating,
}

/// Persisted per-user state: the last launched mod and every rating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub mods: BTreeMap<String, ModState>,
}

impl LauncherConfig {
    /// Missing or unreadable files fall back to an empty config.
    #[allow(dead_code)]
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).ok().flatten().unwrap_or_default()
    }

    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).context("read launcher config")?;
        let config = serde_json::from_str(&raw).context("parse launcher config")?;
        Ok(Some(config))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("create config dir")?;
        }
        let raw = serde_json::to_string_pretty(self).context("serialize launcher config")?;
        fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn rating(&self, name: &str) -> Rating {
        self.mods
            .get(name)
            .map(|state| state.rating)
            .unwrap_or_default()
    }

    pub fn cycle_rating(&mut self, name: &str) -> Rating {
        let state = self.mods.entry(name.to_string()).or_default();
        state.rating = state.rating.next();
        state.rating
    }

    pub fn set_last_run(&mut self, name: &str) {
        self.last_run = Some(name.to_string());
    }
}

pub fn base_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("gzfe"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("gzfe.json");
        let mut config = LauncherConfig::default();
        config.set_last_run("Sunlust");
        config.cycle_rating("Sunlust");
        config.cycle_rating("Eviternity");
        config.cycle_rating("Eviternity");
        config.save(&path).unwrap();

        let loaded = LauncherConfig::load(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.last_run.as_deref(), Some("Sunlust"));
        assert_eq!(loaded.rating("Eviternity"), Rating::Gold);
    }

    #[test]
    fn missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let config = LauncherConfig::load(&dir.path().join("absent.json"));
        assert_eq!(config, LauncherConfig::default());
    }

    #[test]
    fn corrupt_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gzfe.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(LauncherConfig::try_load(&path).is_err());
        assert_eq!(LauncherConfig::load(&path), LauncherConfig::default());
    }

    #[test]
    fn reads_hand_written_file_with_partial_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gzfe.json");
        fs::write(
            &path,
            r#"{"last_run": null, "mods": {"Alien Vendetta": {"rating": "silver"}, "Plutonia 2": {}}}"#,
        )
        .unwrap();
        let config = LauncherConfig::load(&path);
        assert_eq!(config.last_run, None);
        assert_eq!(config.rating("Alien Vendetta"), Rating::Silver);
        assert_eq!(config.rating("Plutonia 2"), Rating::Unrated);
    }

    #[test]
    fn missing_ratings_default_to_unrated() {
        let mut config = LauncherConfig::default();
        assert_eq!(config.rating("Scythe"), Rating::Unrated);
        assert!(config.mods.is_empty());
        assert_eq!(config.cycle_rating("Scythe"), Rating::Silver);
        assert_eq!(config.rating("Scythe"), Rating::Silver);
    }

    #[test]
    fn settings_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_create_in(dir.path()).unwrap();
        assert!(dir.path().join(SETTINGS_FILE).exists());
        assert_eq!(settings.save_mode, SaveMode::PerMod);
        assert_eq!(settings.ratings_path(), dir.path().join(RATINGS_FILE));

        let reloaded = Settings::load_or_create_in(dir.path()).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn settings_fill_missing_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"mods_dir": "/srv/pwads", "save_mode": "shared"}"#,
        )
        .unwrap();
        let settings = Settings::load_or_create_in(dir.path()).unwrap();
        assert_eq!(settings.mods_dir, PathBuf::from("/srv/pwads"));
        assert_eq!(settings.save_mode, SaveMode::Shared);
        assert_eq!(settings.repeat_delay_ms, DEFAULT_REPEAT_DELAY_MS);
        assert_eq!(settings.launch_prefix, DEFAULT_LAUNCH_PREFIX);
    }

    #[test]
    fn broken_settings_are_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "[").unwrap();
        assert!(Settings::load_or_create_in(dir.path()).is_err());
    }
}
