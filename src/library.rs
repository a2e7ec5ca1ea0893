use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MOD_EXTENSIONS: [&str; 2] = ["wad", "pk3"];

/// Where the game writes saves for a launched mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// `<mod folder>/save`, one save dir per mod.
    #[default]
    PerMod,
    Shared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<String>,
    pub launch_command: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub mods: Vec<ModEntry>,
    /// Subfolders that held no loadable files.
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    mods: Vec<ModEntry>,
}

impl Catalog {
    pub fn new(mut mods: Vec<ModEntry>) -> Self {
        sort_mods(&mut mods);
        Self { mods }
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModEntry> {
        self.mods.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModEntry> {
        self.mods.iter()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.mods.iter().position(|entry| entry.name == name)
    }
}

pub fn scan_mods(folder: &Path, launch_prefix: &str, save_mode: SaveMode) -> Result<ScanReport> {
    if !folder.is_dir() {
        bail!("mods folder not found: {}", folder.display());
    }

    let mut report = ScanReport::default();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.with_context(|| format!("read mods folder {}", folder.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let path = entry.into_path();
        let files = mod_files_in(&path)?;
        if files.is_empty() {
            report.skipped.push(path);
            continue;
        }
        let launch_command = build_launch_command(launch_prefix, &path, &files, save_mode);
        report.mods.push(ModEntry {
            name,
            path,
            files,
            launch_command,
        });
    }

    sort_mods(&mut report.mods);
    report.skipped.sort();
    Ok(report)
}

fn mod_files_in(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("read mod folder {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if is_mod_file(name) {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

pub fn is_mod_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            MOD_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn sort_mods(mods: &mut [ModEntry]) {
    mods.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace(' ', "\\ ")
}

pub fn build_launch_command(
    prefix: &str,
    folder: &Path,
    files: &[String],
    save_mode: SaveMode,
) -> String {
    let mut command = format!("{} -file ", prefix.trim_end());
    for file in files {
        command.push_str(&escape_path(&folder.join(file)));
        command.push(' ');
    }
    match save_mode {
        SaveMode::PerMod => {
            command.push_str("-savedir ");
            command.push_str(&escape_path(folder));
            command.push_str("/save");
        }
        SaveMode::Shared => command.push_str(" $@"),
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PREFIX: &str = "gzdoom";

    fn touch(path: &Path) {
        fs::write(path, b"PWAD").unwrap();
    }

    #[test]
    fn command_escapes_spaces_and_sets_savedir() {
        let folder = Path::new("/games/pwads/Alien Vendetta");
        let files = vec!["av.wad".to_string(), "av music.pk3".to_string()];
        let command = build_launch_command(PREFIX, folder, &files, SaveMode::PerMod);
        assert_eq!(
            command,
            "gzdoom -file /games/pwads/Alien\\ Vendetta/av.wad \
             /games/pwads/Alien\\ Vendetta/av\\ music.pk3 \
             -savedir /games/pwads/Alien\\ Vendetta/save"
        );
    }

    #[test]
    fn shared_saves_forward_arguments() {
        let folder = Path::new("/games/pwads/Eviternity");
        let files = vec!["eviternity.wad".to_string()];
        let command = build_launch_command(PREFIX, folder, &files, SaveMode::Shared);
        assert_eq!(command, "gzdoom -file /games/pwads/Eviternity/eviternity.wad  $@");
    }

    #[test]
    fn recognizes_mod_extensions() {
        assert!(is_mod_file("doom2.wad"));
        assert!(is_mod_file("DOOM2.WAD"));
        assert!(is_mod_file("brutal.pk3"));
        assert!(!is_mod_file("readme.txt"));
        assert!(!is_mod_file("wad"));
    }

    #[test]
    fn scan_sorts_case_insensitively_and_skips_empty_folders() {
        let dir = TempDir::new().unwrap();
        for name in ["sunlust", "Alien Vendetta", "ancient aliens", "Empty"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        touch(&dir.path().join("sunlust").join("sunlust.wad"));
        touch(&dir.path().join("Alien Vendetta").join("av.wad"));
        touch(&dir.path().join("ancient aliens").join("aaliens.wad"));
        touch(&dir.path().join("ancient aliens").join("notes.txt"));
        touch(&dir.path().join("Empty").join("readme.txt"));
        touch(&dir.path().join("stray.wad"));

        let report = scan_mods(dir.path(), PREFIX, SaveMode::PerMod).unwrap();
        let names: Vec<_> = report.mods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alien Vendetta", "ancient aliens", "sunlust"]);
        assert_eq!(report.mods[1].files, vec!["aaliens.wad".to_string()]);
        assert_eq!(report.skipped, vec![dir.path().join("Empty")]);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = scan_mods(&dir.path().join("nope"), PREFIX, SaveMode::PerMod);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_finds_by_exact_name() {
        let catalog = Catalog::new(vec![
            ModEntry {
                name: "b".to_string(),
                path: PathBuf::from("/b"),
                files: Vec::new(),
                launch_command: String::new(),
            },
            ModEntry {
                name: "A".to_string(),
                path: PathBuf::from("/A"),
                files: Vec::new(),
                launch_command: String::new(),
            },
        ]);
        assert_eq!(catalog.index_of("A"), Some(0));
        assert_eq!(catalog.index_of("b"), Some(1));
        assert_eq!(catalog.index_of("a"), None);
    }
}
