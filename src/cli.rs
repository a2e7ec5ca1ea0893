use crate::{
    app::App,
    config::Settings,
    library::SaveMode,
    nav::Action,
    rating::Rating,
    ui,
};
use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

/// Settings overrides given on the command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Overrides {
    mods_dir: Option<PathBuf>,
    game_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    shared_saves: bool,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) {
        if let Some(path) = self.mods_dir {
            settings.mods_dir = path;
        }
        if let Some(path) = self.game_dir {
            settings.game_dir = path;
        }
        if let Some(path) = self.config_path {
            settings.config_path = Some(path);
        }
        if self.shared_saves {
            settings.save_mode = SaveMode::Shared;
        }
    }
}

struct GlobalOptions {
    format: OutputFormat,
    overrides: Overrides,
}

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Ui,
    Command {
        command: CliCommand,
        format: OutputFormat,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    ModsList(ModsListOptions),
    ShowCommand(String),
    Launch(String),
    Paths,
    Help,
    Version,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ModsListOptions {
    filter: Option<String>,
    rating: Option<Rating>,
}

#[derive(Debug, Serialize)]
struct ModListItem {
    name: String,
    rating: Rating,
    last_run: bool,
    files: Vec<String>,
    launch_command: String,
}

#[derive(Debug, Serialize)]
struct PathsOutput {
    mods_dir: String,
    game_dir: String,
    config_path: String,
    data_dir: String,
    log_path: String,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (action, overrides) = parse_args(&args)?;
    match action {
        CliAction::Ui => {
            let mut app = App::initialize(load_settings(overrides)?)?;
            ui::run(&mut app)
        }
        CliAction::Command { command, format } => match command {
            CliCommand::Help => {
                print_help();
                Ok(())
            }
            CliCommand::Version => {
                println!("gzfe v{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            CliCommand::Paths => list_paths(&load_settings(overrides)?, format),
            command => {
                let mut app = App::initialize(load_settings(overrides)?)?;
                run_command(&mut app, command, format)
            }
        },
    }
}

fn load_settings(overrides: Overrides) -> Result<Settings> {
    let mut settings = Settings::load_or_create()?;
    overrides.apply(&mut settings);
    Ok(settings)
}

fn parse_args(args: &[String]) -> Result<(CliAction, Overrides)> {
    if matches!(args.first().map(|s| s.as_str()), Some("--help" | "-h" | "help")) {
        return Ok((help_action(), Overrides::default()));
    }
    if matches!(args.first().map(|s| s.as_str()), Some("--version" | "-V" | "version")) {
        return Ok((
            CliAction::Command {
                command: CliCommand::Version,
                format: OutputFormat::Text,
            },
            Overrides::default(),
        ));
    }

    let (global, tokens) = parse_global_options(args)?;
    if tokens.is_empty() {
        return Ok((CliAction::Ui, global.overrides));
    }
    let command = parse_subcommand(&tokens)?;
    Ok((
        CliAction::Command {
            command,
            format: global.format,
        },
        global.overrides,
    ))
}

fn help_action() -> CliAction {
    CliAction::Command {
        command: CliCommand::Help,
        format: OutputFormat::Text,
    }
}

fn parse_global_options(args: &[String]) -> Result<(GlobalOptions, Vec<String>)> {
    let mut format = OutputFormat::Text;
    let mut overrides = Overrides::default();
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{name} requires a value")),
            }
        };
        match flag {
            "--format" => {
                let raw = value("--format")?;
                format = OutputFormat::parse(&raw)
                    .ok_or_else(|| anyhow!("Unknown format: {raw} (use 'text' or 'json')"))?;
            }
            "--mods-dir" => overrides.mods_dir = Some(PathBuf::from(value("--mods-dir")?)),
            "--game-dir" => overrides.game_dir = Some(PathBuf::from(value("--game-dir")?)),
            "--config" => overrides.config_path = Some(PathBuf::from(value("--config")?)),
            "--shared-saves" => overrides.shared_saves = true,
            _ => tokens.push(arg.to_string()),
        }
    }

    Ok((GlobalOptions { format, overrides }, tokens))
}

fn parse_subcommand(tokens: &[String]) -> Result<CliCommand> {
    let head = tokens[0].as_str();
    let rest = tokens.get(1..).unwrap_or(&[]);
    match head {
        "mods" => Ok(CliCommand::ModsList(parse_mods_list(rest)?)),
        "command" => Ok(CliCommand::ShowCommand(required_name(rest, "command")?)),
        "launch" => Ok(CliCommand::Launch(required_name(rest, "launch")?)),
        "paths" => Ok(CliCommand::Paths),
        _ => bail!("Unknown command: {head} (see --help)"),
    }
}

fn required_name(args: &[String], command: &str) -> Result<String> {
    if args.is_empty() {
        bail!("{command} requires a mod name");
    }
    Ok(args.join(" "))
}

fn parse_mods_list(args: &[String]) -> Result<ModsListOptions> {
    let mut options = ModsListOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "list" => {}
            "--filter" => {
                let Some(value) = iter.next() else {
                    bail!("--filter requires a value");
                };
                options.filter = Some(value.to_string());
            }
            value if value.starts_with("--filter=") => {
                options.filter = Some(value.trim_start_matches("--filter=").to_string());
            }
            "--rating" => {
                let Some(value) = iter.next() else {
                    bail!("--rating requires a value");
                };
                options.rating = Some(parse_rating(value)?);
            }
            value if value.starts_with("--rating=") => {
                options.rating = Some(parse_rating(value.trim_start_matches("--rating="))?);
            }
            other => bail!("Unknown mods option: {other}"),
        }
    }
    Ok(options)
}

fn parse_rating(value: &str) -> Result<Rating> {
    Rating::ALL
        .into_iter()
        .find(|rating| rating.as_str() == value)
        .ok_or_else(|| anyhow!("Unknown rating: {value} (unrated, silver, gold, bad)"))
}

fn run_command(app: &mut App, command: CliCommand, format: OutputFormat) -> Result<()> {
    match command {
        CliCommand::ModsList(options) => list_mods(app, &options, format),
        CliCommand::ShowCommand(name) => {
            let index = find_mod(app, &name)?;
            if let Some(entry) = app.catalog.get(index) {
                println!("{}", entry.launch_command);
            }
            Ok(())
        }
        CliCommand::Launch(name) => {
            let index = find_mod(app, &name)?;
            app.apply(Action::Launch(index));
            if app.launched.is_none() {
                bail!("{}", app.status);
            }
            println!("{}", app.status);
            Ok(())
        }
        CliCommand::Paths => list_paths(&app.settings, format),
        CliCommand::Help | CliCommand::Version => Ok(()),
    }
}

fn find_mod(app: &App, name: &str) -> Result<usize> {
    if let Some(index) = app.catalog.index_of(name) {
        return Ok(index);
    }
    let needle = name.to_lowercase();
    app.catalog
        .iter()
        .position(|entry| entry.name.to_lowercase() == needle)
        .ok_or_else(|| anyhow!("Mod not found: {name}"))
}

fn list_mods(app: &App, options: &ModsListOptions, format: OutputFormat) -> Result<()> {
    let items = mod_list_items(app, options);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Text => {
            for item in items {
                let marker = if item.last_run { ">" } else { " " };
                println!(
                    "{marker} {} {:<8} {}",
                    item.rating.glyph(),
                    item.rating.as_str(),
                    item.name
                );
            }
        }
    }
    Ok(())
}

fn mod_list_items(app: &App, options: &ModsListOptions) -> Vec<ModListItem> {
    let last_run = app.config.last_run.as_deref();
    let mut items: Vec<ModListItem> = app
        .catalog
        .iter()
        .map(|entry| ModListItem {
            name: entry.name.clone(),
            rating: app.config.rating(&entry.name),
            last_run: last_run == Some(entry.name.as_str()),
            files: entry.files.clone(),
            launch_command: entry.launch_command.clone(),
        })
        .collect();

    if let Some(filter) = &options.filter {
        let needle = filter.to_lowercase();
        items.retain(|item| item.name.to_lowercase().contains(&needle));
    }
    if let Some(rating) = options.rating {
        items.retain(|item| item.rating == rating);
    }
    items
}

/// Works without a readable mods folder, so it can show where gzfe is looking.
fn list_paths(settings: &Settings, format: OutputFormat) -> Result<()> {
    let output = paths_output(settings);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            println!("Mods folder:  {}", output.mods_dir);
            println!("Game dir:     {}", output.game_dir);
            println!("Config:       {}", output.config_path);
            println!("Data dir:     {}", output.data_dir);
            println!("Log:          {}", output.log_path);
        }
    }
    Ok(())
}

fn paths_output(settings: &Settings) -> PathsOutput {
    PathsOutput {
        mods_dir: settings.mods_dir.display().to_string(),
        game_dir: settings.game_dir.display().to_string(),
        config_path: settings.ratings_path().display().to_string(),
        data_dir: settings.data_dir.display().to_string(),
        log_path: settings.log_path().display().to_string(),
    }
}

fn print_help() {
    println!("gzfe v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  gzfe                          Launch the mod picker");
    println!("  gzfe mods list                List mods with ratings");
    println!("  gzfe command <mod>            Print the launch command for a mod");
    println!("  gzfe launch <mod>             Launch a mod without the picker");
    println!("  gzfe paths                    Show configured paths");
    println!();
    println!("Global options:");
    println!("  --mods-dir <path>             Folder holding one subfolder per mod");
    println!("  --game-dir <path>             Working directory for the game");
    println!("  --config <path>               Ratings / last-run file");
    println!("  --shared-saves                Don't pass a per-mod -savedir");
    println!("  --format <json|text>          Output format for list commands");
    println!("  -h, --help                    Show help");
    println!("  -V, --version                 Show version");
    println!();
    println!("Mods list options:");
    println!("  --filter <text>               Only names containing <text>");
    println!("  --rating <unrated|silver|gold|bad>");
}
