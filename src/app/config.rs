use crate::app::cli::Cli;
use crate::app::models::{ListOptions, SortBy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults read from `config.toml`; every key is optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileDefaults {
    pub long: bool,
    pub all: bool,
    pub human_readable: bool,
    pub recursive: bool,
    pub reverse: bool,
    pub sort: Option<SortBy>,
    pub flat: bool,
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("lister").join("config.toml"))
}

/// Reads a defaults file. A missing file is not an error.
pub fn load_defaults_file(path: &Path) -> Result<FileDefaults> {
    if !path.exists() {
        log::debug!("no defaults file at {}", path.display());
        return Ok(FileDefaults::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;

    let parsed: FileDefaults = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    Ok(parsed)
}

fn load_defaults(cli: &Cli) -> Result<FileDefaults> {
    if cli.no_config {
        return Ok(FileDefaults::default());
    }

    match &cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            load_defaults_file(path)
        }
        None => match default_config_path() {
            Some(path) => load_defaults_file(&path),
            None => {
                log::warn!("Could not determine home directory; using built-in defaults");
                Ok(FileDefaults::default())
            }
        },
    }
}

/// Flags are on when either source turns them on; the sort key goes
/// command line > defaults file > name.
pub fn merge_options(cli: &Cli, defaults: &FileDefaults) -> ListOptions {
    ListOptions {
        long_format: cli.long || defaults.long,
        all_files: cli.all || defaults.all,
        human_readable: cli.human_readable || defaults.human_readable,
        recursive: cli.recursive || defaults.recursive,
        reverse: cli.reverse || defaults.reverse,
        sort_by: cli.sort_key().or(defaults.sort).unwrap_or_default(),
        flat: cli.flat || defaults.flat,
    }
}

pub fn resolve_config(cli: &Cli) -> Result<ListOptions> {
    let defaults = load_defaults(cli)?;
    let options = merge_options(cli, &defaults);
    log::debug!("resolved options: {:?}", options);
    Ok(options)
}
