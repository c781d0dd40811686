use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use mesh_storage::FileNaming;
use serde::Deserialize;
use shared::domain::DeviceRole;

pub const DEFAULT_CONFIG_FILE: &str = "scan_console.toml";
const ENV_PREFIX: &str = "SCAN_CONSOLE__";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub file_naming: FileNaming,
    pub role: Option<DeviceRole>,
    pub local_address: String,
    pub peer_hosts: Vec<String>,
    /// Mode the simulated engine starts in.
    pub v2_scanning: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./scans"),
            file_naming: FileNaming::Fixed,
            role: None,
            local_address: "127.0.0.1".into(),
            peer_hosts: Vec::new(),
            v2_scanning: true,
        }
    }
}

/// Defaults, then the TOML file at `path` if it exists, then
/// `SCAN_CONSOLE__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<Settings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

    if let Some(v) = var("OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Some(v) = var("FILE_NAMING") {
        settings.file_naming = parse_file_naming(&v)?;
    }
    if let Some(v) = var("ROLE") {
        settings.role = Some(parse_role(&v)?);
    }
    if let Some(v) = var("LOCAL_ADDRESS") {
        settings.local_address = v;
    }
    if let Some(v) = var("PEER_HOSTS") {
        settings.peer_hosts = parse_host_list(&v);
    }
    if let Some(v) = var("V2_SCANNING") {
        settings.v2_scanning = v
            .trim()
            .parse()
            .with_context(|| format!("invalid {ENV_PREFIX}V2_SCANNING value '{v}'"))?;
    }

    Ok(())
}

pub fn parse_role(raw: &str) -> anyhow::Result<DeviceRole> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mirror" => Ok(DeviceRole::Mirror),
        "scanner" => Ok(DeviceRole::Scanner),
        other => bail!("unknown device role '{other}' (expected mirror or scanner)"),
    }
}

pub fn parse_file_naming(raw: &str) -> anyhow::Result<FileNaming> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "fixed" => Ok(FileNaming::Fixed),
        "timestamped" => Ok(FileNaming::Timestamped),
        other => bail!("unknown file naming '{other}' (expected fixed or timestamped)"),
    }
}

pub fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
