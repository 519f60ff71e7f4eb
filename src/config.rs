//! Configuration for evidra.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (EVIDRA_HOME, EVIDRA_JOURNAL)
//! 2. Config file (.evidra/config.yaml)
//! 3. Defaults (~/.evidra)
//!
//! Config file discovery:
//! - Searches current directory and parents for .evidra/config.yaml
//! - Paths in config file are relative to the .evidra/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::DEFAULT_CHANGE_LOG;
use crate::intake::AttachmentPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub evidence: Option<EvidenceConfig>,
    #[serde(default)]
    pub attachments: Option<AttachmentsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .evidra/)
    pub home: Option<String>,
    /// Journal file (relative to .evidra/)
    pub journal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceConfig {
    pub default_change_log: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentsConfig {
    pub max_size_bytes: Option<u64>,
    pub denylist: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to evidra home (state)
    pub home: PathBuf,
    /// Absolute path to the evidence journal
    pub journal: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Change log used for first versions submitted without one
    pub default_change_log: String,
    /// Attachment intake limits
    pub attachments: AttachmentPolicy,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".evidra").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge a parsed config file over the defaults
fn resolve(
    config: Option<(&Path, &ConfigFile)>,
    default_home: PathBuf,
    env_home: Option<String>,
    env_journal: Option<String>,
) -> ResolvedConfig {
    let mut home = default_home;
    let mut journal = None;
    let mut default_change_log = DEFAULT_CHANGE_LOG.to_string();
    let mut attachments = AttachmentPolicy::default();
    let mut config_file = None;

    if let Some((config_path, config)) = config {
        // Paths are relative to .evidra/
        let evidra_dir = config_path.parent().unwrap_or(Path::new("."));

        if let Some(ref home_path) = config.paths.home {
            home = resolve_path(evidra_dir, home_path);
        }
        if let Some(ref journal_path) = config.paths.journal {
            journal = Some(resolve_path(evidra_dir, journal_path));
        }
        if let Some(log) = config
            .evidence
            .as_ref()
            .and_then(|e| e.default_change_log.clone())
            .filter(|log| !log.trim().is_empty())
        {
            default_change_log = log;
        }
        if let Some(ref limits) = config.attachments {
            if let Some(max) = limits.max_size_bytes {
                attachments.max_size_bytes = max;
            }
            if let Some(ref denylist) = limits.denylist {
                attachments.denylist_patterns = denylist.clone();
            }
        }
        config_file = Some(config_path.to_path_buf());
    }

    if let Some(env_home) = env_home {
        home = PathBuf::from(env_home);
    }
    let journal = env_journal
        .map(PathBuf::from)
        .or(journal)
        .unwrap_or_else(|| home.join("evidence.jsonl"));

    ResolvedConfig {
        home,
        journal,
        config_file,
        default_change_log,
        attachments,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".evidra");

    let config = match find_config_file() {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    Ok(resolve(
        config.as_ref().map(|(path, parsed)| (path.as_path(), parsed)),
        default_home,
        std::env::var("EVIDRA_HOME").ok(),
        std::env::var("EVIDRA_JOURNAL").ok(),
    ))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let home = PathBuf::from("/home/user/.evidra");
        let config = resolve(None, home.clone(), None, None);

        assert_eq!(config.home, home);
        assert_eq!(config.journal, home.join("evidence.jsonl"));
        assert_eq!(config.default_change_log, "Version initiale");
        assert_eq!(config.attachments.max_size_bytes, 10 * 1024 * 1024);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let evidra_dir = temp.path().join(".evidra");
        std::fs::create_dir_all(&evidra_dir).unwrap();

        let config_path = evidra_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  journal: ./state/iso27001.jsonl
evidence:
  default_change_log: Initial version
attachments:
  max_size_bytes: 2048
  denylist:
    - "**/*.key"
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.paths.home, Some("./state".to_string()));

        let config = resolve(
            Some((config_path.as_path(), &parsed)),
            PathBuf::from("/unused"),
            None,
            None,
        );
        assert_eq!(config.home, evidra_dir.join("./state"));
        assert_eq!(config.journal, evidra_dir.join("./state/iso27001.jsonl"));
        assert_eq!(config.default_change_log, "Initial version");
        assert_eq!(config.attachments.max_size_bytes, 2048);
        assert_eq!(config.attachments.denylist_patterns, vec!["**/*.key"]);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = resolve(
            None,
            PathBuf::from("/default"),
            Some("/env/home".to_string()),
            None,
        );
        assert_eq!(config.journal, PathBuf::from("/env/home/evidence.jsonl"));

        let config = resolve(
            None,
            PathBuf::from("/default"),
            Some("/env/home".to_string()),
            Some("/env/journal.jsonl".to_string()),
        );
        assert_eq!(config.home, PathBuf::from("/env/home"));
        assert_eq!(config.journal, PathBuf::from("/env/journal.jsonl"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
