// Configuration loading and parsing (config/bot.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Immutable process-wide configuration. Built once at startup and shared
/// read-only; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub board: BoardConfig,
    pub ingest: IngestConfig,
    pub images: ImageConfig,
    pub server_port: u16,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// bot.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire bot.toml file.
#[derive(Debug, Clone, Deserialize)]
struct BotFile {
    board: BoardConfig,
    server: ServerSection,
    database: DatabaseSection,
    ingest: IngestConfig,
    images: ImageConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// Everything the fetcher and selectors need to talk to the board: base
/// address, request timeout, per-flow page sizes, and the label → srCategoryId
/// table the board's list view understands.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub address: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_today_page_size")]
    pub today_page_size: usize,
    #[serde(default = "default_category_page_size")]
    pub category_page_size: usize,
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
    pub categories: HashMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_page_size")]
    pub page_size: usize,
    #[serde(default = "default_ingest_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// Thumbnail pool for carousel cards (schedule items have no real
    /// thumbnail, so one is picked from this pool).
    pub carousel_pool: Vec<String>,
    /// 1x1 image used by the "no notices" placeholder card.
    pub placeholder: String,
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_ingest_page_size() -> usize {
    15
}

fn default_today_page_size() -> usize {
    30
}

fn default_category_page_size() -> usize {
    5
}

fn default_search_page_size() -> usize {
    7
}

fn default_ingest_interval_secs() -> u64 {
    1800
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/bot.toml` relative to the
/// given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("bot.toml");
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;

    let file: BotFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        board: file.board,
        ingest: file.ingest,
        images: file.images,
        server_port: file.server.port,
        db_path: file.database.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure the config file exists by copying missing ones from `defaults/`.
/// Returns the list of files that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, skip it
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if reqwest::Url::parse(&config.board.address).is_err() {
        return Err(ConfigError::ValidationError {
            field: "board.address".into(),
            message: format!("must be an absolute URL, got {:?}", config.board.address),
        });
    }

    if config.board.timeout_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "board.timeout_ms".into(),
            message: "must be greater than 0".into(),
        });
    }

    let page_sizes: &[(&str, usize)] = &[
        ("board.today_page_size", config.board.today_page_size),
        ("board.category_page_size", config.board.category_page_size),
        ("board.search_page_size", config.board.search_page_size),
        ("ingest.page_size", config.ingest.page_size),
    ];
    for (name, val) in page_sizes {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if config.board.categories.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "board.categories".into(),
            message: "must list at least one category".into(),
        });
    }

    if config.ingest.interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "ingest.interval_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.images.carousel_pool.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "images.carousel_pool".into(),
            message: "must list at least one image URL".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the path to the notice-bot project root (works whether
    /// `cargo test` runs from the crate root or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("notice-bot/defaults").exists() {
            cwd.join("notice-bot")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    #[test]
    fn load_valid_config_from_default_file() {
        let tmp = std::env::temp_dir().join("noticebot_config_valid");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let root = project_root();
        fs::copy(
            root.join("defaults/bot.toml"),
            tmp.join("config/bot.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(
            config.board.address,
            "https://www.ajou.ac.kr/kr/ajou/notice.do"
        );
        assert_eq!(config.board.timeout_ms, 2000);
        assert_eq!(config.board.today_page_size, 30);
        assert_eq!(config.board.category_page_size, 5);
        assert_eq!(config.board.search_page_size, 7);
        assert_eq!(config.board.categories.get("학사"), Some(&1));
        assert_eq!(config.board.categories.get("학사일정"), Some(&168));
        // "파란학기" and "파란학기제" are aliases for the same board category.
        assert_eq!(config.board.categories.get("파란학기"), Some(&167));
        assert_eq!(config.board.categories.get("파란학기제"), Some(&167));

        assert_eq!(config.server_port, 8000);
        assert_eq!(config.db_path, "notice-bot.db");
        assert_eq!(config.ingest.page_size, 15);
        assert_eq!(config.ingest.interval_secs, 1800);
        assert_eq!(config.images.carousel_pool.len(), 3);
        assert!(config.images.placeholder.ends_with("1x1.jpg"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_bot_toml() {
        let tmp = std::env::temp_dir().join("noticebot_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with("bot.toml"));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = std::env::temp_dir().join("noticebot_config_invalid");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        fs::write(tmp.join("config/bot.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("bot.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_page_size() {
        let tmp = std::env::temp_dir().join("noticebot_config_zero_page");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let root = project_root();
        let text = fs::read_to_string(root.join("defaults/bot.toml")).unwrap();
        let modified = text.replace("today_page_size = 30", "today_page_size = 0");
        fs::write(tmp.join("config/bot.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "board.today_page_size");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp = std::env::temp_dir().join("noticebot_config_zero_timeout");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let root = project_root();
        let text = fs::read_to_string(root.join("defaults/bot.toml")).unwrap();
        let modified = text.replace("timeout_ms = 2000", "timeout_ms = 0");
        fs::write(tmp.join("config/bot.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "board.timeout_ms");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_relative_board_address() {
        let tmp = std::env::temp_dir().join("noticebot_config_bad_address");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let root = project_root();
        let text = fs::read_to_string(root.join("defaults/bot.toml")).unwrap();
        let modified = text.replace(
            "address = \"https://www.ajou.ac.kr/kr/ajou/notice.do\"",
            "address = \"/kr/ajou/notice.do\"",
        );
        fs::write(tmp.join("config/bot.toml"), modified).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "board.address");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("noticebot_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/bot.toml"), defaults_dir.join("bot.toml")).unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.join("config/bot.toml").exists());

        // A second run copies nothing.
        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("noticebot_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/bot.toml"), defaults_dir.join("bot.toml")).unwrap();
        fs::write(config_dir.join("bot.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert!(copied.is_empty());

        let content = fs::read_to_string(config_dir.join("bot.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("noticebot_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
