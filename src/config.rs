//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--graphql-url`, `--page-size`, etc.)
//! 2. `$PROFILE_TREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.profile-tree.toml` in the current working directory
//! 4. Global `~/.config/profile-tree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::graphql::query::DEFAULT_PAGE_SIZE;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Render tick interval in milliseconds.
    pub tick_rate_ms: Option<u64>,
}

/// Backend endpoints.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// GraphQL endpoint serving `listProfileNodes`.
    pub graphql_url: Option<String>,
    /// Base URL of the auth service (`/auth/generate-token`, `/auth/refresh-token`).
    pub auth_url: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

/// Tree panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Children requested per page.
    pub page_size: Option<usize>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `profile_tree_tui=debug`.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_folder_fg: Option<String>,
    pub tree_leaf_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub server: ServerConfig,
    pub tree: TreeConfig,
    pub log: LogConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default GraphQL endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:4000/graphql";
/// Default auth service base URL.
pub const DEFAULT_AUTH_URL: &str = "http://localhost:4000/";
/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default render tick in milliseconds.
pub const DEFAULT_TICK_RATE_MS: u64 = 16;
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path — that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. $PROFILE_TREE_CONFIG environment variable
    if let Ok(env_path) = std::env::var("PROFILE_TREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    // 2. Project-local `.profile-tree.toml` in CWD
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".profile-tree.toml"));
    }

    // 3. Global `~/.config/profile-tree/config.toml`
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("profile-tree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr,
/// since logging is configured from the result).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
                tick_rate_ms: other.general.tick_rate_ms.or(self.general.tick_rate_ms),
            },
            server: ServerConfig {
                graphql_url: other
                    .server
                    .graphql_url
                    .clone()
                    .or(self.server.graphql_url),
                auth_url: other.server.auth_url.clone().or(self.server.auth_url),
                request_timeout_secs: other
                    .server
                    .request_timeout_secs
                    .or(self.server.request_timeout_secs),
            },
            tree: TreeConfig {
                page_size: other.tree.page_size.or(self.tree.page_size),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
            },
            log: LogConfig {
                level: other.log.level.clone().or(self.log.level),
                file: other.log.file.clone().or(self.log.file),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        // Explicit --config file has higher priority than candidates.
        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        // CLI flag overrides are highest priority.
        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn tick_rate_ms(&self) -> u64 {
        self.general.tick_rate_ms.unwrap_or(DEFAULT_TICK_RATE_MS)
    }

    pub fn graphql_url(&self) -> &str {
        self.server
            .graphql_url
            .as_deref()
            .unwrap_or(DEFAULT_GRAPHQL_URL)
    }

    pub fn auth_url(&self) -> &str {
        self.server.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.server
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Children per page; zero is treated as unset.
    pub fn page_size(&self) -> usize {
        self.tree
            .page_size
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log file path: configured, else `<data dir>/profile-tree/ptree.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_ref().map(PathBuf::from).or_else(|| {
            dirs::data_local_dir().map(|dir| dir.join("profile-tree").join("ptree.log"))
        })
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
