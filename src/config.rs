//! Configuration management for tool-scout using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, DEFAULT_TTL_DAYS, MAX_TTL_DAYS};
use crate::extract::{FirecrawlClient, ProviderConfig};
use crate::registry::{BatchDefinition, BatchRegistry, RegistryError};
use crate::repository::{DbContext, DbError};
use crate::scrape::{BatchOrchestrator, RetryPolicy, ScrapeExecutor};
use crate::services::Dispatcher;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "tool-scout.db";

/// Name used for config file discovery.
const CONFIG_NAME: &str = "tool-scout";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// Days a cached batch stays live.
    pub cache_ttl_days: i64,
    /// Retry policy for extraction calls.
    pub retry: RetryPolicy,
    /// Extraction provider settings.
    pub provider: ProviderConfig,
    /// Batch definitions; empty means the built-in registry.
    pub batches: Vec<BatchDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_NAME);

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            cache_ttl_days: DEFAULT_TTL_DAYS,
            retry: RetryPolicy::default(),
            provider: ProviderConfig::default(),
            batches: Vec::new(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Lifetime of a cached batch, between one day and [`MAX_TTL_DAYS`].
    pub fn cache_ttl(&self) -> chrono::Duration {
        let days = self.cache_ttl_days.clamp(1, MAX_TTL_DAYS);
        if days != self.cache_ttl_days {
            tracing::warn!(
                "cache_ttl_days {} out of range, using {}",
                self.cache_ttl_days,
                days
            );
        }
        chrono::Duration::days(days)
    }

    /// Build the batch registry, falling back to the built-in batches.
    pub fn registry(&self) -> Result<BatchRegistry, RegistryError> {
        if self.batches.is_empty() {
            Ok(BatchRegistry::default())
        } else {
            BatchRegistry::new(self.batches.clone())
        }
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> Result<DbContext, DbError> {
        DbContext::from_url(&self.database_url())
    }

    /// Wire the cache, provider client and orchestrator into a dispatcher.
    ///
    /// A missing API key is not an error here; scrapes report it per request.
    pub fn create_dispatcher(&self, ctx: &DbContext) -> anyhow::Result<Dispatcher> {
        let registry = Arc::new(self.registry()?);
        let cache = CacheStore::new(
            Arc::new(ctx.batch_cache()),
            registry.clone(),
            self.cache_ttl(),
        );

        let target_items = self.provider.target_items;
        let client = FirecrawlClient::new(self.provider.clone())?;
        let executor = ScrapeExecutor::new(Arc::new(client), self.retry, target_items);

        Ok(Dispatcher::new(
            cache,
            BatchOrchestrator::new(registry, executor),
        ))
    }

    /// Apply environment overrides read through `var`.
    ///
    /// Supported env vars:
    /// - `DATABASE_URL`: database URL
    /// - `TOOL_SCOUT_CACHE_TTL_DAYS`: cache lifetime in days
    /// - `TOOL_SCOUT_MAX_ATTEMPTS`: extraction attempts per category
    /// - `TOOL_SCOUT_RETRY_DELAY_MS`: base retry delay
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|s| !s.trim().is_empty());

        if let Some(database_url) = var("DATABASE_URL") {
            tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
            self.database_url = Some(database_url);
        }
        if let Some(days) = var("TOOL_SCOUT_CACHE_TTL_DAYS").and_then(|v| v.parse().ok()) {
            self.cache_ttl_days = days;
        }
        if let Some(attempts) = var("TOOL_SCOUT_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.retry = RetryPolicy::new(attempts, self.retry.base_delay);
        }
        if let Some(delay) = var("TOOL_SCOUT_RETRY_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.retry = RetryPolicy::new(
                self.retry.max_attempts,
                std::time::Duration::from_millis(delay),
            );
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Days a cached batch stays live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_days: Option<i64>,
    /// Extraction attempts per category page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Base retry delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    /// Extraction provider configuration.
    #[serde(default, skip_serializing_if = "ProviderConfig::is_default")]
    pub provider: ProviderConfig,
    /// Batch definitions replacing the built-in registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub batches: Vec<BatchDefinition>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers tool-scout config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found, use defaults with env overrides
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        config.provider = config.provider.with_env_overrides();
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(days) = self.cache_ttl_days {
            settings.cache_ttl_days = days;
        }
        if let Some(attempts) = self.max_attempts {
            settings.retry = RetryPolicy::new(attempts, settings.retry.base_delay);
        }
        if let Some(delay) = self.retry_delay_ms {
            settings.retry = RetryPolicy::new(
                settings.retry.max_attempts,
                std::time::Duration::from_millis(delay),
            );
        }
        settings.provider = self.provider.clone();
        if !self.batches.is_empty() {
            settings.batches = self.batches.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
}

/// Resolved `--target` path for SQLite databases.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Directory holding the database.
    pub data_dir: PathBuf,
    /// The database filename.
    pub database_filename: String,
}

impl ResolvedTarget {
    /// Resolve a target path to directory and database filename.
    /// - If path is a .db file, it is the database
    /// - If path is a directory, look for tool-scout.db inside
    pub fn from_path(path: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };

        let is_db_file = path
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
            || (path.exists() && path.is_file());

        if is_db_file {
            let database_filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_DATABASE_FILENAME)
                .to_string();
            Self {
                data_dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
                database_filename,
            }
        } else {
            Self {
                data_dir: path,
                database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            }
        }
    }
}

/// Look for a config file inside the data directory.
fn find_config_in_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = [CONFIG_NAME, "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

/// Load config from file sources.
async fn load_file_config(options: &LoadOptions, target: Option<&ResolvedTarget>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Config::default()
            }
        };
    }

    // Priority 2: Config inside the target dir
    if let Some(config_path) = target.and_then(|t| find_config_in_dir(&t.data_dir)) {
        tracing::debug!("Found config in target dir: {}", config_path.display());
        if let Ok(config) = Config::load_from_path(&config_path).await {
            return config;
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let target = options.target.as_deref().map(ResolvedTarget::from_path);
    let config = load_file_config(&options, target.as_ref()).await;

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    // --target takes precedence over the config file
    if let Some(target) = target {
        settings.data_dir = target.data_dir;
        settings.database_filename = target.database_filename;
    }

    // Environment variables take highest precedence
    settings.apply_env_overrides(|name| std::env::var(name).ok());

    (settings, config)
}
