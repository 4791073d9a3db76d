use serde::Deserialize;
use std::env;
use std::path::PathBuf;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => Some(PathBuf::from(val.trim())),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PieConfig {
    pub atomizer: AtomizerConfig,
    pub storage: StorageConfig,
    pub themes: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AtomizerConfig {
    /// Upper bound on the number of keywords kept per entry.
    pub keyword_limit: usize,
}

impl Default for AtomizerConfig {
    fn default() -> Self {
        Self { keyword_limit: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Optional overrides for the built-in theme keyword banks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeConfig {
    /// JSON bank used by the associator
    pub theme_bank_path: Option<PathBuf>,
    /// JSON bank used by the grouping service
    pub grouping_bank_path: Option<PathBuf>,
}

impl Default for PieConfig {
    fn default() -> Self {
        let keyword_limit = parse_env_or("PIE_KEYWORD_LIMIT", 10usize);
        Self {
            atomizer: AtomizerConfig {
                keyword_limit: if keyword_limit == 0 {
                    tracing::warn!("PIE_KEYWORD_LIMIT must be positive. Using default.");
                    10
                } else {
                    keyword_limit
                },
            },
            storage: StorageConfig {
                data_dir: env_path("PIE_DATA_DIR").unwrap_or_else(|| PathBuf::from(".pie")),
            },
            themes: ThemeConfig {
                theme_bank_path: env_path("PIE_THEME_BANK_PATH"),
                grouping_bank_path: env_path("PIE_GROUPING_BANK_PATH"),
            },
        }
    }
}

impl PieConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Read a `.env` file (if any) before resolving the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }
}
