// config.rs - Configuration Module
// Reads bot settings from an optional botconfig.txt and from the process environment.
//
// Key Features:
// - Multi-path botconfig.txt lookup (KEY=VALUE, # comments, BOM tolerant)
// - Values from the file are exported to the environment so both sources look the same
// - BotConfig::from_lookup parses from any key lookup, which keeps it testable
//
// Used by: main.rs (startup), every command through CommandContext::config

use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_PREFIX: &str = ".";
const DEFAULT_ASSETS_DIR: &str = "assets";
const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";

const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

/// Bot settings, built once at startup and shared read-only afterwards
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub auth_token: String,
    pub prefix: String,
    pub debug: bool,
    pub silly_replies: bool,
    pub redis_url: Option<String>,
    pub redis_password: Option<String>,
    pub derpi_api_key: Option<String>,
    pub assets_dir: PathBuf,
}

impl BotConfig {
    /// Read everything from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let auth_token = get("DISCORD_AUTH_TOKEN").ok_or(ConfigError::Missing("DISCORD_AUTH_TOKEN"))?;
        if auth_token == TOKEN_PLACEHOLDER {
            return Err(ConfigError::Placeholder { key: "DISCORD_AUTH_TOKEN" });
        }

        // Whitespace-only prefixes would never match a message
        let prefix = match lookup("COMMAND_PREFIX") {
            Some(p) if p.trim().is_empty() && !p.is_empty() => {
                return Err(ConfigError::InvalidValue { key: "COMMAND_PREFIX", value: p });
            }
            Some(p) if !p.is_empty() => p.trim().to_string(),
            _ => DEFAULT_PREFIX.to_string(),
        };

        let debug = parse_flag("DEBUG_OUTPUT", get("DEBUG_OUTPUT"), true)?;
        let silly_replies = parse_flag("SILLY_COMMANDS", get("SILLY_COMMANDS"), true)?;

        Ok(BotConfig {
            auth_token,
            prefix,
            debug,
            silly_replies,
            redis_url: get("REDIS_URL"),
            redis_password: get("REDIS_PASSWORD"),
            derpi_api_key: get("DERPI_API_KEY"),
            assets_dir: get("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
        })
    }

    pub fn persistence_enabled(&self) -> bool {
        self.redis_url.is_some()
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

/// Load botconfig.txt from the first path that exists and export its values to the
/// environment. Returns the path that was used, or None when no file was found
/// (the environment alone is then expected to carry the settings).
pub fn load_bot_config() -> Option<&'static str> {
    for config_path in &CONFIG_PATHS {
        let Ok(content) = fs::read_to_string(config_path) else {
            continue;
        };

        for (key, value) in parse_config_lines(&content) {
            env::set_var(key, value);
        }
        return Some(*config_path);
    }
    None
}

/// Parse KEY=VALUE lines, skipping blanks and # comments
fn parse_config_lines(content: &str) -> Vec<(String, String)> {
    // Remove BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
