use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRIGGER_HOUR: u8 = 8; // matches go out at 08:00 UTC
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Top-level config (pairbot.toml + PAIRBOT_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PairbotConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Register slash commands per guild on ready (instant) instead of globally
    /// (which can take up to an hour to propagate).
    #[serde(default = "bool_true")]
    pub guild_commands: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            guild_commands: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// When the daily matching run fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Hour of day (UTC, 0-23) at or after which the daily run fires.
    #[serde(default = "default_trigger_hour")]
    pub trigger_hour: u8,
    /// How often the trigger checks the clock.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            trigger_hour: DEFAULT_TRIGGER_HOUR,
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_trigger_hour() -> u8 {
    DEFAULT_TRIGGER_HOUR
}
fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pairbot/pairbot.db", home)
}

impl PairbotConfig {
    /// Load config from a TOML file with PAIRBOT_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.pairbot/pairbot.toml
    ///
    /// Nested keys use a double underscore: `PAIRBOT_DISCORD__BOT_TOKEN`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: PairbotConfig = Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::PairbotError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(PairbotConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("PAIRBOT_").split("__"))
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.pairing.trigger_hour > 23 {
            return Err(crate::error::PairbotError::Config(format!(
                "pairing.trigger_hour must be 0-23, got {}",
                self.pairing.trigger_hour
            )));
        }
        if self.pairing.check_interval_secs == 0 {
            return Err(crate::error::PairbotError::Config(
                "pairing.check_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.pairbot/pairbot.toml", home)
}
