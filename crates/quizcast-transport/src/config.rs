//! Service configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Telegram connection settings.
///
/// Note: Custom Debug impl masks the bot token to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; supports `${VAR}` references.
    pub token: String,
    /// API base URL override, for tests.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// When to fire the scheduled broadcast trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Weekday names, e.g. ["mon", "wed", "fri"].
    #[serde(default = "default_weekdays")]
    pub weekdays: Vec<String>,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

fn default_weekdays() -> Vec<String> {
    vec!["mon".into(), "wed".into(), "fri".into()]
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekdays: default_weekdays(),
            hour: 0,
            minute: 0,
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured weekday names.
    pub fn parsed_weekdays(&self) -> Result<Vec<Weekday>> {
        self.weekdays
            .iter()
            .map(|w| {
                Weekday::from_str(w).map_err(|_| anyhow::anyhow!("unknown weekday: {w}"))
            })
            .collect()
    }
}

/// Top-level quizcast configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizcastConfig {
    pub telegram: TelegramConfig,
    /// The single privileged operator; admin commands from anyone else
    /// are ignored.
    pub admin_id: i64,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Max concurrent delivery attempts per broadcast.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// getUpdates long-poll timeout.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Optional authoring file or directory loaded at startup.
    #[serde(default)]
    pub assignments_path: Option<PathBuf>,
}

fn default_parallelism() -> usize {
    8
}

fn default_poll_timeout() -> u64 {
    25
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizcast.toml` in the current directory
/// 2. `~/.config/quizcast/config.toml`
///
/// Environment variable override: `QUIZCAST_TELEGRAM_TOKEN`.
pub fn load_config() -> Result<QuizcastConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizcastConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            p.to_path_buf()
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizcast.toml");
        if local.exists() {
            local
        } else if let Some(global) = dirs_path().map(|d| d.join("config.toml")) {
            if global.exists() {
                global
            } else {
                anyhow::bail!("no quizcast.toml found; run `quizcast init` first");
            }
        } else {
            anyhow::bail!("no quizcast.toml found; run `quizcast init` first");
        }
    };

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config: {}", config_path.display()))?;
    let mut config: QuizcastConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse config: {}", config_path.display()))?;

    if let Ok(token) = std::env::var("QUIZCAST_TELEGRAM_TOKEN") {
        config.telegram.token = token;
    }
    config.telegram.token = resolve_env_vars(&config.telegram.token);
    config.telegram.base_url = config
        .telegram
        .base_url
        .as_ref()
        .map(|u| resolve_env_vars(u));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizcast"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
admin_id = 123456789

[telegram]
token = "test-token"

[schedule]
weekdays = ["mon", "wed", "fri"]
hour = 9
minute = 30
"#;

    #[test]
    fn parse_full_config() {
        let config: QuizcastConfig = toml::from_str(VALID_CONFIG).unwrap();
        assert_eq!(config.admin_id, 123456789);
        assert_eq!(config.telegram.token, "test-token");
        assert_eq!(config.schedule.hour, 9);
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.poll_timeout_secs, 25);
    }

    #[test]
    fn schedule_defaults() {
        let config: QuizcastConfig =
            toml::from_str("admin_id = 1\n[telegram]\ntoken = \"t\"\n").unwrap();
        assert_eq!(config.schedule.weekdays, vec!["mon", "wed", "fri"]);
        assert_eq!(config.schedule.hour, 0);
        assert_eq!(config.schedule.minute, 0);
    }

    #[test]
    fn parsed_weekdays() {
        let schedule = ScheduleConfig::default();
        let days = schedule.parsed_weekdays().unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);

        let bad = ScheduleConfig {
            weekdays: vec!["noday".into()],
            ..ScheduleConfig::default()
        };
        assert!(bad.parsed_weekdays().is_err());
    }

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZCAST_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZCAST_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("bot${_QUIZCAST_TEST_VAR}token"),
            "bothellotoken"
        );
        std::env::remove_var("_QUIZCAST_TEST_VAR");
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizcast.toml");
        std::fs::write(&path, VALID_CONFIG).unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.admin_id, 123456789);
    }

    #[test]
    fn missing_explicit_path_fails() {
        let result = load_config_from(Some(Path::new("/nonexistent/quizcast.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn debug_masks_token() {
        let config: QuizcastConfig = toml::from_str(VALID_CONFIG).unwrap();
        let debug = format!("{:?}", config.telegram);
        assert!(!debug.contains("test-token"));
        assert!(debug.contains("***"));
    }
}
