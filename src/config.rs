// Process configuration, read from the environment (and a `.env` file if present).
//
// Only the two secrets are mandatory. Every designated channel is optional;
// the feature that needs it simply stays off when it is unset.

use thiserror::Error;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_MUTED_ROLE: &str = "Muted";
const DEFAULT_MOD_ROLE: &str = "Mod";
const DEFAULT_WELCOME: &str =
    "Please pick your roles, read the rules, and drop your intro so we can get to know you.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable! Add it to your .env file.")]
    Missing(&'static str),

    #[error("{name} must be a non-zero numeric ID, got `{value}`")]
    InvalidId { name: &'static str, value: String },

    #[error("{name} has an invalid value `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub database_url: String,
    pub prefix: String,
    pub guild_id: Option<u64>,
    pub monitored_channel_id: Option<u64>,
    pub alert_channel_id: Option<u64>,
    pub welcome_channel_id: Option<u64>,
    pub member_count_channel_id: Option<u64>,
    pub dm_forward_channel_id: Option<u64>,
    pub muted_role_name: String,
    pub mod_role_name: String,
    pub welcome_description: String,
    pub welcome_image_url: Option<String>,
    /// Whether `!command` messages earn XP like any other message.
    pub xp_for_commands: bool,
    /// Snapshots older than this are pruned; `None` keeps them forever.
    pub message_log_retention_days: Option<u32>,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests don't have to touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let id = |name: &'static str| -> Result<Option<u64>, ConfigError> {
            match get(name) {
                None => Ok(None),
                Some(value) => match value.trim().parse::<u64>() {
                    Ok(id) if id != 0 => Ok(Some(id)),
                    _ => Err(ConfigError::InvalidId { name, value }),
                },
            }
        };

        let xp_for_commands = match get("XP_FOR_COMMANDS") {
            None => true,
            Some(value) => value
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "XP_FOR_COMMANDS",
                    value,
                })?,
        };

        let message_log_retention_days = match get("MESSAGE_LOG_RETENTION_DAYS") {
            None => None,
            Some(value) => match value.trim().parse::<u32>() {
                Ok(days) if days > 0 => Some(days),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "MESSAGE_LOG_RETENTION_DAYS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            discord_token,
            database_url,
            prefix: get("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            guild_id: id("GUILD_ID")?,
            monitored_channel_id: id("MONITORED_CHANNEL_ID")?,
            alert_channel_id: id("ALERT_CHANNEL_ID")?,
            welcome_channel_id: id("WELCOME_CHANNEL_ID")?,
            member_count_channel_id: id("MEMBER_COUNT_CHANNEL_ID")?,
            dm_forward_channel_id: id("DM_FORWARD_CHANNEL_ID")?,
            muted_role_name: get("MUTED_ROLE_NAME")
                .unwrap_or_else(|| DEFAULT_MUTED_ROLE.to_string()),
            mod_role_name: get("MOD_ROLE_NAME").unwrap_or_else(|| DEFAULT_MOD_ROLE.to_string()),
            welcome_description: get("WELCOME_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_WELCOME.to_string()),
            welcome_image_url: get("WELCOME_IMAGE_URL"),
            xp_for_commands,
            message_log_retention_days,
        })
    }

    /// Optional channel settings that are unset, in declaration order.
    pub fn disabled_features(&self) -> Vec<&'static str> {
        let optional: [(&'static str, Option<u64>); 5] = [
            ("MONITORED_CHANNEL_ID (ghost pings)", self.monitored_channel_id),
            ("ALERT_CHANNEL_ID (ghost ping alerts)", self.alert_channel_id),
            ("WELCOME_CHANNEL_ID (welcome embeds)", self.welcome_channel_id),
            ("MEMBER_COUNT_CHANNEL_ID (member count)", self.member_count_channel_id),
            ("DM_FORWARD_CHANNEL_ID (DM forwarding)", self.dm_forward_channel_id),
        ];

        optional
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// Log which optional features are off, once at startup.
    pub fn log_disabled_features(&self) {
        for name in self.disabled_features() {
            tracing::warn!("{} is not set; feature disabled", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config =
            BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "t"), ("DATABASE_URL", "sqlite://x")]))
                .unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.muted_role_name, "Muted");
        assert_eq!(config.mod_role_name, "Mod");
        assert!(config.xp_for_commands);
        assert_eq!(config.monitored_channel_id, None);
        assert_eq!(config.message_log_retention_days, None);
    }

    #[test]
    fn secrets_are_required() {
        assert_eq!(
            BotConfig::from_lookup(lookup(&[("DATABASE_URL", "sqlite://x")])).err(),
            Some(ConfigError::Missing("DISCORD_TOKEN"))
        );
        assert_eq!(
            BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "t"), ("DATABASE_URL", "  ")])).err(),
            Some(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn channel_ids_are_parsed() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "t"),
            ("DATABASE_URL", "sqlite://x"),
            ("MONITORED_CHANNEL_ID", "1276579259170951356"),
            ("XP_FOR_COMMANDS", "false"),
            ("MESSAGE_LOG_RETENTION_DAYS", "14"),
        ]))
        .unwrap();

        assert_eq!(config.monitored_channel_id, Some(1276579259170951356));
        assert!(!config.xp_for_commands);
        assert_eq!(config.message_log_retention_days, Some(14));
    }

    #[test]
    fn bad_ids_are_rejected() {
        let err = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "t"),
            ("DATABASE_URL", "sqlite://x"),
            ("ALERT_CHANNEL_ID", "general"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidId { name: "ALERT_CHANNEL_ID", .. }));
    }

    #[test]
    fn disabled_features_are_listed_in_a_stable_order() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "t"),
            ("DATABASE_URL", "sqlite://x"),
            ("ALERT_CHANNEL_ID", "42"),
            ("MEMBER_COUNT_CHANNEL_ID", "43"),
        ]))
        .unwrap();

        assert_eq!(
            config.disabled_features(),
            vec![
                "MONITORED_CHANNEL_ID (ghost pings)",
                "WELCOME_CHANNEL_ID (welcome embeds)",
                "DM_FORWARD_CHANNEL_ID (DM forwarding)",
            ]
        );
    }
}
