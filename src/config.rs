use anyhow::{Context, Result};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "Europe/Dublin";

/// Runtime configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    /// Reference timezone: network timestamps arrive in UTC and are converted
    /// to this zone before storage and bucketing.
    pub display_timezone: Tz,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env_optional_string("GREENHOUSE_DATABASE_URL")
            .context("GREENHOUSE_DATABASE_URL must be set")?;

        let timezone_name = env_string("GREENHOUSE_TIMEZONE", DEFAULT_TIMEZONE);
        let display_timezone = timezone_name
            .parse::<Tz>()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("GREENHOUSE_TIMEZONE is not a valid IANA zone: {timezone_name}"))?;

        Ok(Self {
            database_url,
            display_timezone,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timezone_parses() {
        let tz = DEFAULT_TIMEZONE.parse::<Tz>().expect("default zone");
        assert_eq!(tz, chrono_tz::Europe::Dublin);
    }

    #[test]
    fn env_string_falls_back_on_missing_or_blank() {
        assert_eq!(env_string("GREENHOUSE_TEST_UNSET_VAR", "fallback"), "fallback");
    }
}
