//! Configuration error taxonomy
//!
//! Only data-integrity problems surface as errors. Runtime conditions
//! (full managers, stale targets, degenerate vectors) are handled in place.

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    UnknownWeapon(String),
    UnknownEnemy(String),
    UnknownPowerUp(String),
    UnknownShip(u8),
    MissingShield(String),
    InvalidValue {
        key: String,
        field: &'static str,
        reason: String,
    },
    Parse(serde_json::Error),
    Io(std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWeapon(key) => write!(f, "unknown weapon type '{key}'"),
            Self::UnknownEnemy(key) => write!(f, "unknown enemy type '{key}'"),
            Self::UnknownPowerUp(key) => write!(f, "unknown power-up type '{key}'"),
            Self::UnknownShip(stage) => write!(f, "no ship configured for stage {stage}"),
            Self::MissingShield(key) => write!(f, "missing shield tier '{key}'"),
            Self::InvalidValue { key, field, reason } => {
                write!(f, "invalid value for {key}.{field}: {reason}")
            }
            Self::Parse(err) => write!(f, "catalog parse error: {err}"),
            Self::Io(err) => write!(f, "config i/o error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ConfigError::UnknownEnemy("kraken".into()).to_string(),
            "unknown enemy type 'kraken'"
        );
        assert_eq!(
            ConfigError::invalid("laser", "speed", "must be positive").to_string(),
            "invalid value for laser.speed: must be positive"
        );
    }
}
