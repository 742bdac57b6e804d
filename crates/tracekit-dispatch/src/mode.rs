//! Process mode (§4.2): set once at initialization, immutable thereafter.

use std::str::FromStr;

use strum::EnumString;

pub const MODE_ENV_VAR: &str = "TUSK_DRIFT_MODE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Disabled,
    Record,
    Replay,
}

impl Mode {
    /// Read `TUSK_DRIFT_MODE` from the process environment, defaulting to
    /// `DISABLED` if unset or unrecognized.
    pub fn from_env() -> Self {
        std::env::var(MODE_ENV_VAR)
            .ok()
            .and_then(|v| Mode::from_str(&v).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes_case_insensitively() {
        assert_eq!(Mode::from_str("record").unwrap(), Mode::Record);
        assert_eq!(Mode::from_str("REPLAY").unwrap(), Mode::Replay);
        assert_eq!(Mode::from_str("Disabled").unwrap(), Mode::Disabled);
    }

    #[test]
    fn unknown_string_is_an_error() {
        assert!(Mode::from_str("bogus").is_err());
    }
}
