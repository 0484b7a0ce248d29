use crate::CliResult;
use splitmint_domain::{LedgerPolicy, SplitRounding, TieBreak};
use std::{env, str::FromStr};

pub const SPLIT_ROUNDING_VAR: &str = "SPLITMINT_SPLIT_ROUNDING";
pub const TIE_BREAK_VAR: &str = "SPLITMINT_TIE_BREAK";
pub const OUTPUT_VAR: &str = "SPLITMINT_OUTPUT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Interpreter settings, read from the environment (and `.env`, if present).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub policy: LedgerPolicy,
    pub output: OutputFormat,
}

impl AppConfig {
    pub fn from_env() -> CliResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from `lookup`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(SPLIT_ROUNDING_VAR) {
            config.policy.split_rounding = value
                .parse::<SplitRounding>()
                .map_err(|err| format!("{SPLIT_ROUNDING_VAR}: {err}"))?;
        }
        if let Some(value) = lookup(TIE_BREAK_VAR) {
            config.policy.tie_break = value
                .parse::<TieBreak>()
                .map_err(|err| format!("{TIE_BREAK_VAR}: {err}"))?;
        }
        if let Some(value) = lookup(OUTPUT_VAR) {
            config.output = value
                .parse()
                .map_err(|err| format!("{OUTPUT_VAR}: {err}"))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.policy, LedgerPolicy::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            (SPLIT_ROUNDING_VAR, "parity"),
            (TIE_BREAK_VAR, "participant-id"),
            (OUTPUT_VAR, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.policy.split_rounding, SplitRounding::Parity);
        assert_eq!(config.policy.tie_break, TieBreak::ParticipantId);
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[rstest]
    #[case::rounding(SPLIT_ROUNDING_VAR, "banker", "SPLITMINT_SPLIT_ROUNDING: unknown split rounding 'banker'")]
    #[case::tie_break(TIE_BREAK_VAR, "random", "SPLITMINT_TIE_BREAK: unknown tie break 'random'")]
    #[case::output(OUTPUT_VAR, "yaml", "SPLITMINT_OUTPUT: unknown output format 'yaml'")]
    fn rejects_unknown_values(#[case] key: &str, #[case] value: &str, #[case] expected: &str) {
        let err = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
        assert_eq!(err, expected);
    }
}
