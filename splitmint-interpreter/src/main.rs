#![warn(clippy::uninlined_format_args)]

mod config;
mod ledger;
mod render;

use std::{borrow::Cow, env, fs, io, process};

use config::AppConfig;
use splitmint_parser::parse_program;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    init_logging();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> CliResult<()> {
    let Some(path) = env::args().nth(1) else {
        return Err("Usage: splitmint <ledger file>".into());
    };

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, path = %path, "Configuration loaded");

    let source =
        fs::read_to_string(&path).map_err(|err| format!("Failed to read '{path}': {err}"))?;

    let output = run_source(&source, &config)?;
    print!("{output}");
    Ok(())
}

fn run_source(source: &str, config: &AppConfig) -> CliResult<String> {
    let program = parse_program(source).map_err(|err| err.to_string())?;
    let reports = ledger::evaluate(&program, config.policy)?;
    render::render(&reports, config.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use rstest::rstest;
    use splitmint_domain::{LedgerPolicy, SplitRounding};

    #[rstest]
    #[case::syntax("MEMBERS := a b\na spent 10", "Syntax error at line 2: unexpected input near 'spent 10'")]
    #[case::empty("", "Ledger must start with a `MEMBERS := ...` declaration")]
    fn errors_become_messages(#[case] source: &str, #[case] expected: &str) {
        let err = run_source(source, &AppConfig::default()).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn rounding_policy_reaches_the_calculator() {
        let source = "MEMBERS := a b c\na paid 10 split percent a=33.333 b=33.333 c=33.334\n!balances";
        let parity = AppConfig {
            policy: LedgerPolicy {
                split_rounding: SplitRounding::Parity,
                ..LedgerPolicy::default()
            },
            output: OutputFormat::Text,
        };

        let corrected = run_source(source, &AppConfig::default()).unwrap();
        let uncorrected = run_source(source, &parity).unwrap();

        assert!(corrected.contains("a  paid 10.00  share 3.34  balance 6.66"));
        assert!(uncorrected.contains("a  paid 10.00  share 3.33  balance 6.67"));
    }
}
