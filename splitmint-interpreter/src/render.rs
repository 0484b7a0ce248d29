use crate::{CliResult, config::OutputFormat, ledger::Report};
use splitmint_domain::{GroupBalances, Settlement};
use std::fmt::Write;

pub fn render(reports: &[Report], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => serde_json::to_string_pretty(reports)
            .map_err(|err| format!("Failed to serialize output: {err}").into()),
    }
}

fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();
    for (idx, report) in reports.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        match report {
            Report::Balances { line, balances } => write_balances(&mut out, *line, balances),
            Report::Settlement { line, settlement } => {
                write_settlement(&mut out, *line, settlement)
            }
        }
    }
    out
}

fn heading(title: &str, line: Option<usize>) -> String {
    match line {
        Some(line) => format!("{title} (line {line})"),
        None => title.to_string(),
    }
}

fn write_balances(out: &mut String, line: Option<usize>, balances: &GroupBalances) {
    let _ = writeln!(out, "{}", heading("Balances", line));
    let width = balances
        .summaries
        .keys()
        .map(|id| id.as_str().chars().count())
        .max()
        .unwrap_or(0);

    for (id, summary) in &balances.summaries {
        let _ = writeln!(
            out,
            "  {id:<width$}  paid {}  share {}  balance {}  adjusted {}  remaining {}",
            summary.paid, summary.share, summary.flow, summary.adjusted, summary.remaining_budget,
        );
    }
    let _ = writeln!(out, "  total spend {}", balances.total_spend);
}

fn write_settlement(out: &mut String, line: Option<usize>, settlement: &Settlement) {
    let _ = writeln!(out, "{}", heading("Settlement", line));
    if settlement.transfers.is_empty() {
        let _ = writeln!(out, "  nothing to settle");
    }
    for transfer in &settlement.transfers {
        let _ = writeln!(
            out,
            "  {} -> {}: {}",
            transfer.from, transfer.to, transfer.amount
        );
    }
    if let Some(warning) = &settlement.warning {
        let _ = writeln!(out, "  warning: {warning}");
    }
}
