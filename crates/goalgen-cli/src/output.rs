use goalgen_core::diagnostic::ValidationOutcome;
use serde::Serialize;

/// How many info suggestions to show before collapsing to a count.
const INFO_DISPLAY_LIMIT: usize = 3;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a validation outcome grouped by severity: errors and warnings in
/// full, info suggestions truncated past the first few.
pub fn print_outcome(outcome: &ValidationOutcome, errors_only: bool, suppress_infos: bool) {
    for d in outcome.errors() {
        println!("{d}");
    }
    if errors_only {
        return;
    }

    for d in outcome.warnings() {
        println!("{d}");
    }
    if suppress_infos {
        return;
    }

    let infos: Vec<_> = outcome.infos().collect();
    for d in infos.iter().take(INFO_DISPLAY_LIMIT) {
        println!("{d}");
    }
    if infos.len() > INFO_DISPLAY_LIMIT {
        println!("... and {} more suggestions", infos.len() - INFO_DISPLAY_LIMIT);
    }
}
