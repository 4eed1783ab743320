use crate::output::{print_json, print_outcome};
use goalgen_core::spec::Spec;
use goalgen_core::validator;
use std::path::PathBuf;

pub fn run(
    specs: &[PathBuf],
    errors_only: bool,
    warnings: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut invalid = 0usize;
    let mut json_results = Vec::new();

    for path in specs {
        let spec = match Spec::load(path) {
            Ok(spec) => spec,
            Err(e) => {
                invalid += 1;
                if json {
                    json_results.push(serde_json::json!({
                        "spec": path,
                        "valid": false,
                        "load_error": e.to_string(),
                    }));
                } else {
                    println!("{}: failed to load: {e}", path.display());
                }
                continue;
            }
        };

        let outcome = validator::validate(spec.value());
        if !outcome.is_valid {
            invalid += 1;
        }

        if json {
            json_results.push(serde_json::json!({
                "spec": path,
                "valid": outcome.is_valid,
                "errors": outcome.errors().count(),
                "warnings": outcome.warnings().count(),
                "infos": outcome.infos().count(),
                "diagnostics": &outcome.diagnostics,
            }));
            continue;
        }

        if specs.len() > 1 {
            println!("== {}", path.display());
        }
        print_outcome(&outcome, errors_only, warnings);
        if outcome.is_valid {
            println!("{}: valid", path.display());
        } else {
            println!(
                "{}: invalid ({} error(s))",
                path.display(),
                outcome.error_count()
            );
        }
    }

    if json {
        print_json(&json_results)?;
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} of {} spec(s) failed validation", specs.len());
    }
    Ok(())
}
