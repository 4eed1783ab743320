use crate::output::{print_json, print_outcome};
use anyhow::Context;
use goalgen_core::generate::{parse_targets, GenerationRun, Target};
use goalgen_core::lock::DirLock;
use goalgen_core::manifest::{Manifest, SpecChangeReport};
use goalgen_core::spec::Spec;
use goalgen_core::validator;
use std::path::Path;

pub struct Options {
    pub dry_run: bool,
    pub incremental: bool,
    pub force: bool,
    pub skip_validation: bool,
    pub json: bool,
}

pub fn run(
    spec_path: &Path,
    out_dir: &Path,
    targets: Option<&str>,
    opts: Options,
) -> anyhow::Result<()> {
    let spec = Spec::load(spec_path).context("failed to load spec")?;

    if !opts.skip_validation {
        let outcome = validator::validate(spec.value());
        if !outcome.is_valid {
            print_outcome(&outcome, true, true);
            anyhow::bail!(
                "spec validation failed with {} error(s); nothing generated",
                outcome.error_count()
            );
        }
        if !opts.json {
            print_outcome(&outcome, false, false);
        }
    }

    let targets = match targets {
        Some(list) => parse_targets(list)?,
        None => Target::ALL.to_vec(),
    };

    goalgen_core::io::ensure_dir(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;
    let _lock = DirLock::acquire(out_dir).context("another generation run is in progress")?;

    let mut manifest = Manifest::load(out_dir);
    if opts.incremental && !opts.json {
        print_change_report(&manifest.detect_spec_changes(&spec));
    }

    let run = GenerationRun::new(
        &spec,
        out_dir,
        &manifest,
        opts.dry_run,
        opts.incremental,
        opts.force,
    )?;
    let report = run.run(&targets)?;

    if !opts.dry_run {
        manifest
            .save(&spec, &report.produced_files())
            .context("failed to save generation manifest")?;
    }

    if opts.json {
        let preserved: Vec<String> = report
            .preserved()
            .map(|o| o.path.display().to_string())
            .collect();
        print_json(&serde_json::json!({
            "out_dir": out_dir,
            "dry_run": opts.dry_run,
            "written": report.written_count(),
            "preserved": preserved,
        }))?;
        return Ok(());
    }

    for outcome in report.preserved() {
        println!("preserved {}: {}", outcome.path.display(), outcome.decision.reason);
    }
    if opts.dry_run {
        println!(
            "Dry run: {} file(s) would be generated into {}",
            report.written_count(),
            out_dir.display()
        );
    } else {
        println!(
            "Generated {} file(s) into {}",
            report.written_count(),
            out_dir.display()
        );
    }
    Ok(())
}

fn print_change_report(changes: &SpecChangeReport) {
    if changes.is_first_generation {
        println!("First generation: no previous manifest found.");
        return;
    }
    if !changes.has_changes() {
        println!("Spec unchanged since last generation.");
        return;
    }
    for name in &changes.added_agents {
        println!("agent added:   {name}");
    }
    for name in &changes.removed_agents {
        println!("agent removed: {name}");
    }
    for name in &changes.added_tools {
        println!("tool added:    {name}");
    }
    for name in &changes.removed_tools {
        println!("tool removed:  {name}");
    }
    if changes.schema_version_changed {
        println!("schema version changed since last generation");
    }
}
