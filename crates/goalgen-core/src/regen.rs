use crate::manifest::Manifest;
use serde::Serialize;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Why a file is being regenerated or preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenReason {
    Forced,
    Missing,
    FullRun,
    UserModified,
    Unchanged,
}

impl fmt::Display for RegenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegenReason::Forced => "forced regeneration",
            RegenReason::Missing => "file does not exist",
            RegenReason::FullRun => "full regeneration (not incremental)",
            RegenReason::UserModified => "file was modified by user (skipping to preserve changes)",
            RegenReason::Unchanged => "file unchanged (skipping)",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegenDecision {
    pub regenerate: bool,
    pub reason: RegenReason,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Decide whether a generator should overwrite `file_path`.
///
/// Precedence: force, then missing file, then full (non-incremental) mode,
/// then user modification. The policy is intentionally conservative — in
/// incremental mode it never regenerates a file the user has touched, even
/// when the new spec nominally affects it. That can leave the file stale
/// relative to the spec; callers must surface the preservation per file
/// rather than resolve it silently.
///
/// Total: never errors, always returns a decision.
pub fn should_regenerate(
    file_path: &Path,
    manifest: &Manifest,
    incremental: bool,
    force: bool,
) -> RegenDecision {
    if force {
        return RegenDecision {
            regenerate: true,
            reason: RegenReason::Forced,
        };
    }

    if !file_path.exists() {
        return RegenDecision {
            regenerate: true,
            reason: RegenReason::Missing,
        };
    }

    if !incremental {
        return RegenDecision {
            regenerate: true,
            reason: RegenReason::FullRun,
        };
    }

    if manifest.is_modified(file_path) {
        return RegenDecision {
            regenerate: false,
            reason: RegenReason::UserModified,
        };
    }

    RegenDecision {
        regenerate: false,
        reason: RegenReason::Unchanged,
    }
}
