use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const GOALGEN_DIR: &str = ".goalgen";
pub const MANIFEST_FILE: &str = ".goalgen/manifest.json";
pub const LOCK_FILE: &str = ".goalgen/lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn goalgen_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(GOALGEN_DIR)
}

pub fn manifest_path(out_dir: &Path) -> PathBuf {
    out_dir.join(MANIFEST_FILE)
}

pub fn lock_path(out_dir: &Path) -> PathBuf {
    out_dir.join(LOCK_FILE)
}

/// Make `path` relative to `out_dir` when possible, normalized to
/// forward-slash form so manifest keys are stable across platforms.
pub fn relative_key(out_dir: &Path, path: &Path) -> Option<String> {
    let rel = if path.is_absolute() {
        path.strip_prefix(out_dir).ok()?
    } else {
        path
    };
    let mut parts = Vec::new();
    for comp in rel.components() {
        parts.push(comp.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}
