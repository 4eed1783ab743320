use crate::error::{GoalgenError, Result};
use crate::fingerprint::{fingerprint_bytes, fingerprint_document};
use crate::io::atomic_write;
use crate::paths;
use crate::spec::Spec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const MANIFEST_FORMAT_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// Persisted shapes
// ---------------------------------------------------------------------------

/// Summary of the spec a generation run consumed. Enough to diff against a
/// future spec without keeping the whole document around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecSummary {
    pub hash: String,
    pub version: String,
    pub schema_version: i64,
    pub agents: Vec<String>,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub hash: String,
    pub generated_at: DateTime<Utc>,
    pub size: u64,
}

/// Record of what changed between the previously generated spec and a new
/// one. Computed, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SpecChangeReport {
    pub added_agents: Vec<String>,
    pub removed_agents: Vec<String>,
    pub added_tools: Vec<String>,
    pub removed_tools: Vec<String>,
    pub schema_version_changed: bool,
    pub is_first_generation: bool,
}

impl SpecChangeReport {
    pub fn has_changes(&self) -> bool {
        !self.added_agents.is_empty()
            || !self.removed_agents.is_empty()
            || !self.added_tools.is_empty()
            || !self.removed_tools.is_empty()
            || self.schema_version_changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ManifestDoc {
    #[serde(default)]
    version: String,
    #[serde(default)]
    generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    spec: Option<SpecSummary>,
    #[serde(default)]
    files: BTreeMap<String, FileRecord>,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Persisted record of the last generation run: a spec summary plus a
/// content fingerprint per produced file.
///
/// The manifest is a change-detector, not a backup — it never stores file
/// content, and restoring a modified file is out of its contract. One
/// manifest exclusively owns one output directory; concurrent runs against
/// the same directory are excluded by [`crate::lock::DirLock`].
#[derive(Debug)]
pub struct Manifest {
    out_dir: PathBuf,
    doc: ManifestDoc,
}

impl Manifest {
    /// Load the manifest for `out_dir`, or start empty if it is absent or
    /// unparsable. Corruption is treated as "no prior generation", never as
    /// a fatal error.
    pub fn load(out_dir: &Path) -> Self {
        let path = paths::manifest_path(out_dir);
        let doc = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| match serde_json::from_str(&text) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(
                        manifest = %path.display(),
                        error = %e,
                        "manifest is unparsable; treating as first generation"
                    );
                    None
                }
            })
            .unwrap_or_default();
        Self {
            out_dir: out_dir.to_path_buf(),
            doc,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        paths::manifest_path(&self.out_dir)
    }

    /// True if a prior generation has been recorded.
    pub fn has_prior_generation(&self) -> bool {
        self.doc.spec.is_some()
    }

    pub fn tracked_files(&self) -> BTreeSet<&str> {
        self.doc.files.keys().map(String::as_str).collect()
    }

    /// Record this run's spec summary and produced files, fully replacing
    /// the prior manifest, then persist it.
    ///
    /// Replacement is deliberate: files produced by an earlier run but not
    /// by this one fall out of tracking (stale-file amnesty). They are not
    /// deleted from disk, and once untracked they are invisible to
    /// [`Manifest::is_modified`] — the drop is logged so it is never silent.
    /// Only files that exist on disk are recorded. Write failures are fatal;
    /// a partially saved manifest is never left behind (the write is
    /// atomic).
    pub fn save(&mut self, spec: &Spec, produced_files: &[PathBuf]) -> Result<()> {
        let now = Utc::now();
        let mut files = BTreeMap::new();
        for path in produced_files {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                self.out_dir.join(path)
            };
            let Some(key) = paths::relative_key(&self.out_dir, path) else {
                continue;
            };
            let Ok(content) = std::fs::read(&full) else {
                continue; // dry-run entries or files a generator skipped
            };
            files.insert(
                key,
                FileRecord {
                    hash: fingerprint_bytes(&content),
                    generated_at: now,
                    size: content.len() as u64,
                },
            );
        }

        let dropped: Vec<&String> = self
            .doc
            .files
            .keys()
            .filter(|k| !files.contains_key(*k))
            .collect();
        if !dropped.is_empty() {
            tracing::warn!(
                count = dropped.len(),
                files = ?dropped,
                "files from the previous run are no longer tracked"
            );
        }

        self.doc = ManifestDoc {
            version: MANIFEST_FORMAT_VERSION.to_string(),
            generated_at: Some(now),
            spec: Some(SpecSummary {
                hash: fingerprint_document(spec.value()),
                version: spec.version().unwrap_or("1.0.0").to_string(),
                schema_version: spec.schema_version(),
                agents: spec.agent_names().into_iter().collect(),
                tools: spec.tool_names().into_iter().collect(),
            }),
            files,
        };

        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(&self.doc)?;
        atomic_write(&path, json.as_bytes()).map_err(|e| match e {
            GoalgenError::Io(source) => GoalgenError::ManifestWrite { path, source },
            other => other,
        })
    }

    /// Has `file_path` been touched since it was generated?
    ///
    /// Untracked paths return false — by definition the manifest cannot
    /// detect modifications to files it never recorded. A tracked file that
    /// no longer exists counts as modified (the user deleted it).
    pub fn is_modified(&self, file_path: &Path) -> bool {
        let Some(key) = paths::relative_key(&self.out_dir, file_path) else {
            return false;
        };
        let Some(record) = self.doc.files.get(&key) else {
            return false;
        };

        let full = self.out_dir.join(&key);
        match std::fs::read(&full) {
            Err(_) => true,
            Ok(content) => fingerprint_bytes(&content) != record.hash,
        }
    }

    /// Diff the recorded spec summary against `new_spec`.
    pub fn detect_spec_changes(&self, new_spec: &Spec) -> SpecChangeReport {
        let new_agents = new_spec.agent_names();
        let new_tools = new_spec.tool_names();

        let Some(old) = &self.doc.spec else {
            // First generation: everything is new, nothing removed.
            return SpecChangeReport {
                added_agents: new_agents.into_iter().collect(),
                removed_agents: Vec::new(),
                added_tools: new_tools.into_iter().collect(),
                removed_tools: Vec::new(),
                schema_version_changed: false,
                is_first_generation: true,
            };
        };

        let old_agents: BTreeSet<String> = old.agents.iter().cloned().collect();
        let old_tools: BTreeSet<String> = old.tools.iter().cloned().collect();

        SpecChangeReport {
            added_agents: new_agents.difference(&old_agents).cloned().collect(),
            removed_agents: old_agents.difference(&new_agents).cloned().collect(),
            added_tools: new_tools.difference(&old_tools).cloned().collect(),
            removed_tools: old_tools.difference(&new_tools).cloned().collect(),
            schema_version_changed: old.schema_version != new_spec.schema_version(),
            is_first_generation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_spec() -> Spec {
        Spec::new(json!({
            "id": "trip",
            "title": "Trip Planner",
            "version": "1.2.0",
            "schema_version": 1,
            "agents": {"sup": {"kind": "supervisor"}, "flights": {"kind": "llm_agent"}},
            "tools": {"search": {"type": "http", "spec": {"url": "https://x", "method": "GET"}}}
        }))
    }

    fn write_out_file(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_is_empty_when_no_manifest_exists() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(dir.path());
        assert!(!manifest.has_prior_generation());
        assert!(manifest.tracked_files().is_empty());
    }

    #[test]
    fn load_treats_corrupt_manifest_as_first_generation() {
        let dir = TempDir::new().unwrap();
        write_out_file(&dir, ".goalgen/manifest.json", "{not json at all");
        let manifest = Manifest::load(dir.path());
        assert!(!manifest.has_prior_generation());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let spec = sample_spec();
        let a = write_out_file(&dir, "README.md", "# Trip Planner\n");
        let b = write_out_file(&dir, "infra/main.bicep", "param location string\n");

        let mut manifest = Manifest::load(dir.path());
        manifest.save(&spec, &[a.clone(), b.clone()]).unwrap();

        let reloaded = Manifest::load(dir.path());
        assert!(reloaded.has_prior_generation());
        assert_eq!(reloaded.tracked_files().len(), 2);
        assert!(!reloaded.is_modified(&a));
        assert!(!reloaded.is_modified(&b));

        let changes = reloaded.detect_spec_changes(&spec);
        assert!(!changes.is_first_generation);
        assert!(!changes.has_changes());
    }

    #[test]
    fn persisted_layout_matches_contract() {
        let dir = TempDir::new().unwrap();
        let spec = sample_spec();
        let a = write_out_file(&dir, "README.md", "hello");
        let mut manifest = Manifest::load(dir.path());
        manifest.save(&spec, &[a]).unwrap();

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(".goalgen/manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["version"], "1.0");
        assert!(raw["generated_at"].is_string());
        assert_eq!(raw["spec"]["version"], "1.2.0");
        assert_eq!(raw["spec"]["schema_version"], 1);
        assert_eq!(raw["spec"]["agents"], json!(["flights", "sup"]));
        assert_eq!(raw["spec"]["tools"], json!(["search"]));
        let record = &raw["files"]["README.md"];
        assert_eq!(record["hash"].as_str().unwrap().len(), 16);
        assert_eq!(record["size"], 5);
    }

    #[test]
    fn is_modified_detects_external_edit_and_deletion() {
        let dir = TempDir::new().unwrap();
        let spec = sample_spec();
        let a = write_out_file(&dir, "app/main.py", "print('v1')\n");
        let mut manifest = Manifest::load(dir.path());
        manifest.save(&spec, &[a.clone()]).unwrap();
        assert!(!manifest.is_modified(&a));

        std::fs::write(&a, "print('user edit')\n").unwrap();
        assert!(manifest.is_modified(&a));

        std::fs::remove_file(&a).unwrap();
        assert!(manifest.is_modified(&a));
    }

    #[test]
    fn untracked_files_are_never_modified() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(dir.path());
        assert!(!manifest.is_modified(Path::new("never/seen.txt")));
        assert!(!manifest.is_modified(&dir.path().join("also/never.txt")));
    }

    #[test]
    fn save_replaces_rather_than_merges() {
        let dir = TempDir::new().unwrap();
        let spec = sample_spec();
        let a = write_out_file(&dir, "a.txt", "a");
        let b = write_out_file(&dir, "b.txt", "b");

        let mut manifest = Manifest::load(dir.path());
        manifest.save(&spec, &[a.clone(), b]).unwrap();
        assert_eq!(manifest.tracked_files().len(), 2);

        // Second run produces only `a`: `b` falls out of tracking.
        manifest.save(&spec, &[a]).unwrap();
        let reloaded = Manifest::load(dir.path());
        assert_eq!(reloaded.tracked_files(), ["a.txt"].into_iter().collect());
        assert!(!reloaded.is_modified(Path::new("b.txt")));
    }

    #[test]
    fn save_skips_files_missing_from_disk() {
        let dir = TempDir::new().unwrap();
        let spec = sample_spec();
        let mut manifest = Manifest::load(dir.path());
        manifest
            .save(&spec, &[dir.path().join("ghost.txt")])
            .unwrap();
        assert!(manifest.tracked_files().is_empty());
    }

    #[test]
    fn first_generation_reports_everything_added() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(dir.path());
        let changes = manifest.detect_spec_changes(&sample_spec());
        assert!(changes.is_first_generation);
        assert_eq!(changes.added_agents, vec!["flights", "sup"]);
        assert_eq!(changes.added_tools, vec!["search"]);
        assert!(changes.removed_agents.is_empty());
        assert!(changes.removed_tools.is_empty());
        assert!(!changes.schema_version_changed);
    }

    #[test]
    fn detect_spec_changes_diffs_names_and_schema_version() {
        let dir = TempDir::new().unwrap();
        let mut manifest = Manifest::load(dir.path());
        manifest.save(&sample_spec(), &[]).unwrap();

        let new_spec = Spec::new(json!({
            "id": "trip",
            "title": "Trip Planner",
            "version": "1.3.0",
            "schema_version": 2,
            "agents": {"sup": {"kind": "supervisor"}, "hotels": {"kind": "llm_agent"}},
            "tools": {}
        }));
        let changes = manifest.detect_spec_changes(&new_spec);
        assert!(!changes.is_first_generation);
        assert_eq!(changes.added_agents, vec!["hotels"]);
        assert_eq!(changes.removed_agents, vec!["flights"]);
        assert!(changes.added_tools.is_empty());
        assert_eq!(changes.removed_tools, vec!["search"]);
        assert!(changes.schema_version_changed);
    }

    #[test]
    fn schema_version_defaults_to_one_on_both_sides() {
        let dir = TempDir::new().unwrap();
        let mut manifest = Manifest::load(dir.path());
        let no_version = Spec::new(json!({
            "id": "trip", "title": "t", "version": "1.0.0",
            "agents": {"sup": {"kind": "supervisor"}}
        }));
        manifest.save(&no_version, &[]).unwrap();
        let changes = manifest.detect_spec_changes(&no_version);
        assert!(!changes.schema_version_changed);
    }
}
