use crate::error::{GoalgenError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Schema version assumed when a spec does not declare one.
pub const DEFAULT_SCHEMA_VERSION: i64 = 1;

/// A user-authored goal spec.
///
/// The spec is an arbitrarily nested document; it is immutable input to
/// validation and generation, never mutated here. Accessors are total —
/// a structurally malformed spec yields empty/default values, and the
/// validator is responsible for reporting the malformation.
#[derive(Debug, Clone)]
pub struct Spec {
    value: Value,
}

impl Spec {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Load a spec from a `.json`, `.yaml`, or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GoalgenError::SpecNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let value = match ext.as_str() {
            "json" => serde_json::from_str(&text).map_err(|e| GoalgenError::SpecParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&text).map_err(|e| GoalgenError::SpecParse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            other => return Err(GoalgenError::UnsupportedSpecFormat(other.to_string())),
        };
        Ok(Self::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn id(&self) -> Option<&str> {
        self.value.get("id").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.value.get("version").and_then(Value::as_str)
    }

    pub fn schema_version(&self) -> i64 {
        self.value
            .get("schema_version")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_SCHEMA_VERSION)
    }

    /// Names of all declared agents, sorted for deterministic output.
    pub fn agent_names(&self) -> BTreeSet<String> {
        self.section_keys("agents")
    }

    /// Names of all declared tools, sorted for deterministic output.
    pub fn tool_names(&self) -> BTreeSet<String> {
        self.section_keys("tools")
    }

    fn section_keys(&self, section: &str) -> BTreeSet<String> {
        self.value
            .get(section)
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn load_json_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goal.json");
        std::fs::write(&path, r#"{"id": "trip", "agents": {"sup": {}}}"#).unwrap();

        let spec = Spec::load(&path).unwrap();
        assert_eq!(spec.id(), Some("trip"));
        assert!(spec.agent_names().contains("sup"));
    }

    #[test]
    fn load_yaml_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goal.yaml");
        std::fs::write(&path, "id: trip\nagents:\n  sup:\n    kind: supervisor\n").unwrap();

        let spec = Spec::load(&path).unwrap();
        assert_eq!(spec.id(), Some("trip"));
        assert_eq!(spec.agent_names().len(), 1);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goal.toml");
        std::fs::write(&path, "id = 'trip'").unwrap();
        assert!(matches!(
            Spec::load(&path),
            Err(GoalgenError::UnsupportedSpecFormat(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Spec::load(&dir.path().join("absent.json")),
            Err(GoalgenError::SpecNotFound(_))
        ));
    }

    #[test]
    fn load_reports_parse_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Spec::load(&path),
            Err(GoalgenError::SpecParse { .. })
        ));
    }

    #[test]
    fn schema_version_defaults_to_one() {
        let spec = Spec::new(json!({"id": "trip"}));
        assert_eq!(spec.schema_version(), 1);
        let spec = Spec::new(json!({"schema_version": 3}));
        assert_eq!(spec.schema_version(), 3);
    }

    #[test]
    fn accessors_are_total_on_malformed_specs() {
        let spec = Spec::new(json!({"agents": "not a map", "id": 42}));
        assert_eq!(spec.id(), None);
        assert!(spec.agent_names().is_empty());
        assert!(spec.tool_names().is_empty());
    }
}
