use crate::diagnostic::{Diagnostic, Severity, ValidationOutcome};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Recognized kinds and types
// ---------------------------------------------------------------------------

/// Agent kinds the generator knows how to emit code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Supervisor,
    LlmAgent,
    Evaluator,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [
        AgentKind::Supervisor,
        AgentKind::LlmAgent,
        AgentKind::Evaluator,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supervisor" => Some(AgentKind::Supervisor),
            "llm_agent" => Some(AgentKind::LlmAgent),
            "evaluator" => Some(AgentKind::Evaluator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Supervisor => "supervisor",
            AgentKind::LlmAgent => "llm_agent",
            AgentKind::Evaluator => "evaluator",
        }
    }
}

/// Tool backends the generator knows how to wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    Http,
    Sql,
    Vectordb,
    Function,
    Internal,
}

impl ToolType {
    pub const ALL: [ToolType; 5] = [
        ToolType::Http,
        ToolType::Sql,
        ToolType::Vectordb,
        ToolType::Function,
        ToolType::Internal,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "http" => Some(ToolType::Http),
            "sql" => Some(ToolType::Sql),
            "vectordb" => Some(ToolType::Vectordb),
            "function" => Some(ToolType::Function),
            "internal" => Some(ToolType::Internal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Http => "http",
            ToolType::Sql => "sql",
            ToolType::Vectordb => "vectordb",
            ToolType::Function => "function",
            ToolType::Internal => "internal",
        }
    }
}

/// Model names known to work with the generated orchestrator. Advisory only:
/// an unknown model is a warning, never an error.
const KNOWN_MODELS: [&str; 5] = ["gpt-4", "gpt-4-turbo", "gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"];

const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

const CHECKPOINT_BACKENDS: [&str; 3] = ["cosmos", "redis", "memory"];

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"))
}

fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+(-[a-zA-Z0-9.]+)?$").expect("valid regex"))
}

/// Human name for a JSON value's type, used in type-mismatch diagnostics.
fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Validate a goal spec.
///
/// Total over any JSON document: malformed structure produces ERROR
/// diagnostics, never a panic or an `Err`. Deterministic: the same spec
/// always yields the same diagnostic sequence in checker-registration
/// order. The validator holds no state between calls.
pub fn validate(spec: &Value) -> ValidationOutcome {
    let mut checker = Checker {
        spec,
        issues: Vec::new(),
    };
    checker.run();
    ValidationOutcome::new(checker.issues)
}

struct Checker<'a> {
    spec: &'a Value,
    issues: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn run(&mut self) {
        self.check_required_fields();
        self.check_id();
        self.check_version();
        self.check_agents();
        self.check_tools();
        self.check_tasks();
        self.check_state_management();
        self.check_ux();
        self.check_deployment();
        self.check_authentication();
        self.check_cross_references();
        self.check_best_practices();
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(Diagnostic::new(Severity::Error, path, message));
    }

    fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(Diagnostic::new(Severity::Warning, path, message));
    }

    fn info(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues
            .push(Diagnostic::new(Severity::Info, path, message));
    }

    fn suggest(&mut self, suggestion: impl Into<String>) {
        if let Some(last) = self.issues.last_mut() {
            last.suggestion = Some(suggestion.into());
        }
    }

    // -----------------------------------------------------------------------
    // 1. Required top-level fields
    // -----------------------------------------------------------------------

    fn check_required_fields(&mut self) {
        for field in ["id", "title", "version", "agents"] {
            if self.spec.get(field).is_none() {
                self.error(
                    format!("root.{field}"),
                    format!("Required field '{field}' is missing"),
                );
                self.suggest(format!("Add '{field}' to the root of your spec"));
            }
        }
    }

    // -----------------------------------------------------------------------
    // 2. ID format
    // -----------------------------------------------------------------------

    fn check_id(&mut self) {
        let Some(id) = self.spec.get("id") else {
            return; // already reported by the required-fields check
        };

        let Some(id) = id.as_str() else {
            self.error(
                "root.id",
                format!("ID must be a string, got {}", type_name(id)),
            );
            return;
        };

        if id.is_empty() {
            self.error("root.id", "ID cannot be empty");
            return;
        }

        if !ident_re().is_match(id) {
            self.error(
                "root.id",
                "ID must start with a lowercase letter and contain only \
                 lowercase letters, numbers, and underscores",
            );
            let fixed = id.to_lowercase().replace(['-', ' '], "_");
            self.suggest(format!("Example: '{fixed}'"));
        }

        if id.len() > 50 {
            self.warning(
                "root.id",
                format!(
                    "ID is very long ({} chars). Consider shortening for better usability",
                    id.len()
                ),
            );
        }
    }

    // -----------------------------------------------------------------------
    // 3. Version format
    // -----------------------------------------------------------------------

    fn check_version(&mut self) {
        let Some(version) = self.spec.get("version") else {
            return;
        };

        let Some(version) = version.as_str() else {
            self.error(
                "root.version",
                format!("Version must be a string, got {}", type_name(version)),
            );
            return;
        };

        if !semver_re().is_match(version) {
            self.error(
                "root.version",
                format!("Version '{version}' is not a valid semantic version (x.y.z)"),
            );
            self.suggest("Example: '1.0.0' or '1.0.0-alpha'");
        }
    }

    // -----------------------------------------------------------------------
    // 4. Agents
    // -----------------------------------------------------------------------

    fn check_agents(&mut self) {
        let spec: &'a Value = self.spec;
        let Some(agents) = spec.get("agents") else {
            return;
        };

        let Some(agents) = agents.as_object() else {
            self.error(
                "agents",
                format!("Agents must be a mapping, got {}", type_name(agents)),
            );
            return;
        };

        if agents.is_empty() {
            self.error(
                "agents",
                "Agents mapping cannot be empty. At least one agent is required",
            );
            return;
        }

        let has_supervisor = agents.values().any(|a| {
            a.get("kind").and_then(Value::as_str) == Some(AgentKind::Supervisor.as_str())
        });
        if !has_supervisor {
            self.error("agents", "At least one supervisor agent is required");
            self.suggest("Add an agent with 'kind': 'supervisor'");
        }

        for (name, config) in agents {
            self.check_agent(name, config);
        }
    }

    fn check_agent(&mut self, name: &str, config: &Value) {
        let path = format!("agents.{name}");

        if !ident_re().is_match(name) {
            self.warning(
                path.clone(),
                format!("Agent name '{name}' should be lowercase with underscores"),
            );
            let fixed = name.to_lowercase().replace('-', "_");
            self.suggest(format!("Example: '{fixed}'"));
        }

        let Some(config) = config.as_object() else {
            self.error(
                path,
                format!("Agent config must be a mapping, got {}", type_name(config)),
            );
            return;
        };

        let Some(kind) = config.get("kind") else {
            self.error(format!("{path}.kind"), "Agent must have a 'kind' field");
            self.suggest(valid_kinds_hint());
            return;
        };

        let kind = match kind.as_str().and_then(AgentKind::parse) {
            Some(kind) => kind,
            None => {
                self.error(
                    format!("{path}.kind"),
                    format!("Invalid agent kind '{}'", display_scalar(kind)),
                );
                self.suggest(valid_kinds_hint());
                return;
            }
        };

        match kind {
            AgentKind::Supervisor => {
                if !config.contains_key("policy") {
                    self.info(
                        format!("{path}.policy"),
                        "Supervisor should specify a routing policy",
                    );
                    self.suggest("Recommended: 'policy': 'simple_router'");
                }
            }
            AgentKind::LlmAgent => {
                if !config.contains_key("llm_config") {
                    self.warning(
                        format!("{path}.llm_config"),
                        "LLM agent should specify llm_config with a model",
                    );
                    self.suggest("Example: 'llm_config': {'model': 'gpt-4'}");
                }
                if let Some(tools) = config.get("tools") {
                    if !tools.is_array() {
                        self.error(
                            format!("{path}.tools"),
                            format!("Tools must be a sequence, got {}", type_name(tools)),
                        );
                    }
                }
            }
            AgentKind::Evaluator => {
                if !config.contains_key("checks") {
                    self.warning(
                        format!("{path}.checks"),
                        "Evaluator should specify checks to perform",
                    );
                }
            }
        }

        if let Some(llm_config) = config.get("llm_config") {
            self.check_llm_config(&format!("{path}.llm_config"), llm_config);
        }
    }

    fn check_llm_config(&mut self, path: &str, llm_config: &Value) {
        let Some(llm_config) = llm_config.as_object() else {
            self.error(
                path,
                format!("llm_config must be a mapping, got {}", type_name(llm_config)),
            );
            return;
        };

        match llm_config.get("model").and_then(Value::as_str) {
            None => {
                self.warning(format!("{path}.model"), "llm_config should specify a model");
            }
            Some(model) => {
                // Substring match: "gpt-4o-2024" still counts as recognized.
                let known = KNOWN_MODELS.iter().any(|m| model.contains(m));
                if !known {
                    self.warning(
                        format!("{path}.model"),
                        format!("Unknown model '{model}'. It may not be supported"),
                    );
                    self.suggest(format!("Common models: {}", KNOWN_MODELS.join(", ")));
                }
            }
        }

        if let Some(temp) = llm_config.get("temperature") {
            match temp.as_f64() {
                None => {
                    self.error(
                        format!("{path}.temperature"),
                        format!("Temperature must be a number, got {}", type_name(temp)),
                    );
                }
                Some(t) if !(0.0..=2.0).contains(&t) => {
                    self.warning(
                        format!("{path}.temperature"),
                        format!("Temperature {t} is outside the typical range (0-2)"),
                    );
                }
                Some(_) => {}
            }
        }

        if let Some(max_tokens) = llm_config.get("max_tokens") {
            match max_tokens.as_i64() {
                None => {
                    self.error(
                        format!("{path}.max_tokens"),
                        format!(
                            "max_tokens must be an integer, got {}",
                            type_name(max_tokens)
                        ),
                    );
                }
                Some(n) if n > 4096 => {
                    self.info(
                        format!("{path}.max_tokens"),
                        format!("max_tokens {n} is very high. It may increase costs"),
                    );
                }
                Some(_) => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // 5. Tools
    // -----------------------------------------------------------------------

    fn check_tools(&mut self) {
        let spec: &'a Value = self.spec;
        let Some(tools) = spec.get("tools") else {
            return; // tools are optional
        };

        let Some(tools) = tools.as_object() else {
            self.error(
                "tools",
                format!("Tools must be a mapping, got {}", type_name(tools)),
            );
            return;
        };

        for (name, config) in tools {
            self.check_tool(name, config);
        }
    }

    fn check_tool(&mut self, name: &str, config: &'a Value) {
        let path = format!("tools.{name}");

        let Some(config) = config.as_object() else {
            self.error(
                path,
                format!("Tool config must be a mapping, got {}", type_name(config)),
            );
            return;
        };

        let Some(tool_type) = config.get("type") else {
            self.error(format!("{path}.type"), "Tool must have a 'type' field");
            self.suggest(valid_tool_types_hint());
            return;
        };

        let tool_type = match tool_type.as_str().and_then(ToolType::parse) {
            Some(t) => t,
            None => {
                self.error(
                    format!("{path}.type"),
                    format!("Invalid tool type '{}'", display_scalar(tool_type)),
                );
                self.suggest(valid_tool_types_hint());
                return;
            }
        };

        match tool_type {
            ToolType::Http => self.check_http_tool(&path, config),
            ToolType::Sql => self.check_sql_tool(&path, config),
            ToolType::Vectordb => self.check_vectordb_tool(&path, config),
            // function and internal tools carry free-form specs
            ToolType::Function | ToolType::Internal => {}
        }
    }

    fn check_http_tool(&mut self, path: &str, config: &'a serde_json::Map<String, Value>) {
        let Some(tool_spec) = self.require_tool_spec(path, config, "HTTP") else {
            return;
        };

        if !tool_spec.contains_key("url") {
            self.error(format!("{path}.spec.url"), "HTTP tool must specify 'url'");
        }

        match tool_spec.get("method") {
            None => {
                self.error(
                    format!("{path}.spec.method"),
                    "HTTP tool must specify 'method'",
                );
                self.suggest("Valid methods: GET, POST, PUT, DELETE, PATCH");
            }
            Some(method) => match method.as_str() {
                None => {
                    self.error(
                        format!("{path}.spec.method"),
                        format!("HTTP method must be a string, got {}", type_name(method)),
                    );
                }
                Some(m) if !HTTP_METHODS.contains(&m.to_ascii_uppercase().as_str()) => {
                    self.warning(
                        format!("{path}.spec.method"),
                        format!("Unusual HTTP method '{m}'"),
                    );
                    self.suggest(format!("Common methods: {}", HTTP_METHODS.join(", ")));
                }
                Some(_) => {}
            },
        }
    }

    fn check_sql_tool(&mut self, path: &str, config: &'a serde_json::Map<String, Value>) {
        let Some(tool_spec) = self.require_tool_spec(path, config, "SQL") else {
            return;
        };

        if !tool_spec.contains_key("connection_string") && !tool_spec.contains_key("database_type")
        {
            self.warning(
                format!("{path}.spec"),
                "SQL tool should specify 'connection_string' or 'database_type'",
            );
        }
    }

    fn check_vectordb_tool(&mut self, path: &str, config: &'a serde_json::Map<String, Value>) {
        let Some(tool_spec) = self.require_tool_spec(path, config, "VectorDB") else {
            return;
        };

        if !tool_spec.contains_key("provider") {
            self.warning(
                format!("{path}.spec.provider"),
                "VectorDB tool should specify 'provider'",
            );
            self.suggest("Examples: 'azure_ai_search', 'pinecone', 'weaviate', 'qdrant', 'chroma'");
        }
    }

    /// The typed tool checks all need a `spec` sub-mapping; report its
    /// absence or type mismatch and short-circuit the caller.
    fn require_tool_spec(
        &mut self,
        path: &str,
        config: &'a serde_json::Map<String, Value>,
        label: &str,
    ) -> Option<&'a serde_json::Map<String, Value>> {
        match config.get("spec") {
            None => {
                self.error(
                    format!("{path}.spec"),
                    format!("{label} tool must have a 'spec' field"),
                );
                None
            }
            Some(v) => match v.as_object() {
                Some(m) => Some(m),
                None => {
                    self.error(
                        format!("{path}.spec"),
                        format!("Tool spec must be a mapping, got {}", type_name(v)),
                    );
                    None
                }
            },
        }
    }

    // -----------------------------------------------------------------------
    // 6. Tasks
    // -----------------------------------------------------------------------

    fn check_tasks(&mut self) {
        let Some(tasks) = self.spec.get("tasks") else {
            return; // tasks are optional
        };

        let Some(tasks) = tasks.as_array() else {
            self.error(
                "tasks",
                format!("Tasks must be a sequence, got {}", type_name(tasks)),
            );
            return;
        };

        let tasks = tasks.clone();
        for (idx, task) in tasks.iter().enumerate() {
            self.check_task(idx, task);
        }
    }

    fn check_task(&mut self, idx: usize, task: &Value) {
        let path = format!("tasks[{idx}]");

        let Some(task) = task.as_object() else {
            self.error(
                path,
                format!("Task must be a mapping, got {}", type_name(task)),
            );
            return;
        };

        if !task.contains_key("id") {
            self.error(format!("{path}.id"), "Task must have an 'id' field");
        }

        if !task.contains_key("type") {
            self.error(format!("{path}.type"), "Task must have a 'type' field");
            self.suggest("Valid types: 'task', 'evaluator'");
        }

        // Existence of the referenced agent is checked in cross-references.
        if let Some(agent) = task.get("agent") {
            if !agent.is_string() {
                self.error(
                    format!("{path}.agent"),
                    format!("Task agent must be a string, got {}", type_name(agent)),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // 7. State management
    // -----------------------------------------------------------------------

    fn check_state_management(&mut self) {
        let Some(state_mgmt) = self.spec.get("state_management") else {
            self.info(
                "state_management",
                "No state management configured. Using defaults",
            );
            self.suggest("Consider adding a state_management section for checkpointing config");
            return;
        };

        let Some(state_mgmt) = state_mgmt.as_object() else {
            self.error(
                "state_management",
                format!(
                    "State management must be a mapping, got {}",
                    type_name(state_mgmt)
                ),
            );
            return;
        };

        if let Some(backend) = state_mgmt
            .get("checkpointing")
            .and_then(|c| c.get("backend"))
            .and_then(Value::as_str)
        {
            if !CHECKPOINT_BACKENDS.contains(&backend) {
                self.warning(
                    "state_management.checkpointing.backend",
                    format!("Unknown checkpointing backend '{backend}'"),
                );
                self.suggest(format!("Supported: {}", CHECKPOINT_BACKENDS.join(", ")));
            }
        }
    }

    // -----------------------------------------------------------------------
    // 8. UX
    // -----------------------------------------------------------------------

    fn check_ux(&mut self) {
        let Some(ux) = self.spec.get("ux") else {
            return; // ux is optional
        };

        let Some(ux) = ux.as_object() else {
            self.error("ux", format!("UX must be a mapping, got {}", type_name(ux)));
            return;
        };

        let has_enabled = ["teams", "webchat", "api"].iter().any(|surface| {
            ux.get(*surface)
                .and_then(|s| s.get("enabled"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        });

        if !has_enabled {
            self.warning(
                "ux",
                "No UX interfaces enabled. Users won't be able to interact with the system",
            );
            self.suggest("Enable at least one: teams, webchat, or api");
        }
    }

    // -----------------------------------------------------------------------
    // 9. Deployment / authentication
    // -----------------------------------------------------------------------

    fn check_deployment(&mut self) {
        let Some(deployment) = self.spec.get("deployment") else {
            return; // deployment is optional
        };

        let Some(deployment) = deployment.as_object() else {
            self.error(
                "deployment",
                format!("Deployment must be a mapping, got {}", type_name(deployment)),
            );
            return;
        };

        match deployment.get("environments") {
            None => {
                self.warning("deployment.environments", "No deployment environments configured");
            }
            Some(environments) => match environments.as_object() {
                None => {
                    self.error(
                        "deployment.environments",
                        format!(
                            "Environments must be a mapping, got {}",
                            type_name(environments)
                        ),
                    );
                }
                Some(envs) if envs.is_empty() => {
                    self.warning("deployment.environments", "No deployment environments configured");
                }
                Some(_) => {}
            },
        }
    }

    fn check_authentication(&mut self) {
        let Some(auth) = self.spec.get("authentication") else {
            return; // authentication is optional
        };

        if !auth.is_object() {
            self.error(
                "authentication",
                format!("Authentication must be a mapping, got {}", type_name(auth)),
            );
        }
    }

    // -----------------------------------------------------------------------
    // 10. Cross-references
    // -----------------------------------------------------------------------

    fn check_cross_references(&mut self) {
        // Tools referenced by agents must be defined at the top level. A
        // missing tools section counts as "no tools defined", so every
        // reference is undefined.
        let defined_tools: Vec<String> = self
            .spec
            .get("tools")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        if let Some(agents) = self.spec.get("agents").and_then(Value::as_object) {
            let refs: Vec<(String, String)> = agents
                .iter()
                .flat_map(|(agent_name, config)| {
                    config
                        .get("tools")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                        .map(|tool| (agent_name.clone(), tool.to_string()))
                        .collect::<Vec<_>>()
                })
                .collect();

            for (agent_name, tool) in refs {
                if !defined_tools.iter().any(|t| *t == tool) {
                    self.error(
                        format!("agents.{agent_name}.tools"),
                        format!("Agent '{agent_name}' references undefined tool '{tool}'"),
                    );
                    self.suggest("Define the tool in the tools section or remove the reference");
                }
            }
        }

        // Tasks referencing agents.
        let defined_agents: Vec<String> = self
            .spec
            .get("agents")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        if let Some(tasks) = self.spec.get("tasks").and_then(Value::as_array) {
            let refs: Vec<(usize, String)> = tasks
                .iter()
                .enumerate()
                .filter_map(|(idx, task)| {
                    task.get("agent")
                        .and_then(Value::as_str)
                        .map(|a| (idx, a.to_string()))
                })
                .collect();

            for (idx, agent) in refs {
                if !defined_agents.iter().any(|a| *a == agent) {
                    self.error(
                        format!("tasks[{idx}].agent"),
                        format!("Task references undefined agent '{agent}'"),
                    );
                    self.suggest("Define the agent in the agents section or fix the reference");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // 11. Best practices
    // -----------------------------------------------------------------------

    fn check_best_practices(&mut self) {
        if self.spec.get("description").is_none() {
            self.info(
                "root.description",
                "Consider adding a description field for documentation",
            );
        }

        if let Some(agents) = self.spec.get("agents").and_then(Value::as_object) {
            let count = agents.len();
            if count > 10 {
                self.info(
                    "agents",
                    format!(
                        "Large number of agents ({count}). Consider grouping related functionality"
                    ),
                );
            }
        }

        if let Some(deployment) = self.spec.get("deployment").and_then(Value::as_object) {
            if !deployment.contains_key("monitoring") {
                self.info(
                    "deployment.monitoring",
                    "Consider enabling monitoring (Application Insights, Log Analytics)",
                );
            }
        }
    }
}

fn valid_kinds_hint() -> String {
    let kinds: Vec<&str> = AgentKind::ALL.iter().map(|k| k.as_str()).collect();
    format!("Valid kinds: {}", kinds.join(", "))
}

fn valid_tool_types_hint() -> String {
    let types: Vec<&str> = ToolType::ALL.iter().map(|t| t.as_str()).collect();
    format!("Valid types: {}", types.join(", "))
}

/// Render a scalar for an error message without quoting noise on non-strings.
fn display_scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
