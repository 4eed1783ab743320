use crate::error::{GoalgenError, Result};
use crate::io::atomic_write;
use crate::manifest::Manifest;
use crate::regen::{should_regenerate, RegenDecision};
use crate::spec::Spec;
use crate::template::{self, build_engine, render_context, ux_enabled};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tera::Tera;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Generator targets, run in a fixed order because later targets may depend
/// on files earlier ones produced (infra references tool names, deployment
/// scripts reference infra parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Scaffold,
    Orchestrator,
    Agents,
    Tools,
    Api,
    Teams,
    Webchat,
    Infra,
    Cicd,
    Deployment,
    Tests,
}

impl Target {
    /// Default generation order.
    pub const ALL: [Target; 11] = [
        Target::Scaffold,
        Target::Orchestrator,
        Target::Agents,
        Target::Tools,
        Target::Api,
        Target::Teams,
        Target::Webchat,
        Target::Infra,
        Target::Cicd,
        Target::Deployment,
        Target::Tests,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scaffold" => Some(Target::Scaffold),
            "orchestrator" => Some(Target::Orchestrator),
            "agents" => Some(Target::Agents),
            "tools" => Some(Target::Tools),
            "api" => Some(Target::Api),
            "teams" => Some(Target::Teams),
            "webchat" => Some(Target::Webchat),
            "infra" => Some(Target::Infra),
            "cicd" => Some(Target::Cicd),
            "deployment" => Some(Target::Deployment),
            "tests" => Some(Target::Tests),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Scaffold => "scaffold",
            Target::Orchestrator => "orchestrator",
            Target::Agents => "agents",
            Target::Tools => "tools",
            Target::Api => "api",
            Target::Teams => "teams",
            Target::Webchat => "webchat",
            Target::Infra => "infra",
            Target::Cicd => "cicd",
            Target::Deployment => "deployment",
            Target::Tests => "tests",
        }
    }
}

/// Parse a comma-separated target list, preserving order.
pub fn parse_targets(list: &str) -> Result<Vec<Target>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Target::parse(s).ok_or_else(|| GoalgenError::UnknownTarget(s.to_string())))
        .collect()
}

// ---------------------------------------------------------------------------
// Embedded templates
// ---------------------------------------------------------------------------

const TEMPLATES: &[(&str, &str)] = &[
    ("scaffold/README.md", include_str!("../templates/scaffold/README.md.tera")),
    ("scaffold/gitignore", include_str!("../templates/scaffold/gitignore.tera")),
    ("orchestrator/app.py", include_str!("../templates/orchestrator/app.py.tera")),
    ("orchestrator/state.py", include_str!("../templates/orchestrator/state.py.tera")),
    ("agents/agent.py", include_str!("../templates/agents/agent.py.tera")),
    ("tools/tool.py", include_str!("../templates/tools/tool.py.tera")),
    ("api/main.py", include_str!("../templates/api/main.py.tera")),
    ("api/Dockerfile", include_str!("../templates/api/Dockerfile.tera")),
    ("teams/manifest.json", include_str!("../templates/teams/manifest.json.tera")),
    ("webchat/package.json", include_str!("../templates/webchat/package.json.tera")),
    ("webchat/index.html", include_str!("../templates/webchat/index.html.tera")),
    ("infra/main.bicep", include_str!("../templates/infra/main.bicep.tera")),
    ("infra/parameters.json", include_str!("../templates/infra/parameters.json.tera")),
    ("cicd/deploy.yml", include_str!("../templates/cicd/deploy.yml.tera")),
    ("deployment/deploy.sh", include_str!("../templates/deployment/deploy.sh.tera")),
    ("deployment/local_run.sh", include_str!("../templates/deployment/local_run.sh.tera")),
    ("tests/conftest.py", include_str!("../templates/tests/conftest.py.tera")),
    ("tests/test_orchestrator.py", include_str!("../templates/tests/test_orchestrator.py.tera")),
];

// ---------------------------------------------------------------------------
// Generation run
// ---------------------------------------------------------------------------

/// One file either written or deliberately left alone.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub decision: RegenDecision,
}

/// Result of running a set of targets: every produced path (for the
/// manifest) plus the per-file preserve decisions the caller must surface.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<FileOutcome>,
}

impl GenerationReport {
    /// Paths this run is responsible for — written or knowingly preserved.
    /// Preserved files stay tracked so the next run still owns them.
    pub fn produced_files(&self) -> Vec<PathBuf> {
        self.outcomes.iter().map(|o| o.path.clone()).collect()
    }

    pub fn preserved(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.decision.regenerate)
    }

    pub fn written_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.decision.regenerate).count()
    }
}

/// Shared state threaded through every generator target during one run.
pub struct GenerationRun<'a> {
    spec: &'a Spec,
    out_dir: &'a Path,
    manifest: &'a Manifest,
    engine: Tera,
    base_context: tera::Context,
    pub dry_run: bool,
    pub incremental: bool,
    pub force: bool,
    report: GenerationReport,
}

impl<'a> GenerationRun<'a> {
    pub fn new(
        spec: &'a Spec,
        out_dir: &'a Path,
        manifest: &'a Manifest,
        dry_run: bool,
        incremental: bool,
        force: bool,
    ) -> Result<Self> {
        Ok(Self {
            spec,
            out_dir,
            manifest,
            engine: build_engine(TEMPLATES)?,
            base_context: render_context(spec),
            dry_run,
            incremental,
            force,
            report: GenerationReport::default(),
        })
    }

    /// Run each target in order and return the collected report.
    pub fn run(mut self, targets: &[Target]) -> Result<GenerationReport> {
        for target in targets {
            tracing::info!(target = target.as_str(), "running generator");
            self.run_target(*target)?;
        }
        Ok(self.report)
    }

    fn run_target(&mut self, target: Target) -> Result<()> {
        match target {
            Target::Scaffold => {
                self.emit("scaffold/README.md", "README.md", None)?;
                self.emit("scaffold/gitignore", ".gitignore", None)?;
            }
            Target::Orchestrator => {
                self.emit("orchestrator/app.py", "orchestrator/app.py", None)?;
                self.emit("orchestrator/state.py", "orchestrator/state.py", None)?;
            }
            Target::Agents => self.emit_agents()?,
            Target::Tools => self.emit_tools()?,
            Target::Api => {
                self.emit("api/main.py", "api/main.py", None)?;
                self.emit("api/Dockerfile", "api/Dockerfile", None)?;
            }
            Target::Teams => {
                if ux_enabled(self.spec.value(), "teams") {
                    self.emit("teams/manifest.json", "teams_app/manifest.json", None)?;
                } else {
                    tracing::debug!("teams surface not enabled; skipping");
                }
            }
            Target::Webchat => {
                if ux_enabled(self.spec.value(), "webchat") {
                    self.emit("webchat/package.json", "webchat/package.json", None)?;
                    self.emit("webchat/index.html", "webchat/index.html", None)?;
                } else {
                    tracing::debug!("webchat surface not enabled; skipping");
                }
            }
            Target::Infra => {
                self.emit("infra/main.bicep", "infra/main.bicep", None)?;
                for env in template::environment_names(self.spec) {
                    let mut extra = tera::Context::new();
                    extra.insert("environment", &env);
                    self.emit(
                        "infra/parameters.json",
                        &format!("infra/parameters.{env}.json"),
                        Some(extra),
                    )?;
                }
            }
            Target::Cicd => {
                self.emit("cicd/deploy.yml", "ci/workflows/deploy.yml", None)?;
            }
            Target::Deployment => {
                self.emit("deployment/deploy.sh", "scripts/deploy.sh", None)?;
                self.emit("deployment/local_run.sh", "scripts/local_run.sh", None)?;
            }
            Target::Tests => {
                self.emit("tests/conftest.py", "tests/conftest.py", None)?;
                self.emit(
                    "tests/test_orchestrator.py",
                    "tests/test_orchestrator.py",
                    None,
                )?;
            }
        }
        Ok(())
    }

    fn emit_agents(&mut self) -> Result<()> {
        let agents: Vec<(String, Value)> = self
            .spec
            .value()
            .get("agents")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        for (name, agent) in agents {
            let mut extra = tera::Context::new();
            extra.insert("agent_name", &name);
            extra.insert("agent", &agent);
            self.emit(
                "agents/agent.py",
                &format!("workflow/agents/{name}.py"),
                Some(extra),
            )?;
        }
        Ok(())
    }

    fn emit_tools(&mut self) -> Result<()> {
        let tools: Vec<(String, Value)> = self
            .spec
            .value()
            .get("tools")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        for (name, tool) in tools {
            let mut extra = tera::Context::new();
            extra.insert("tool_name", &name);
            extra.insert("tool", &tool);
            self.emit("tools/tool.py", &format!("tools/{name}.py"), Some(extra))?;
        }
        Ok(())
    }

    /// Render one template to `rel_path`, honoring the regeneration policy.
    /// Preserved files are reported, never silently skipped.
    fn emit(
        &mut self,
        template_name: &str,
        rel_path: &str,
        extra: Option<tera::Context>,
    ) -> Result<()> {
        let path = self.out_dir.join(rel_path);
        let decision = should_regenerate(&path, self.manifest, self.incremental, self.force);

        if decision.regenerate && !self.dry_run {
            let mut ctx = self.base_context.clone();
            if let Some(extra) = extra {
                ctx.extend(extra);
            }
            let rendered =
                self.engine
                    .render(template_name, &ctx)
                    .map_err(|e| GoalgenError::Template {
                        name: template_name.to_string(),
                        source: e,
                    })?;
            atomic_write(&path, rendered.as_bytes())?;
            tracing::debug!(file = rel_path, "generated");
        } else if decision.regenerate {
            tracing::info!(file = rel_path, "dry run: would generate");
        } else {
            tracing::info!(file = rel_path, reason = %decision.reason, "preserved");
        }

        self.report.outcomes.push(FileOutcome { path, decision });
        Ok(())
    }
}
