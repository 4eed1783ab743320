use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoalgenError {
    #[error("spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error("failed to parse spec {path}: {reason}")]
    SpecParse { path: PathBuf, reason: String },

    #[error("unsupported spec extension '{0}': expected .json, .yaml, or .yml")]
    UnsupportedSpecFormat(String),

    #[error("unknown generator target: {0}")]
    UnknownTarget(String),

    #[error("template rendering failed for '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error(
        "output directory is locked by another generation run \
         (remove {0} if no other run is active)"
    )]
    OutputDirLocked(PathBuf),

    #[error("failed to write manifest at {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GoalgenError>;
