#![forbid(unsafe_code)]

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use sprove_ir::Engine;
use thiserror::Error;

use crate::eval::Obligation;

/// Classified backend answer. Only `Proved` counts as success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverResult {
    /// The negated goal is unsatisfiable.
    Proved,
    /// The negated goal is satisfiable; the model is a counterexample.
    Disproved { model: Option<String> },
    Unknown { reason: Option<String> },
    Error { message: String },
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Proved,
    Disproved,
    Unknown,
    Error,
    Timeout,
    Fault,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Proved => "proved",
            ResultKind::Disproved => "disproved",
            ResultKind::Unknown => "unknown",
            ResultKind::Error => "error",
            ResultKind::Timeout => "timeout",
            ResultKind::Fault => "fault",
        }
    }
}

impl SolverResult {
    pub fn is_proved(&self) -> bool {
        matches!(self, SolverResult::Proved)
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            SolverResult::Proved => ResultKind::Proved,
            SolverResult::Disproved { .. } => ResultKind::Disproved,
            SolverResult::Unknown { .. } => ResultKind::Unknown,
            SolverResult::Error { .. } => ResultKind::Error,
            SolverResult::Timeout => ResultKind::Timeout,
        }
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverResult::Proved => f.write_str("Q.E.D."),
            SolverResult::Disproved { model: Some(m) } => {
                write!(f, "Falsifiable. Counter-example:\n{m}")
            }
            SolverResult::Disproved { model: None } => f.write_str("Falsifiable."),
            SolverResult::Unknown { reason: Some(r) } => write!(f, "Unknown: {r}"),
            SolverResult::Unknown { reason: None } => f.write_str("Unknown."),
            SolverResult::Error { message } => write!(f, "Solver error: {message}"),
            SolverResult::Timeout => f.write_str("Timeout."),
        }
    }
}

/// A classified result together with everything the backend printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendAnswer {
    pub result: SolverResult,
    pub raw: String,
}

/// The backend could not be consulted at all.
#[derive(Debug, Error, Diagnostic)]
pub enum BackendFault {
    #[error("{engine} is not installed (looked for `{executable}`)")]
    #[diagnostic(code(sprove::backend::not_found), help("install it, or set `path` under [solvers.{engine}] in sprove.toml"))]
    NotFound { engine: Engine, executable: String },

    #[error("failed to run {backend}: {source}")]
    #[diagnostic(code(sprove::backend::io))]
    Io {
        backend: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{backend} panicked: {message}")]
    #[diagnostic(code(sprove::backend::panic))]
    Panicked { backend: String, message: String },

    #[error("{backend} is unavailable: {message}")]
    #[diagnostic(code(sprove::backend::unavailable))]
    Unavailable { backend: String, message: String },
}

/// Per-backend settings resolved from options and configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub engine: Engine,
    pub executable: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub extra_args: Vec<String>,
    /// Keep the full transcript (script included) in the answer.
    pub verbose: bool,
}

impl BackendConfig {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            executable: None,
            timeout: None,
            extra_args: Vec::new(),
            verbose: false,
        }
    }
}

/// An external decision procedure. Each call owns its own process or
/// context, so calls may run concurrently.
pub trait SolverBackend: Send + Sync {
    fn name(&self) -> String;

    fn check(&self, obligation: &Obligation) -> Result<BackendAnswer, BackendFault>;
}
