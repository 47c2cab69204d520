#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use sprove_ir::{Engine, SolverSelector};
use thiserror::Error;

use crate::process::{locate, ProcessBackend};
use crate::solver::{BackendConfig, SolverBackend};

/// Configured overrides for a single engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub path: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub args: Vec<String>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SelectionError {
    #[error("no solver selected")]
    #[diagnostic(code(sprove::solvers::empty), help("pass --solver <engine> or set `solvers` under [defaults]"))]
    Empty,

    #[error("`any solver` was requested but none of the supported engines is installed")]
    #[diagnostic(
        code(sprove::solvers::none_installed),
        help("install one of: z3, cvc4, cvc5, yices, boolector, bitwuzla, mathsat")
    )]
    NoneInstalled,
}

/// Turns solver selectors into runnable backends.
pub trait SolverSelection: Send + Sync {
    fn backends_for(
        &self,
        selectors: &[SolverSelector],
        verbose: bool,
    ) -> Result<Vec<Arc<dyn SolverBackend>>, SelectionError>;
}

#[derive(Clone, Debug, Default)]
pub struct SolverRegistry {
    engines: BTreeMap<Engine, EngineSettings>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, engine: Engine, settings: EngineSettings) {
        self.engines.insert(engine, settings);
    }

    pub fn settings(&self, engine: Engine) -> EngineSettings {
        self.engines.get(&engine).cloned().unwrap_or_default()
    }

    pub fn is_installed(&self, engine: Engine) -> bool {
        let settings = self.settings(engine);
        match locate(engine, settings.path.as_ref()) {
            Some(p) => settings.path.is_none() || p.exists(),
            None => false,
        }
    }

    pub fn installed(&self) -> Vec<Engine> {
        Engine::ALL
            .iter()
            .copied()
            .filter(|e| self.is_installed(*e))
            .collect()
    }

    fn backend(&self, engine: Engine, verbose: bool) -> Arc<dyn SolverBackend> {
        let settings = self.settings(engine);
        let config = BackendConfig {
            engine,
            executable: settings.path,
            timeout: settings.timeout,
            extra_args: settings.args,
            verbose,
        };
        build_backend(config)
    }
}

// Z3 runs in-process when linked, unless an executable path is forced.
#[cfg(feature = "z3")]
fn build_backend(config: BackendConfig) -> Arc<dyn SolverBackend> {
    if config.engine == Engine::Z3 && config.executable.is_none() {
        Arc::new(crate::z3_backend::Z3Backend::new(config))
    } else {
        Arc::new(ProcessBackend::new(config))
    }
}

#[cfg(not(feature = "z3"))]
fn build_backend(config: BackendConfig) -> Arc<dyn SolverBackend> {
    Arc::new(ProcessBackend::new(config))
}

impl SolverSelection for SolverRegistry {
    fn backends_for(
        &self,
        selectors: &[SolverSelector],
        verbose: bool,
    ) -> Result<Vec<Arc<dyn SolverBackend>>, SelectionError> {
        if selectors.is_empty() {
            return Err(SelectionError::Empty);
        }
        let mut engines: Vec<Engine> = Vec::new();
        for sel in selectors {
            match sel {
                SolverSelector::Engine(e) => engines.push(*e),
                SolverSelector::AllInstalled => {
                    let found = self.installed();
                    if found.is_empty() {
                        return Err(SelectionError::NoneInstalled);
                    }
                    engines.extend(found);
                }
            }
        }
        let mut seen = Vec::new();
        engines.retain(|e| {
            let fresh = !seen.contains(e);
            seen.push(*e);
            fresh
        });
        Ok(engines
            .into_iter()
            .map(|e| self.backend(e, verbose))
            .collect())
    }
}
