#![forbid(unsafe_code)]

//! Per-binding theorem driver.
//!
//! Bindings are analysed strictly in order. Each one walks
//! `NotStarted -> TypeChecked -> Evaluating -> Solving -> Succeeded`, or
//! stops in one of the two failure states. Coverage errors, unprovable
//! bindings and configuration problems abort the run; a proof that does
//! not come back `Proved` aborts it too unless `WarnIfFails` is in effect.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use miette::Diagnostic;
use sprove_ir::{Annotation, Binding, Engine, Program, ProofOptions, SolverSelector, SrcLoc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::builtins::SymbolicPrelude;
use crate::env::{Env, EnvKey, Globals};
use crate::eval::{EvalError, EvalErrorKind, Evaluator, Obligation};
use crate::kind::BaseKind;
use crate::orchestrator::{panic_message, prove, Verdict};
use crate::registry::SolverSelection;
use crate::smtlib::render_script;
use crate::term::{SymVar, Term, VarOrigin};
use crate::value::SVal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    NotStarted,
    TypeChecked,
    Evaluating,
    Solving,
    Succeeded,
    FailedRecoverable,
    FailedFatal,
}

impl BindingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingState::NotStarted => "not_started",
            BindingState::TypeChecked => "type_checked",
            BindingState::Evaluating => "evaluating",
            BindingState::Solving => "solving",
            BindingState::Succeeded => "succeeded",
            BindingState::FailedRecoverable => "failed_recoverable",
            BindingState::FailedFatal => "failed_fatal",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Prove the boolean body valid.
    Theorem,
    /// Prove every partial operation in the body is applied safely.
    Safety,
    /// Bind the value as an unconstrained constant for later bindings.
    Uninterpret,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Theorem => "theorem",
            Mode::Safety => "safety",
            Mode::Uninterpret => "uninterpret",
        })
    }
}

/// Decides whether a binding's declared type can be analysed at all.
pub trait ProvabilityPolicy: Send + Sync {
    fn is_provable(&self, binding: &Binding) -> bool;
}

/// Accepts every binding.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysProvable;

impl ProvabilityPolicy for AlwaysProvable {
    fn is_provable(&self, _binding: &Binding) -> bool {
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverSettings {
    /// Used when an annotation names no solver.
    pub default_solvers: Vec<SolverSelector>,
    /// Treat every annotation as if it carried `WarnIfFails`.
    pub warn_if_fails: bool,
    /// Treat every annotation as if it carried `Verbose`.
    pub verbose: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            default_solvers: vec![SolverSelector::Engine(Engine::Z3)],
            warn_if_fails: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error("cannot analyse `{binding}`: {error}")]
    #[diagnostic(
        code(sprove::driver::coverage),
        help("only variables, type/value applications, lambdas over basic types and location markers can be analysed")
    )]
    Coverage { binding: String, error: EvalError },

    #[error("{loc}: the type of `{binding}` is not provable")]
    #[diagnostic(code(sprove::driver::unprovable))]
    Unprovable { binding: String, loc: SrcLoc },

    #[error("{loc}: proof of `{binding}` failed: {result}")]
    #[diagnostic(
        code(sprove::driver::proof_failed),
        help("add WarnIfFails to the annotation (or pass --warn-if-fails) to continue past failed proofs")
    )]
    ProofFailed {
        binding: String,
        loc: SrcLoc,
        result: String,
    },

    #[error("{loc}: cannot set up solvers for `{binding}`: {message}")]
    #[diagnostic(code(sprove::driver::configuration))]
    Configuration {
        binding: String,
        loc: SrcLoc,
        message: String,
    },
}

/// Outcome of one annotation on one binding.
#[derive(Debug)]
pub struct BindingReport {
    pub name: String,
    pub loc: SrcLoc,
    pub mode: Mode,
    pub state: BindingState,
    /// Human description of the requested solvers.
    pub solvers: Vec<String>,
    pub verdict: Option<Verdict>,
    pub verbose: bool,
    pub note: Option<String>,
}

impl BindingReport {
    fn new(binding: &Binding, mode: Mode) -> Self {
        Self {
            name: binding.name.clone(),
            loc: binding.loc.clone(),
            mode,
            state: BindingState::NotStarted,
            solvers: Vec::new(),
            verdict: None,
            verbose: false,
            note: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == BindingState::Succeeded
    }

    fn enter(&mut self, state: BindingState) {
        debug!(binding = %self.name, from = self.state.as_str(), to = state.as_str(), "state transition");
        self.state = state;
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<BindingReport>,
    /// The error that stopped the run early, if any.
    pub aborted: Option<DriverError>,
}

impl RunSummary {
    pub fn ok(&self) -> bool {
        self.aborted.is_none()
            && self
                .reports
                .iter()
                .all(|r| r.state != BindingState::FailedFatal)
    }

    pub fn failures(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| {
                matches!(
                    r.state,
                    BindingState::FailedRecoverable | BindingState::FailedFatal
                )
            })
            .count()
    }
}

fn mode_of(annotation: &Annotation) -> Mode {
    match annotation {
        Annotation::Uninterpret => Mode::Uninterpret,
        Annotation::Theorem(o) if o.uninterpret() => Mode::Uninterpret,
        Annotation::Safety(_) => Mode::Safety,
        Annotation::Theorem(o) if o.safety() => Mode::Safety,
        Annotation::Theorem(_) => Mode::Theorem,
    }
}

pub struct Driver<'a> {
    prelude: &'a SymbolicPrelude,
    solvers: &'a dyn SolverSelection,
    policy: &'a dyn ProvabilityPolicy,
    settings: DriverSettings,
}

impl<'a> Driver<'a> {
    pub fn new(
        prelude: &'a SymbolicPrelude,
        solvers: &'a dyn SolverSelection,
        settings: DriverSettings,
    ) -> Self {
        Self {
            prelude,
            solvers,
            policy: &AlwaysProvable,
            settings,
        }
    }

    pub fn with_policy(mut self, policy: &'a dyn ProvabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, program: &Program) -> RunSummary {
        let root = Env::root(self.prelude.globals.clone());
        let mut uninterpreted = Globals::new();
        let mut summary = RunSummary::default();

        for binding in &program.bindings {
            for annotation in &binding.annotations {
                let (report, abort) = self.analyse(binding, annotation, &root, &mut uninterpreted);
                summary.reports.push(report);
                if let Some(err) = abort {
                    error!("{err}");
                    summary.aborted = Some(err);
                    return summary;
                }
            }
        }
        summary
    }

    fn analyse(
        &self,
        binding: &Binding,
        annotation: &Annotation,
        root: &Env<'_>,
        uninterpreted: &mut Globals,
    ) -> (BindingReport, Option<DriverError>) {
        let default_opts = ProofOptions::default();
        let opts = match annotation {
            Annotation::Theorem(o) | Annotation::Safety(o) => o,
            Annotation::Uninterpret => &default_opts,
        };
        let mode = mode_of(annotation);
        let mut report = BindingReport::new(binding, mode);
        report.verbose = opts.verbose() || self.settings.verbose;

        if let Some(reason) = opts.skip_reason() {
            info!("[{}] {}: skipped ({reason})", binding.loc, binding.name);
            report.note = Some(format!("skipped: {reason}"));
            return (report, None);
        }

        if !self.policy.is_provable(binding) {
            report.enter(BindingState::FailedFatal);
            let err = DriverError::Unprovable {
                binding: binding.name.clone(),
                loc: binding.loc.clone(),
            };
            return (report, Some(err));
        }
        report.enter(BindingState::TypeChecked);

        if mode == Mode::Uninterpret {
            let abort = self.uninterpret(binding, uninterpreted, &mut report);
            return (report, abort);
        }

        report.enter(BindingState::Evaluating);
        let scope = root.extend_all(uninterpreted.clone());
        let env = scope.at(binding.loc.clone());
        let evaluated = catch_unwind(AssertUnwindSafe(|| self.obligation(binding, mode, &env)));
        let obligation = match evaluated {
            Ok(Ok(ob)) => ob,
            Ok(Err(error)) => {
                report.enter(BindingState::FailedFatal);
                let err = DriverError::Coverage {
                    binding: binding.name.clone(),
                    error,
                };
                return (report, Some(err));
            }
            Err(payload) => {
                let message = format!("evaluation panicked: {}", panic_message(payload.as_ref()));
                let abort = self.failed(binding, opts, &mut report, message);
                return (report, abort);
            }
        };

        if mode == Mode::Safety && obligation.goal == Term::Bool(true) {
            info!("[{}] {}: no partial operations to check", binding.loc, binding.name);
            report.note = Some("no side conditions".to_string());
            report.enter(BindingState::Succeeded);
            return (report, None);
        }

        if opts.debug() {
            info!("[{}] {}: obligation over {:?}\n{}", binding.loc, binding.name, obligation.kinds(), obligation.goal);
            info!("{}", render_script(&obligation, false));
        }

        report.enter(BindingState::Solving);
        let selectors = match opts.selectors() {
            s if s.is_empty() => self.settings.default_solvers.clone(),
            s => s,
        };
        report.solvers = selectors.iter().map(|s| s.to_string()).collect();
        let backends = match self.solvers.backends_for(&selectors, report.verbose) {
            Ok(b) => b,
            Err(e) => {
                report.enter(BindingState::FailedFatal);
                return (report, Some(self.configuration(binding, e.to_string())));
            }
        };
        info!(
            "[{}] {}: proving with {}",
            binding.loc,
            binding.name,
            report.solvers.join(", ")
        );

        let verdict = match prove(&obligation, &backends) {
            Ok(v) => v,
            Err(e) => {
                report.enter(BindingState::FailedFatal);
                return (report, Some(self.configuration(binding, e.to_string())));
            }
        };

        if report.verbose {
            for attempt in &verdict.attempts {
                if let Ok(answer) = &attempt.outcome {
                    info!("{} output:\n{}", attempt.backend, answer.raw.trim_end());
                }
            }
        }
        let adopted = verdict.adopted().summary();
        info!("{adopted}");
        let proved = verdict.is_proved();
        report.verdict = Some(verdict);

        if proved {
            info!("Q.E.D.");
            report.enter(BindingState::Succeeded);
            (report, None)
        } else {
            let abort = self.failed(binding, opts, &mut report, adopted);
            (report, abort)
        }
    }

    fn obligation(&self, binding: &Binding, mode: Mode, env: &Env<'_>) -> Result<Obligation, EvalError> {
        let mut ev = Evaluator::new(&self.prelude.types);
        match mode {
            Mode::Safety => {
                let value = ev.eval_closed(&binding.body, env)?;
                let goal = Term::all(value.safety_conditions());
                Ok(Obligation::new(ev.fresh_vars().to_vec(), goal))
            }
            _ => ev.theorem(&binding.body, env),
        }
    }

    fn uninterpret(
        &self,
        binding: &Binding,
        uninterpreted: &mut Globals,
        report: &mut BindingReport,
    ) -> Option<DriverError> {
        match self.bind_uninterpreted(binding, uninterpreted) {
            Ok(kind) => {
                info!("[{}] {}: uninterpreted {kind} constant", binding.loc, binding.name);
                report.enter(BindingState::Succeeded);
                None
            }
            Err(err) => {
                report.enter(BindingState::FailedFatal);
                Some(err)
            }
        }
    }

    fn bind_uninterpreted(
        &self,
        binding: &Binding,
        uninterpreted: &mut Globals,
    ) -> Result<BaseKind, DriverError> {
        let Some(kind) = self.prelude.types.resolve(&binding.ty) else {
            return Err(DriverError::Coverage {
                binding: binding.name.clone(),
                error: EvalError {
                    kind: EvalErrorKind::UnresolvableVariableType {
                        name: binding.name.clone(),
                        ty: binding.ty.to_string(),
                    },
                    loc: Some(binding.loc.clone()),
                },
            });
        };
        let constant = SymVar {
            id: uninterpreted.len() as u32,
            name: binding.name.clone(),
            kind,
            origin: VarOrigin::Uninterpreted,
        };
        uninterpreted.insert(
            EnvKey::new(binding.name.clone(), kind),
            SVal::Base(Term::Var(constant)),
        );
        Ok(kind)
    }

    /// The obligation of the first theorem or safety annotation on `name`,
    /// with earlier uninterpreted bindings in scope. `None` when no such
    /// binding or annotation exists.
    pub fn obligation_of(
        &self,
        program: &Program,
        name: &str,
    ) -> Result<Option<Obligation>, DriverError> {
        let root = Env::root(self.prelude.globals.clone());
        let mut uninterpreted = Globals::new();
        for binding in &program.bindings {
            if binding.name == name {
                let Some(mode) = binding
                    .annotations
                    .iter()
                    .map(mode_of)
                    .find(|m| *m != Mode::Uninterpret)
                else {
                    return Ok(None);
                };
                let scope = root.extend_all(uninterpreted);
                let env = scope.at(binding.loc.clone());
                return self
                    .obligation(binding, mode, &env)
                    .map(Some)
                    .map_err(|error| DriverError::Coverage {
                        binding: binding.name.clone(),
                        error,
                    });
            }
            if binding
                .annotations
                .iter()
                .any(|a| mode_of(a) == Mode::Uninterpret)
            {
                self.bind_uninterpreted(binding, &mut uninterpreted)?;
            }
        }
        Ok(None)
    }

    fn failed(
        &self,
        binding: &Binding,
        opts: &ProofOptions,
        report: &mut BindingReport,
        result: String,
    ) -> Option<DriverError> {
        if opts.warn_if_fails() || self.settings.warn_if_fails {
            warn!("[{}] {}: Failed. ({result})", binding.loc, binding.name);
            report.note = Some(result);
            report.enter(BindingState::FailedRecoverable);
            None
        } else {
            report.note = Some(result.clone());
            report.enter(BindingState::FailedFatal);
            Some(DriverError::ProofFailed {
                binding: binding.name.clone(),
                loc: binding.loc.clone(),
                result,
            })
        }
    }

    fn configuration(&self, binding: &Binding, message: String) -> DriverError {
        DriverError::Configuration {
            binding: binding.name.clone(),
            loc: binding.loc.clone(),
            message,
        }
    }
}
