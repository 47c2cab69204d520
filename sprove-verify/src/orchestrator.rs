#![forbid(unsafe_code)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::eval::Obligation;
use crate::solver::{BackendAnswer, BackendFault, ResultKind, SolverBackend, SolverResult};

#[derive(Debug, Error, Diagnostic)]
pub enum OrchestratorError {
    #[error("no solver backends were configured for this obligation")]
    #[diagnostic(code(sprove::orchestrator::no_backends))]
    NoBackends,
}

/// One backend's run against an obligation.
#[derive(Debug)]
pub struct Attempt {
    pub backend: String,
    pub elapsed: Duration,
    pub outcome: Result<BackendAnswer, BackendFault>,
}

impl Attempt {
    pub fn kind(&self) -> ResultKind {
        match &self.outcome {
            Ok(answer) => answer.result.kind(),
            Err(_) => ResultKind::Fault,
        }
    }

    pub fn is_proved(&self) -> bool {
        matches!(&self.outcome, Ok(a) if a.result.is_proved())
    }

    /// One-line rendering, `<backend>: <result>`.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Ok(answer) => format!("{}: {}", self.backend, answer.result),
            Err(fault) => format!("{}: {fault}", self.backend),
        }
    }
}

/// All attempts in completion order plus the index of the adopted one.
#[derive(Debug)]
pub struct Verdict {
    pub adopted: usize,
    pub attempts: Vec<Attempt>,
}

impl Verdict {
    pub fn adopted(&self) -> &Attempt {
        &self.attempts[self.adopted]
    }

    pub fn is_proved(&self) -> bool {
        self.adopted().is_proved()
    }

    pub fn result(&self) -> Option<&SolverResult> {
        self.adopted().outcome.as_ref().ok().map(|a| &a.result)
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_one(backend: &dyn SolverBackend, obligation: &Obligation) -> Attempt {
    let name = backend.name();
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| backend.check(obligation)))
        .unwrap_or_else(|payload| {
            Err(BackendFault::Panicked {
                backend: name.clone(),
                message: panic_message(payload.as_ref()),
            })
        });
    Attempt {
        backend: name,
        elapsed: started.elapsed(),
        outcome,
    }
}

/// Run every backend concurrently against the obligation.
///
/// The adopted attempt is the first to report `Proved`; failing that the
/// first answer of any kind; failing that the first fault.
pub fn prove(
    obligation: &Obligation,
    backends: &[Arc<dyn SolverBackend>],
) -> Result<Verdict, OrchestratorError> {
    if backends.is_empty() {
        return Err(OrchestratorError::NoBackends);
    }

    let (tx, rx) = mpsc::channel();
    rayon::scope(|s| {
        for backend in backends {
            let tx = tx.clone();
            s.spawn(move |_| {
                let _ = tx.send(run_one(backend.as_ref(), obligation));
            });
        }
    });
    drop(tx);
    let attempts: Vec<Attempt> = rx.into_iter().collect();

    for a in &attempts {
        match &a.outcome {
            Ok(answer) => debug!(
                backend = %a.backend,
                elapsed_ms = a.elapsed.as_millis() as u64,
                result = ?answer.result.kind(),
                "raw solver output:\n{}",
                answer.raw
            ),
            Err(fault) => debug!(backend = %a.backend, "backend fault: {fault}"),
        }
    }

    let adopted = attempts
        .iter()
        .position(Attempt::is_proved)
        .or_else(|| attempts.iter().position(|a| a.outcome.is_ok()))
        .unwrap_or(0);
    Ok(Verdict { adopted, attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    struct Fixed(&'static str, SolverResult);

    impl SolverBackend for Fixed {
        fn name(&self) -> String {
            self.0.to_string()
        }

        fn check(&self, _: &Obligation) -> Result<BackendAnswer, BackendFault> {
            Ok(BackendAnswer {
                result: self.1.clone(),
                raw: String::new(),
            })
        }
    }

    struct Boom;

    impl SolverBackend for Boom {
        fn name(&self) -> String {
            "boom".to_string()
        }

        fn check(&self, _: &Obligation) -> Result<BackendAnswer, BackendFault> {
            panic!("solver exploded")
        }
    }

    fn trivial() -> Obligation {
        Obligation::new(Vec::new(), Term::Bool(true))
    }

    #[test]
    fn empty_backend_list_is_an_error() {
        assert!(matches!(prove(&trivial(), &[]), Err(OrchestratorError::NoBackends)));
    }

    #[test]
    fn panics_become_faults() {
        let backends: Vec<Arc<dyn SolverBackend>> = vec![Arc::new(Boom)];
        let v = prove(&trivial(), &backends).unwrap();
        assert_eq!(v.attempts.len(), 1);
        assert_eq!(v.adopted().kind(), ResultKind::Fault);
        match &v.adopted().outcome {
            Err(BackendFault::Panicked { message, .. }) => assert_eq!(message, "solver exploded"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn answer_beats_fault() {
        let backends: Vec<Arc<dyn SolverBackend>> = vec![
            Arc::new(Boom),
            Arc::new(Fixed("cvc5", SolverResult::Timeout)),
        ];
        let v = prove(&trivial(), &backends).unwrap();
        assert_eq!(v.attempts.len(), 2);
        assert_eq!(v.adopted().backend, "cvc5");
        assert!(!v.is_proved());
    }

    #[test]
    fn panic_payload_text() {
        let text = |p: Box<dyn std::any::Any + Send>| panic_message(p.as_ref());
        assert_eq!(text(Box::new("static")), "static");
        assert_eq!(text(Box::new(format!("owned {}", 1))), "owned 1");
        assert_eq!(text(Box::new(42u8)), "unknown panic");
    }
}
