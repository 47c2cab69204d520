#![forbid(unsafe_code)]

pub mod builtins;
pub mod dict;
pub mod driver;
pub mod env;
pub mod eval;
pub mod kind;
pub mod orchestrator;
pub mod process;
pub mod registry;
pub mod smtlib;
pub mod solver;
pub mod term;
pub mod value;
#[cfg(feature = "z3")]
pub mod z3_backend;

pub use builtins::{standard, SymbolicPrelude};
pub use dict::{classify_call, witness_kind, CallSite, WitnessKind};
pub use driver::{
    AlwaysProvable, BindingReport, BindingState, Driver, DriverError, DriverSettings, Mode,
    ProvabilityPolicy, RunSummary,
};
pub use env::{Env, EnvKey, Globals};
pub use eval::{EvalError, EvalErrorKind, Evaluator, Obligation};
pub use kind::{BaseKind, BaseTypeResolver};
pub use orchestrator::{prove, Attempt, OrchestratorError, Verdict};
pub use process::ProcessBackend;
pub use registry::{EngineSettings, SelectionError, SolverRegistry, SolverSelection};
pub use solver::{BackendAnswer, BackendConfig, BackendFault, ResultKind, SolverBackend, SolverResult};
pub use term::{BinOp, SymVar, Term, UnOp, VarOrigin};
pub use value::{BuiltinError, SFunc, SVal};
#[cfg(feature = "z3")]
pub use z3_backend::Z3Backend;
