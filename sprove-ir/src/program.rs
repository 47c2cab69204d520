#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Expr, SrcLoc, Type};

#[derive(Debug, Error, Diagnostic)]
#[error("IR input error: {message}")]
#[diagnostic(code(sprove::ir))]
pub struct IrError {
    pub message: String,
}

/// Concrete solver engines a binding may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Z3,
    Cvc4,
    Cvc5,
    Yices,
    Boolector,
    Bitwuzla,
    MathSat,
}

impl Engine {
    pub const ALL: [Engine; 7] = [
        Engine::Z3,
        Engine::Cvc4,
        Engine::Cvc5,
        Engine::Yices,
        Engine::Boolector,
        Engine::Bitwuzla,
        Engine::MathSat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Z3 => "z3",
            Engine::Cvc4 => "cvc4",
            Engine::Cvc5 => "cvc5",
            Engine::Yices => "yices",
            Engine::Boolector => "boolector",
            Engine::Bitwuzla => "bitwuzla",
            Engine::MathSat => "mathsat",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Engine::ALL
            .into_iter()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| IrError {
                message: format!(
                    "unknown solver `{s}` (expected one of: {})",
                    Engine::ALL.map(|e| e.as_str()).join(", ")
                ),
            })
    }
}

/// Which backends to consult for one binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverSelector {
    Engine(Engine),
    AllInstalled,
}

impl fmt::Display for SolverSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverSelector::Engine(e) => write!(f, "{e}"),
            SolverSelector::AllInstalled => f.write_str("all installed solvers"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofOption {
    /// Report a failed proof as a warning and keep going.
    WarnIfFails,
    Verbose,
    Debug,
    Safety,
    Uninterpret,
    Skip(String),
    Solver(Engine),
    AnySolver,
}

/// The option set attached to a single annotation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofOptions(pub Vec<ProofOption>);

impl ProofOptions {
    pub fn new(options: impl IntoIterator<Item = ProofOption>) -> Self {
        Self(options.into_iter().collect())
    }

    pub fn has(&self, opt: &ProofOption) -> bool {
        self.0.contains(opt)
    }

    pub fn warn_if_fails(&self) -> bool {
        self.has(&ProofOption::WarnIfFails)
    }

    pub fn verbose(&self) -> bool {
        self.has(&ProofOption::Verbose) || self.debug()
    }

    pub fn debug(&self) -> bool {
        self.has(&ProofOption::Debug)
    }

    pub fn safety(&self) -> bool {
        self.has(&ProofOption::Safety)
    }

    pub fn uninterpret(&self) -> bool {
        self.has(&ProofOption::Uninterpret)
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.0.iter().find_map(|o| match o {
            ProofOption::Skip(reason) => Some(reason.as_str()),
            _ => None,
        })
    }

    /// Explicit solver selectors in the order they were written, deduplicated.
    pub fn selectors(&self) -> Vec<SolverSelector> {
        let mut out: Vec<SolverSelector> = Vec::new();
        for o in &self.0 {
            let sel = match o {
                ProofOption::Solver(e) => SolverSelector::Engine(*e),
                ProofOption::AnySolver => SolverSelector::AllInstalled,
                _ => continue,
            };
            if !out.contains(&sel) {
                out.push(sel);
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    Theorem(ProofOptions),
    Safety(ProofOptions),
    Uninterpret,
}

/// A top-level program binding as handed over by the annotation source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: String,
    pub loc: SrcLoc,
    pub ty: Type,
    pub body: Expr,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Name of the module the bindings were extracted from, if known.
    #[serde(default)]
    pub module: Option<String>,
    pub bindings: Vec<Binding>,
}

impl Program {
    pub fn from_json(text: &str) -> Result<Self, IrError> {
        serde_json::from_str(text).map_err(|e| IrError {
            message: format!("malformed program: {e}"),
        })
    }

    pub fn to_json(&self) -> Result<String, IrError> {
        serde_json::to_string_pretty(self).map_err(|e| IrError {
            message: format!("cannot serialize program: {e}"),
        })
    }
}
