#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::kind::BaseKind;
use crate::term::Term;

/// Raised by a pre-bound operation that cannot accept its argument.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BuiltinError(pub String);

pub type BuiltinResult = Result<SVal, BuiltinError>;

/// A one-argument symbolic function.
#[derive(Clone)]
pub struct SFunc {
    name: Arc<str>,
    f: Arc<dyn Fn(SVal) -> BuiltinResult + Send + Sync>,
}

impl SFunc {
    pub fn new(name: &str, f: impl Fn(SVal) -> BuiltinResult + Send + Sync + 'static) -> Self {
        Self {
            name: Arc::from(name),
            f: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, arg: SVal) -> BuiltinResult {
        (self.f)(arg)
    }
}

impl fmt::Debug for SFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

#[derive(Clone, Debug)]
pub enum SVal {
    Base(Term),
    Func(SFunc),
}

impl SVal {
    pub fn func(
        name: &str,
        f: impl Fn(SVal) -> BuiltinResult + Send + Sync + 'static,
    ) -> Self {
        SVal::Func(SFunc::new(name, f))
    }

    pub fn as_base(&self) -> Option<&Term> {
        match self {
            SVal::Base(t) => Some(t),
            SVal::Func(_) => None,
        }
    }

    pub fn into_base(self) -> Option<Term> {
        match self {
            SVal::Base(t) => Some(t),
            SVal::Func(_) => None,
        }
    }

    /// Accept `self` as a scalar of `kind` on behalf of `op`.
    pub fn expect_kind(self, op: &str, kind: BaseKind) -> Result<Term, BuiltinError> {
        match self {
            SVal::Base(t) if t.kind() == kind => Ok(t),
            SVal::Base(t) => Err(BuiltinError(format!(
                "`{op}` expects an argument of kind {kind}, got {}",
                t.kind()
            ))),
            SVal::Func(f) => Err(BuiltinError(format!(
                "`{op}` expects a {kind} scalar, got unapplied function `{}`",
                f.name()
            ))),
        }
    }
}
