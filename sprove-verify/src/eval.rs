#![forbid(unsafe_code)]

use miette::Diagnostic;
use sprove_ir::{describe_loc, format_expr, format_type, Expr, SrcLoc, Var};
use thiserror::Error;
use tracing::trace;

use crate::dict::resolve_dictionary_call;
use crate::env::Env;
use crate::kind::{BaseKind, BaseTypeResolver};
use crate::term::{SymVar, Term, VarOrigin};
use crate::value::SVal;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
    #[error("unsupported {construct}: {rendered}")]
    UnsupportedConstruct {
        construct: &'static str,
        rendered: String,
    },
    #[error("non-local variable with unresolvable type: {name} :: {ty}")]
    UnresolvableVariableType { name: String, ty: String },
    #[error("unbound non-local variable: {name} :: {kind}")]
    UnboundVariable { name: String, kind: BaseKind },
    #[error("abstraction over a non-basic type: {name} :: {ty} in {rendered}")]
    NonBasicAbstraction {
        name: String,
        ty: String,
        rendered: String,
    },
    #[error("unsupported application: {rendered}")]
    UnsupportedApplication { rendered: String },
    #[error("expression too complicated for the solver: {rendered}")]
    TooComplicated { rendered: String },
    #[error("expected a boolean result but got {kind}: {rendered}")]
    NotBoolean { kind: BaseKind, rendered: String },
    #[error("{message} in {rendered}")]
    BuiltinMisuse { message: String, rendered: String },
}

/// A coverage error: the input falls outside the analysable subset.
#[derive(Clone, Debug, Error, Diagnostic)]
#[error("{}: {kind}", describe_loc(.loc))]
#[diagnostic(
    code(sprove::eval),
    help("only variables, type/value applications, lambdas over basic types and location markers can be analysed")
)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub loc: Option<SrcLoc>,
}

impl EvalError {
    fn at(env: &Env<'_>, kind: EvalErrorKind) -> Self {
        Self {
            kind,
            loc: env.loc().cloned(),
        }
    }

    pub fn is_unsupported_construct(&self) -> bool {
        matches!(self.kind, EvalErrorKind::UnsupportedConstruct { .. })
    }
}

/// A closed formula handed to the solvers: valid iff `not goal` is unsatisfiable.
#[derive(Clone, Debug, PartialEq)]
pub struct Obligation {
    pub vars: Vec<SymVar>,
    pub goal: Term,
}

impl Obligation {
    /// `bound` keeps its order; free variables of `goal` that were not bound
    /// by a lambda (uninterpreted constants) follow.
    pub fn new(bound: Vec<SymVar>, goal: Term) -> Self {
        let mut vars = bound;
        for v in goal.free_vars() {
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        Self { vars, goal }
    }

    pub fn kinds(&self) -> Vec<BaseKind> {
        self.vars.iter().map(|v| v.kind).collect()
    }
}

/// Recursive-descent interpreter from IR to symbolic values.
pub struct Evaluator<'t> {
    types: &'t BaseTypeResolver,
    next_id: u32,
    fresh: Vec<SymVar>,
}

impl<'t> Evaluator<'t> {
    pub fn new(types: &'t BaseTypeResolver) -> Self {
        Self {
            types,
            next_id: 0,
            fresh: Vec::new(),
        }
    }

    /// Variables allocated for lambda binders so far, in allocation order.
    pub fn fresh_vars(&self) -> &[SymVar] {
        &self.fresh
    }

    fn fresh(&mut self, name: &str, kind: BaseKind) -> SymVar {
        let v = SymVar {
            id: self.next_id,
            name: name.to_string(),
            kind,
            origin: VarOrigin::Lambda,
        };
        self.next_id += 1;
        self.fresh.push(v.clone());
        v
    }

    pub fn eval(&mut self, expr: &Expr, env: &Env<'_>) -> Result<SVal, EvalError> {
        match expr {
            Expr::Var(v) => self.eval_var(v, env),
            Expr::Lit(_) => Err(unsupported(env, "literal", expr)),
            Expr::App(fun, arg) => match arg.as_ref() {
                Expr::Type(_) => self.eval(fun, env),
                _ => self.eval_app(expr, fun, arg, env),
            },
            Expr::Lam(binder, body) => self.eval_lam(expr, binder, body, env),
            Expr::Let { .. } => Err(unsupported(env, "local binding (let)", expr)),
            Expr::Case { .. } => Err(unsupported(env, "pattern match (case)", expr)),
            Expr::Cast(..) => Err(unsupported(env, "type coercion (cast)", expr)),
            Expr::Type(_) => Err(unsupported(env, "bare type expression", expr)),
            Expr::Coercion(_) => Err(unsupported(env, "bare coercion expression", expr)),
            Expr::Tick(loc, inner) => {
                let here = env.at(loc.clone());
                self.eval(inner, &here)
            }
        }
    }

    /// Evaluate a complete expression that must reduce to a scalar.
    pub fn eval_closed(&mut self, expr: &Expr, env: &Env<'_>) -> Result<Term, EvalError> {
        match self.eval(expr, env)? {
            SVal::Base(t) => Ok(t),
            SVal::Func(_) => Err(EvalError::at(
                env,
                EvalErrorKind::TooComplicated {
                    rendered: format_expr(expr),
                },
            )),
        }
    }

    /// Evaluate a theorem body into its proof obligation.
    pub fn theorem(&mut self, expr: &Expr, env: &Env<'_>) -> Result<Obligation, EvalError> {
        let goal = self.eval_closed(expr, env)?;
        if goal.kind() != BaseKind::Bool {
            return Err(EvalError::at(
                env,
                EvalErrorKind::NotBoolean {
                    kind: goal.kind(),
                    rendered: format_expr(expr),
                },
            ));
        }
        Ok(Obligation::new(self.fresh.clone(), goal))
    }

    fn eval_var(&mut self, v: &Var, env: &Env<'_>) -> Result<SVal, EvalError> {
        let Some(kind) = self.types.resolve(&v.ty) else {
            return Err(EvalError::at(
                env,
                EvalErrorKind::UnresolvableVariableType {
                    name: v.name.clone(),
                    ty: format_type(&v.ty),
                },
            ));
        };
        env.lookup(&v.name, kind).cloned().ok_or_else(|| {
            EvalError::at(
                env,
                EvalErrorKind::UnboundVariable {
                    name: v.name.clone(),
                    kind,
                },
            )
        })
    }

    fn eval_app(
        &mut self,
        expr: &Expr,
        fun: &Expr,
        arg: &Expr,
        env: &Env<'_>,
    ) -> Result<SVal, EvalError> {
        if let Some(op) = resolve_dictionary_call(fun, arg, self.types, env) {
            trace!(call = %format_expr(expr), "resolved dictionary call");
            return Ok(op);
        }

        let f = match self.eval(fun, env)? {
            SVal::Func(f) => f,
            SVal::Base(_) => {
                return Err(EvalError::at(
                    env,
                    EvalErrorKind::UnsupportedApplication {
                        rendered: format_expr(expr),
                    },
                ));
            }
        };
        let a = self.eval(arg, env)?;
        f.call(a).map_err(|e| {
            EvalError::at(
                env,
                EvalErrorKind::BuiltinMisuse {
                    message: e.0,
                    rendered: format_expr(expr),
                },
            )
        })
    }

    fn eval_lam(
        &mut self,
        expr: &Expr,
        binder: &Var,
        body: &Expr,
        env: &Env<'_>,
    ) -> Result<SVal, EvalError> {
        let Some(kind) = self.types.resolve(&binder.ty) else {
            return Err(EvalError::at(
                env,
                EvalErrorKind::NonBasicAbstraction {
                    name: binder.name.clone(),
                    ty: format_type(&binder.ty),
                    rendered: format_expr(expr),
                },
            ));
        };
        let v = self.fresh(&binder.name, kind);
        let scope = env.extend(binder.name.clone(), kind, SVal::Base(Term::Var(v)));
        self.eval(body, &scope)
    }
}

fn unsupported(env: &Env<'_>, construct: &'static str, expr: &Expr) -> EvalError {
    EvalError::at(
        env,
        EvalErrorKind::UnsupportedConstruct {
            construct,
            rendered: format_expr(expr),
        },
    )
}
