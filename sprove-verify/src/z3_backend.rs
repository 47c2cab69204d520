#![forbid(unsafe_code)]

//! In-process Z3 backend (cargo feature `z3`).

use z3::ast::{Ast, Bool, Dynamic, Int, BV};
use z3::{Config, Context, Params, SatResult, Solver};

use crate::eval::Obligation;
use crate::kind::BaseKind;
use crate::smtlib::{binary_symbol, render_script};
use crate::solver::{BackendAnswer, BackendConfig, BackendFault, SolverBackend, SolverResult};
use crate::term::{Term, UnOp};

pub struct Z3Backend {
    config: BackendConfig,
}

impl Z3Backend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }
}

struct Translator<'c> {
    ctx: &'c Context,
}

impl<'c> Translator<'c> {
    fn boolean(&self, t: &Term) -> Result<Bool<'c>, String> {
        self.term(t)?
            .as_bool()
            .ok_or_else(|| format!("expected a boolean: {t}"))
    }

    fn int(&self, t: &Term) -> Result<Int<'c>, String> {
        self.term(t)?
            .as_int()
            .ok_or_else(|| format!("expected an integer: {t}"))
    }

    fn bv(&self, t: &Term) -> Result<BV<'c>, String> {
        self.term(t)?
            .as_bv()
            .ok_or_else(|| format!("expected a bit-vector: {t}"))
    }

    fn term(&self, t: &Term) -> Result<Dynamic<'c>, String> {
        let ctx = self.ctx;
        match t {
            Term::Var(v) => {
                let name = v.smt_name();
                Ok(match v.kind {
                    BaseKind::Bool => Dynamic::from_ast(&Bool::new_const(ctx, name)),
                    BaseKind::Integer => Dynamic::from_ast(&Int::new_const(ctx, name)),
                    k => Dynamic::from_ast(&BV::new_const(ctx, name, k.width().unwrap_or(64))),
                })
            }
            Term::Bool(b) => Ok(Dynamic::from_ast(&Bool::from_bool(ctx, *b))),
            Term::Int { value, kind } => match kind.width() {
                None => {
                    let i = Int::from_str(ctx, &value.to_string())
                        .ok_or_else(|| format!("integer literal out of range: {value}"))?;
                    Ok(Dynamic::from_ast(&i))
                }
                Some(w) => Ok(Dynamic::from_ast(&BV::from_i64(ctx, *value as i64, w))),
            },
            Term::Unary { op: UnOp::Not, arg } => Ok(Dynamic::from_ast(&self.boolean(arg)?.not())),
            Term::Unary { op: UnOp::Neg, arg } => {
                if arg.kind().is_bitvector() {
                    Ok(Dynamic::from_ast(&self.bv(arg)?.bvneg()))
                } else {
                    Ok(Dynamic::from_ast(&self.int(arg)?.unary_minus()))
                }
            }
            Term::Ite { cond, then, els } => {
                let c = self.boolean(cond)?;
                Ok(c.ite(&self.term(then)?, &self.term(els)?))
            }
            Term::Binary { op, lhs, rhs } => {
                let sym = binary_symbol(*op, lhs.kind());
                match sym {
                    "=" => Ok(Dynamic::from_ast(&self.term(lhs)?._eq(&self.term(rhs)?))),
                    "distinct" => Ok(Dynamic::from_ast(&self.term(lhs)?._eq(&self.term(rhs)?).not())),
                    "and" | "or" | "=>" => {
                        let (a, b) = (self.boolean(lhs)?, self.boolean(rhs)?);
                        Ok(Dynamic::from_ast(&match sym {
                            "and" => Bool::and(ctx, &[&a, &b]),
                            "or" => Bool::or(ctx, &[&a, &b]),
                            _ => a.implies(&b),
                        }))
                    }
                    s if s.starts_with("bv") => {
                        let (a, b) = (self.bv(lhs)?, self.bv(rhs)?);
                        let out = match s {
                            "bvadd" => Dynamic::from_ast(&a.bvadd(&b)),
                            "bvsub" => Dynamic::from_ast(&a.bvsub(&b)),
                            "bvmul" => Dynamic::from_ast(&a.bvmul(&b)),
                            "bvsdiv" => Dynamic::from_ast(&a.bvsdiv(&b)),
                            "bvudiv" => Dynamic::from_ast(&a.bvudiv(&b)),
                            "bvsrem" => Dynamic::from_ast(&a.bvsrem(&b)),
                            "bvurem" => Dynamic::from_ast(&a.bvurem(&b)),
                            "bvsmod" => Dynamic::from_ast(&a.bvsmod(&b)),
                            "bvslt" => Dynamic::from_ast(&a.bvslt(&b)),
                            "bvsle" => Dynamic::from_ast(&a.bvsle(&b)),
                            "bvsgt" => Dynamic::from_ast(&a.bvsgt(&b)),
                            "bvsge" => Dynamic::from_ast(&a.bvsge(&b)),
                            "bvult" => Dynamic::from_ast(&a.bvult(&b)),
                            "bvule" => Dynamic::from_ast(&a.bvule(&b)),
                            "bvugt" => Dynamic::from_ast(&a.bvugt(&b)),
                            "bvuge" => Dynamic::from_ast(&a.bvuge(&b)),
                            other => return Err(format!("no Z3 counterpart for `{other}`")),
                        };
                        Ok(out)
                    }
                    s => {
                        let (a, b) = (self.int(lhs)?, self.int(rhs)?);
                        Ok(match s {
                            "+" => Dynamic::from_ast(&Int::add(ctx, &[&a, &b])),
                            "-" => Dynamic::from_ast(&Int::sub(ctx, &[&a, &b])),
                            "*" => Dynamic::from_ast(&Int::mul(ctx, &[&a, &b])),
                            "div" => Dynamic::from_ast(&a.div(&b)),
                            "mod" => Dynamic::from_ast(&a.modulo(&b)),
                            "<" => Dynamic::from_ast(&a.lt(&b)),
                            "<=" => Dynamic::from_ast(&a.le(&b)),
                            ">" => Dynamic::from_ast(&a.gt(&b)),
                            ">=" => Dynamic::from_ast(&a.ge(&b)),
                            other => return Err(format!("no Z3 counterpart for `{other}`")),
                        })
                    }
                }
            }
        }
    }
}

impl SolverBackend for Z3Backend {
    fn name(&self) -> String {
        "z3 (in-process)".to_string()
    }

    fn check(&self, obligation: &Obligation) -> Result<BackendAnswer, BackendFault> {
        let mut cfg = Config::new();
        cfg.set_model_generation(true);
        let ctx = Context::new(&cfg);
        let solver = Solver::new(&ctx);
        if let Some(t) = self.config.timeout {
            let mut params = Params::new(&ctx);
            params.set_u32("timeout", u32::try_from(t.as_millis()).unwrap_or(u32::MAX));
            solver.set_params(&params);
        }

        let goal = Translator { ctx: &ctx }
            .boolean(&obligation.goal)
            .map_err(|message| BackendFault::Unavailable {
                backend: self.name(),
                message,
            })?;
        solver.assert(&goal.not());

        let result = match solver.check() {
            SatResult::Unsat => SolverResult::Proved,
            SatResult::Sat => SolverResult::Disproved {
                model: solver.get_model().map(|m| m.to_string()),
            },
            SatResult::Unknown => match solver.get_reason_unknown() {
                Some(r) if r.contains("timeout") || r.contains("canceled") => SolverResult::Timeout,
                reason => SolverResult::Unknown { reason },
            },
        };
        let mut raw = String::new();
        if self.config.verbose {
            raw.push_str(&render_script(obligation, false));
            raw.push_str("; ---- response ----\n");
        }
        raw.push_str(&solver.to_string());
        Ok(BackendAnswer { result, raw })
    }
}
