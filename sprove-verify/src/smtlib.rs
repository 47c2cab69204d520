#![forbid(unsafe_code)]

//! SMT-LIB 2 rendering of terms and proof obligations.

use std::collections::BTreeSet;

use crate::eval::Obligation;
use crate::kind::BaseKind;
use crate::term::{BinOp, Term, UnOp};

pub fn render_term(t: &Term) -> String {
    let mut out = String::new();
    write_term(&mut out, t);
    out
}

fn write_term(out: &mut String, t: &Term) {
    match t {
        Term::Var(v) => out.push_str(&v.smt_name()),
        Term::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Term::Int { value, kind } => out.push_str(&render_int(*value, *kind)),
        Term::Unary { op, arg } => {
            let f = match (op, arg.kind().is_bitvector()) {
                (UnOp::Not, _) => "not",
                (UnOp::Neg, true) => "bvneg",
                (UnOp::Neg, false) => "-",
            };
            out.push('(');
            out.push_str(f);
            out.push(' ');
            write_term(out, arg);
            out.push(')');
        }
        Term::Binary { op, lhs, rhs } => {
            out.push('(');
            out.push_str(binary_symbol(*op, lhs.kind()));
            out.push(' ');
            write_term(out, lhs);
            out.push(' ');
            write_term(out, rhs);
            out.push(')');
        }
        Term::Ite { cond, then, els } => {
            out.push_str("(ite ");
            write_term(out, cond);
            out.push(' ');
            write_term(out, then);
            out.push(' ');
            write_term(out, els);
            out.push(')');
        }
    }
}

fn render_int(value: i128, kind: BaseKind) -> String {
    match kind.width() {
        None if value < 0 => format!("(- {})", value.unsigned_abs()),
        None => value.to_string(),
        Some(w) => {
            let bits = value.rem_euclid(1i128 << w) as u128;
            if w % 4 == 0 {
                format!("#x{:0width$x}", bits, width = (w / 4) as usize)
            } else {
                format!("#b{:0width$b}", bits, width = w as usize)
            }
        }
    }
}

/// SMT-LIB function symbol for `op` applied to operands of `kind`.
pub fn binary_symbol(op: BinOp, kind: BaseKind) -> &'static str {
    use BaseKind::*;
    match (op, kind) {
        (BinOp::Eq, _) => "=",
        (BinOp::Ne, _) => "distinct",
        (BinOp::And, _) => "and",
        (BinOp::Or, _) => "or",
        (BinOp::Implies, _) => "=>",

        (BinOp::Add, Signed(_) | Unsigned(_)) => "bvadd",
        (BinOp::Sub, Signed(_) | Unsigned(_)) => "bvsub",
        (BinOp::Mul, Signed(_) | Unsigned(_)) => "bvmul",
        (BinOp::Add, _) => "+",
        (BinOp::Sub, _) => "-",
        (BinOp::Mul, _) => "*",

        (BinOp::Div, Signed(_)) => "bvsdiv",
        (BinOp::Div, Unsigned(_)) => "bvudiv",
        (BinOp::Div, _) => "div",
        (BinOp::Rem, Signed(_)) => "bvsrem",
        (BinOp::Rem | BinOp::SMod, Unsigned(_)) => "bvurem",
        (BinOp::SMod, Signed(_)) => "bvsmod",
        (BinOp::Rem | BinOp::SMod, _) => "mod",

        (BinOp::Lt, Signed(_)) => "bvslt",
        (BinOp::Le, Signed(_)) => "bvsle",
        (BinOp::Gt, Signed(_)) => "bvsgt",
        (BinOp::Ge, Signed(_)) => "bvsge",
        (BinOp::Lt, Unsigned(_)) => "bvult",
        (BinOp::Le, Unsigned(_)) => "bvule",
        (BinOp::Gt, Unsigned(_)) => "bvugt",
        (BinOp::Ge, Unsigned(_)) => "bvuge",
        (BinOp::Lt, _) => "<",
        (BinOp::Le, _) => "<=",
        (BinOp::Gt, _) => ">",
        (BinOp::Ge, _) => ">=",
    }
}

fn collect_kinds(t: &Term, out: &mut BTreeSet<BaseKind>) {
    out.insert(t.kind());
    match t {
        Term::Var(_) | Term::Bool(_) | Term::Int { .. } => {}
        Term::Unary { arg, .. } => collect_kinds(arg, out),
        Term::Binary { lhs, rhs, .. } => {
            collect_kinds(lhs, out);
            collect_kinds(rhs, out);
        }
        Term::Ite { cond, then, els } => {
            collect_kinds(cond, out);
            collect_kinds(then, out);
            collect_kinds(els, out);
        }
    }
}

/// The narrowest standard logic covering the obligation.
pub fn logic_for(ob: &Obligation) -> &'static str {
    let mut kinds: BTreeSet<BaseKind> = ob.vars.iter().map(|v| v.kind).collect();
    collect_kinds(&ob.goal, &mut kinds);
    let ints = kinds.contains(&BaseKind::Integer);
    let bvs = kinds.iter().any(BaseKind::is_bitvector);
    match (ints, bvs) {
        (true, true) => "ALL",
        (true, false) => "QF_NIA",
        (false, _) => "QF_BV",
    }
}

/// Refutation script: the obligation holds iff the answer is `unsat`.
pub fn render_script(ob: &Obligation, with_model: bool) -> String {
    let mut out = String::new();
    out.push_str("(set-option :produce-models true)\n");
    out.push_str(&format!("(set-logic {})\n", logic_for(ob)));
    for v in &ob.vars {
        out.push_str(&format!(
            "(declare-fun {} () {})\n",
            v.smt_name(),
            v.kind.smt_sort()
        ));
    }
    out.push_str(&format!("(assert (not {}))\n", render_term(&ob.goal)));
    out.push_str("(check-sat)\n");
    if with_model {
        out.push_str("(get-info :reason-unknown)\n");
        out.push_str("(get-model)\n");
    }
    out.push_str("(exit)\n");
    out
}
