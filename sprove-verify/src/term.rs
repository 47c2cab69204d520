#![forbid(unsafe_code)]

use std::fmt;

use crate::kind::BaseKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarOrigin {
    /// Introduced for a lambda-bound parameter.
    Lambda,
    /// A binding the user asked to keep uninterpreted.
    Uninterpreted,
}

/// A free symbolic scalar. The solver quantifies over all of them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymVar {
    pub id: u32,
    pub name: String,
    pub kind: BaseKind,
    pub origin: VarOrigin,
}

impl SymVar {
    /// `l<id>_<name>` for parameters, `u<id>_<name>` for uninterpreted
    /// constants. Origin and id precede the first `_`, so two variables
    /// share a symbol only if they share origin and id; the sanitised name
    /// is decoration.
    pub fn smt_name(&self) -> String {
        let base: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let prefix = match self.origin {
            VarOrigin::Lambda => 'l',
            VarOrigin::Uninterpreted => 'u',
        };
        format!("{prefix}{}_{base}", self.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOp {
    Not,
    Neg,
}

/// Primitive operators; each maps to exactly one SMT-LIB function for a
/// given operand kind. Signedness of comparisons and division follows the
/// operand kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    /// `div` on integers (euclidean), `bvsdiv` / `bvudiv` on bit-vectors.
    Div,
    /// `mod` on integers (euclidean), `bvsrem` / `bvurem` on bit-vectors.
    Rem,
    /// Remainder with the sign of the divisor: `bvsmod` on signed vectors.
    SMod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Implies,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or | BinOp::Implies)
    }

    /// Operators that are undefined for a zero right operand.
    pub fn is_partial(&self) -> bool {
        matches!(self, BinOp::Div | BinOp::Rem | BinOp::SMod)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(SymVar),
    Bool(bool),
    Int { value: i128, kind: BaseKind },
    Unary { op: UnOp, arg: Box<Term> },
    Binary { op: BinOp, lhs: Box<Term>, rhs: Box<Term> },
    Ite { cond: Box<Term>, then: Box<Term>, els: Box<Term> },
}

impl Term {
    pub fn int(value: i128, kind: BaseKind) -> Self {
        Term::Int { value, kind }
    }

    pub fn unary(op: UnOp, arg: Term) -> Self {
        Term::Unary {
            op,
            arg: Box::new(arg),
        }
    }

    pub fn binary(op: BinOp, lhs: Term, rhs: Term) -> Self {
        Term::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(arg: Term) -> Self {
        Term::unary(UnOp::Not, arg)
    }

    pub fn ite(cond: Term, then: Term, els: Term) -> Self {
        Term::Ite {
            cond: Box::new(cond),
            then: Box::new(then),
            els: Box::new(els),
        }
    }

    /// Conjunction of `terms`; `true` when empty.
    pub fn all(terms: Vec<Term>) -> Self {
        let mut it = terms.into_iter();
        match it.next() {
            None => Term::Bool(true),
            Some(first) => it.fold(first, |acc, t| Term::binary(BinOp::And, acc, t)),
        }
    }

    pub fn kind(&self) -> BaseKind {
        match self {
            Term::Var(v) => v.kind,
            Term::Bool(_) => BaseKind::Bool,
            Term::Int { kind, .. } => *kind,
            Term::Unary { op: UnOp::Not, .. } => BaseKind::Bool,
            Term::Unary { op: UnOp::Neg, arg } => arg.kind(),
            Term::Binary { op, lhs, .. } => {
                if op.is_comparison() || op.is_logical() {
                    BaseKind::Bool
                } else {
                    lhs.kind()
                }
            }
            Term::Ite { then, .. } => then.kind(),
        }
    }

    /// Free variables in first-occurrence order, without duplicates.
    pub fn free_vars(&self) -> Vec<SymVar> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars(&self, out: &mut Vec<SymVar>) {
        match self {
            Term::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Term::Bool(_) | Term::Int { .. } => {}
            Term::Unary { arg, .. } => arg.collect_vars(out),
            Term::Binary { lhs, rhs, .. } => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            Term::Ite { cond, then, els } => {
                cond.collect_vars(out);
                then.collect_vars(out);
                els.collect_vars(out);
            }
        }
    }

    /// Side conditions under which every partial operation in the term is
    /// defined (divisors are non-zero), outermost first.
    pub fn safety_conditions(&self) -> Vec<Term> {
        let mut out = Vec::new();
        self.collect_safety(&mut out);
        out
    }

    fn collect_safety(&self, out: &mut Vec<Term>) {
        match self {
            Term::Var(_) | Term::Bool(_) | Term::Int { .. } => {}
            Term::Unary { arg, .. } => arg.collect_safety(out),
            Term::Binary { op, lhs, rhs } => {
                if op.is_partial() {
                    let zero = Term::int(0, rhs.kind());
                    let cond = Term::binary(BinOp::Ne, (**rhs).clone(), zero);
                    if !out.contains(&cond) {
                        out.push(cond);
                    }
                }
                lhs.collect_safety(out);
                rhs.collect_safety(out);
            }
            Term::Ite { cond, then, els } => {
                cond.collect_safety(out);
                then.collect_safety(out);
                els.collect_safety(out);
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::smtlib::render_term(self))
    }
}
