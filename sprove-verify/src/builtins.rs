#![forbid(unsafe_code)]

//! The standard environment provider: recognised nominal types and the
//! class methods and constants pre-bound for each base kind.

use std::sync::Arc;

use crate::env::{EnvKey, Globals};
use crate::kind::{BaseKind, BaseTypeResolver};
use crate::term::{BinOp, Term, UnOp};
use crate::value::SVal;

/// Initial base-type table plus the initial symbolic environment.
#[derive(Clone, Debug)]
pub struct SymbolicPrelude {
    pub types: BaseTypeResolver,
    pub globals: Globals,
}

pub const NUMERIC_KINDS: [BaseKind; 9] = [
    BaseKind::Integer,
    BaseKind::Signed(8),
    BaseKind::Signed(16),
    BaseKind::Signed(32),
    BaseKind::Signed(64),
    BaseKind::Unsigned(8),
    BaseKind::Unsigned(16),
    BaseKind::Unsigned(32),
    BaseKind::Unsigned(64),
];

pub fn standard() -> SymbolicPrelude {
    let types = BaseTypeResolver::new()
        .with("Bool", BaseKind::Bool)
        .with("Integer", BaseKind::Integer)
        .with("Int", BaseKind::Signed(64))
        .with("Int8", BaseKind::Signed(8))
        .with("Int16", BaseKind::Signed(16))
        .with("Int32", BaseKind::Signed(32))
        .with("Int64", BaseKind::Signed(64))
        .with("Word", BaseKind::Unsigned(64))
        .with("Word8", BaseKind::Unsigned(8))
        .with("Word16", BaseKind::Unsigned(16))
        .with("Word32", BaseKind::Unsigned(32))
        .with("Word64", BaseKind::Unsigned(64));

    let mut globals = Globals::new();
    register_bool(&mut globals);
    for kind in NUMERIC_KINDS {
        register_numeric(&mut globals, kind);
    }

    SymbolicPrelude { types, globals }
}

fn register_bool(g: &mut Globals) {
    let k = BaseKind::Bool;
    g.insert(EnvKey::new("True", k), SVal::Base(Term::Bool(true)));
    g.insert(EnvKey::new("False", k), SVal::Base(Term::Bool(false)));
    g.insert(EnvKey::new("==", k), binary("==", k, |a, b| Term::binary(BinOp::Eq, a, b)));
    g.insert(EnvKey::new("/=", k), binary("/=", k, |a, b| Term::binary(BinOp::Ne, a, b)));
}

fn register_numeric(g: &mut Globals, k: BaseKind) {
    let mut put = |name: &str, v: SVal| {
        g.insert(EnvKey::new(name, k), v);
    };

    put("zero", SVal::Base(Term::int(0, k)));
    put("one", SVal::Base(Term::int(1, k)));

    put("+", binary("+", k, |a, b| Term::binary(BinOp::Add, a, b)));
    put("-", binary("-", k, |a, b| Term::binary(BinOp::Sub, a, b)));
    put("*", binary("*", k, |a, b| Term::binary(BinOp::Mul, a, b)));
    put("negate", unary("negate", k, |a| Term::unary(UnOp::Neg, a)));
    put("abs", unary("abs", k, move |a| abs(k, a)));
    put("signum", unary("signum", k, move |a| signum(k, a)));

    put("quot", binary("quot", k, move |a, b| quot(k, a, b)));
    put("rem", binary("rem", k, move |a, b| rem(k, a, b)));
    put("div", binary("div", k, move |a, b| div(k, a, b)));
    put("mod", binary("mod", k, move |a, b| modulo(k, a, b)));

    put("==", binary("==", k, |a, b| Term::binary(BinOp::Eq, a, b)));
    put("/=", binary("/=", k, |a, b| Term::binary(BinOp::Ne, a, b)));
    put("<", binary("<", k, |a, b| Term::binary(BinOp::Lt, a, b)));
    put("<=", binary("<=", k, |a, b| Term::binary(BinOp::Le, a, b)));
    put(">", binary(">", k, |a, b| Term::binary(BinOp::Gt, a, b)));
    put(">=", binary(">=", k, |a, b| Term::binary(BinOp::Ge, a, b)));
    put("min", binary("min", k, |a, b| {
        Term::ite(Term::binary(BinOp::Le, a.clone(), b.clone()), a, b)
    }));
    put("max", binary("max", k, |a, b| {
        Term::ite(Term::binary(BinOp::Le, a.clone(), b.clone()), b, a)
    }));
}

fn unary(name: &str, kind: BaseKind, f: impl Fn(Term) -> Term + Send + Sync + 'static) -> SVal {
    let op = name.to_string();
    SVal::func(name, move |a| Ok(SVal::Base(f(a.expect_kind(&op, kind)?))))
}

/// Curried two-argument operation over scalars of one kind.
fn binary(
    name: &str,
    kind: BaseKind,
    f: impl Fn(Term, Term) -> Term + Send + Sync + 'static,
) -> SVal {
    let f = Arc::new(f);
    let op = name.to_string();
    SVal::func(name, move |a| {
        let lhs = a.expect_kind(&op, kind)?;
        let f = Arc::clone(&f);
        let op = op.clone();
        let name = op.clone();
        Ok(SVal::func(&name, move |b| {
            let rhs = b.expect_kind(&op, kind)?;
            Ok(SVal::Base(f(lhs.clone(), rhs)))
        }))
    })
}

fn lit(k: BaseKind, n: i128) -> Term {
    Term::int(n, k)
}

fn is_negative(k: BaseKind, a: &Term) -> Term {
    match k {
        BaseKind::Unsigned(_) => Term::Bool(false),
        _ => Term::binary(BinOp::Lt, a.clone(), lit(k, 0)),
    }
}

fn abs(k: BaseKind, a: Term) -> Term {
    match k {
        BaseKind::Unsigned(_) => a,
        _ => Term::ite(is_negative(k, &a), Term::unary(UnOp::Neg, a.clone()), a),
    }
}

fn signum(k: BaseKind, a: Term) -> Term {
    let nonzero = Term::ite(
        Term::binary(BinOp::Eq, a.clone(), lit(k, 0)),
        lit(k, 0),
        lit(k, 1),
    );
    match k {
        BaseKind::Unsigned(_) => nonzero,
        _ => Term::ite(is_negative(k, &a), lit(k, -1), nonzero),
    }
}

/// Division truncated toward zero.
fn quot(k: BaseKind, a: Term, b: Term) -> Term {
    match k {
        BaseKind::Integer => {
            let q = Term::binary(BinOp::Div, abs(k, a.clone()), abs(k, b.clone()));
            let same_sign = Term::binary(
                BinOp::Eq,
                Term::binary(BinOp::Ge, a, lit(k, 0)),
                Term::binary(BinOp::Ge, b, lit(k, 0)),
            );
            Term::ite(same_sign, q.clone(), Term::unary(UnOp::Neg, q))
        }
        _ => Term::binary(BinOp::Div, a, b),
    }
}

fn rem(k: BaseKind, a: Term, b: Term) -> Term {
    match k {
        BaseKind::Integer => {
            let q = quot(k, a.clone(), b.clone());
            Term::binary(BinOp::Sub, a, Term::binary(BinOp::Mul, b, q))
        }
        _ => Term::binary(BinOp::Rem, a, b),
    }
}

/// Division rounded toward negative infinity.
fn div(k: BaseKind, a: Term, b: Term) -> Term {
    match k {
        BaseKind::Unsigned(_) => Term::binary(BinOp::Div, a, b),
        BaseKind::Signed(_) => {
            let q = Term::binary(BinOp::Div, a.clone(), b.clone());
            let r = Term::binary(BinOp::Rem, a.clone(), b.clone());
            let inexact = Term::binary(BinOp::Ne, r, lit(k, 0));
            let signs_differ = Term::binary(BinOp::Ne, is_negative(k, &a), is_negative(k, &b));
            Term::ite(
                Term::binary(BinOp::And, inexact, signs_differ),
                Term::binary(BinOp::Sub, q.clone(), lit(k, 1)),
                q,
            )
        }
        // SMT-LIB integer division is euclidean; it agrees with flooring for
        // positive divisors.
        _ => Term::ite(
            Term::binary(BinOp::Ge, b.clone(), lit(k, 0)),
            Term::binary(BinOp::Div, a.clone(), b.clone()),
            Term::binary(
                BinOp::Div,
                Term::unary(UnOp::Neg, a),
                Term::unary(UnOp::Neg, b),
            ),
        ),
    }
}

fn modulo(k: BaseKind, a: Term, b: Term) -> Term {
    match k {
        BaseKind::Unsigned(_) => Term::binary(BinOp::Rem, a, b),
        BaseKind::Signed(_) => Term::binary(BinOp::SMod, a, b),
        _ => {
            let q = div(k, a.clone(), b.clone());
            Term::binary(BinOp::Sub, a, Term::binary(BinOp::Mul, b, q))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{SymVar, VarOrigin};

    fn sym(name: &str, kind: BaseKind) -> SVal {
        SVal::Base(Term::Var(SymVar {
            id: 0,
            name: name.to_string(),
            kind,
            origin: VarOrigin::Lambda,
        }))
    }

    fn apply2(f: &SVal, a: SVal, b: SVal) -> Result<SVal, crate::value::BuiltinError> {
        let SVal::Func(f) = f else { panic!("not a function") };
        let SVal::Func(g) = f.call(a)? else { panic!("not curried") };
        g.call(b)
    }

    #[test]
    fn standard_types_cover_common_names() {
        let p = standard();
        assert_eq!(p.types.resolve(&sprove_ir::Type::con("Int")), Some(BaseKind::Signed(64)));
        assert_eq!(p.types.resolve(&sprove_ir::Type::con("Word8")), Some(BaseKind::Unsigned(8)));
        assert_eq!(p.types.resolve(&sprove_ir::Type::con("Double")), None);
    }

    #[test]
    fn comparison_builds_boolean_term() {
        let p = standard();
        let k = BaseKind::Signed(64);
        let ge = p.globals.get(&EnvKey::new(">=", k)).expect(">=");
        let zero = p.globals.get(&EnvKey::new("zero", k)).expect("zero").clone();
        let out = apply2(ge, sym("x", k), zero).expect("apply");
        let t = out.into_base().expect("scalar");
        assert_eq!(t.kind(), BaseKind::Bool);
        assert_eq!(t.to_string(), "(bvsge l0_x #x0000000000000000)");
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let p = standard();
        let plus = p.globals.get(&EnvKey::new("+", BaseKind::Integer)).expect("+");
        let err = apply2(plus, sym("x", BaseKind::Integer), sym("b", BaseKind::Bool)).unwrap_err();
        assert!(err.0.contains("expects an argument of kind Integer"), "{}", err.0);

        let err = apply2(plus, plus.clone(), sym("x", BaseKind::Integer)).unwrap_err();
        assert!(err.0.contains("unapplied function `+`"), "{}", err.0);
    }

    #[test]
    fn unsigned_division_is_direct() {
        let k = BaseKind::Unsigned(8);
        let a = sym("a", k).into_base().unwrap();
        let b = sym("b", k).into_base().unwrap();
        assert_eq!(div(k, a.clone(), b.clone()), Term::binary(BinOp::Div, a.clone(), b.clone()));
        assert_eq!(modulo(k, a.clone(), b.clone()), Term::binary(BinOp::Rem, a, b));
    }
}
