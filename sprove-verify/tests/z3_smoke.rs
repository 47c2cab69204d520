#![cfg(feature = "z3")]

use sprove_ir::{Engine, Expr, Type, Var};
use sprove_verify::{
    standard, BackendConfig, Env, Evaluator, SolverBackend, SolverResult, Z3Backend,
};

fn int() -> Type {
    Type::con("Int")
}

fn binop(op: &str, class: &str, a: Expr, b: Expr) -> Expr {
    let dict = Var::new(format!("$f{class}Int"), Type::class(class, vec![int()]));
    let op = Var::new(op, Type::for_all("a", Type::var("a")));
    Expr::apps(Expr::method(op, int(), dict), [a, b])
}

fn check(body: Expr) -> SolverResult {
    let prelude = standard();
    let env = Env::root(prelude.globals.clone());
    let ob = Evaluator::new(&prelude.types)
        .theorem(&Expr::lam(Var::new("x", int()), body), &env)
        .unwrap();
    Z3Backend::new(BackendConfig::new(Engine::Z3))
        .check(&ob)
        .unwrap()
        .result
}

#[test]
fn non_negative_is_disproved() {
    let x = Expr::var("x", int());
    let r = check(binop(">=", "Ord", x, Expr::var("zero", int())));
    assert!(matches!(r, SolverResult::Disproved { .. }), "{r:?}");
}

#[test]
fn reflexive_equality_is_proved() {
    let x = || Expr::var("x", int());
    assert_eq!(check(binop("==", "Eq", x(), x())), SolverResult::Proved);
}

#[test]
fn haskell_division_identity_holds() {
    // (x `div` one) == x
    let x = || Expr::var("x", int());
    let body = binop("==", "Eq", binop("div", "Integral", x(), Expr::var("one", int())), x());
    assert_eq!(check(body), SolverResult::Proved);
}

#[test]
fn similarly_named_constants_stay_distinct() {
    use sprove_verify::{BaseKind, BinOp, Obligation, SymVar, Term, VarOrigin};

    let constant = |id: u32, name: &str| SymVar {
        id,
        name: name.to_string(),
        kind: BaseKind::Signed(64),
        origin: VarOrigin::Uninterpreted,
    };
    let (a, b) = (constant(0, "c'"), constant(1, "c_"));
    let goal = Term::binary(BinOp::Eq, Term::Var(a.clone()), Term::Var(b.clone()));
    let r = Z3Backend::new(BackendConfig::new(Engine::Z3))
        .check(&Obligation::new(vec![a, b], goal))
        .unwrap()
        .result;
    assert!(matches!(r, SolverResult::Disproved { .. }), "{r:?}");
}
