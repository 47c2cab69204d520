use proptest::{
    prelude::{any, prop},
    test_runner::{Config, TestCaseError, TestRunner},
};
use sprove_ir::{Expr, Type, Var};
use sprove_verify::{standard, BaseKind, Env, Evaluator, EvalErrorKind};

const REGISTERED: [&str; 12] = [
    "Bool", "Integer", "Int", "Int8", "Int16", "Int32", "Int64", "Word", "Word8", "Word16",
    "Word32", "Word64",
];

#[test]
fn unregistered_types_never_resolve() {
    let prelude = standard();
    let mut runner = TestRunner::new(Config {
        cases: 256,
        ..Config::default()
    });

    runner
        .run(&"[A-Z][A-Za-z0-9]{0,10}", |name| {
            if REGISTERED.contains(&name.as_str()) {
                return Ok(());
            }
            if prelude.types.resolve(&Type::con(name.clone())).is_some() {
                return Err(TestCaseError::fail(format!("guessed a kind for {name}")));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn applied_and_compound_types_never_resolve() {
    let prelude = standard();
    let mut runner = TestRunner::new(Config::default());

    let strat = (0..REGISTERED.len(), 0..REGISTERED.len(), 0u8..4);
    runner
        .run(&strat, |(a, b, shape)| {
            let ta = Type::con(REGISTERED[a]);
            let tb = Type::con(REGISTERED[b]);
            let ty = match shape {
                0 => Type::con_app(REGISTERED[a], vec![tb]),
                1 => Type::fun(ta, tb),
                2 => Type::Tuple(vec![ta, tb]),
                _ => Type::for_all("a", ta),
            };
            match prelude.types.resolve(&ty) {
                None => Ok(()),
                Some(k) => Err(TestCaseError::fail(format!("{ty} resolved to {k}"))),
            }
        })
        .unwrap();
}

fn int() -> Type {
    Type::con("Int")
}

fn binop(op: &str, class: &str, a: Expr, b: Expr) -> Expr {
    let dict = Var::new(format!("$f{class}Int"), Type::class(class, vec![int()]));
    let op = Var::new(op, Type::for_all("a", Type::var("a")));
    Expr::apps(Expr::method(op, int(), dict), [a, b])
}

/// `\x y -> ((x op1 a1) op2 a2 ...) >= zero`
fn arithmetic(steps: &[(u8, bool)]) -> Expr {
    let x = || Expr::var("x", int());
    let y = || Expr::var("y", int());
    let mut acc = x();
    for (op, use_y) in steps {
        let op = ["+", "-", "*"][*op as usize % 3];
        acc = binop(op, "Num", acc, if *use_y { y() } else { x() });
    }
    let body = binop(">=", "Ord", acc, Expr::var("zero", int()));
    Expr::lam(Var::new("x", int()), Expr::lam(Var::new("y", int()), body))
}

#[test]
fn evaluation_is_idempotent() {
    let prelude = standard();
    let mut runner = TestRunner::new(Config {
        cases: 128,
        ..Config::default()
    });

    let strat = prop::collection::vec((any::<u8>(), any::<bool>()), 0..12);
    runner
        .run(&strat, |steps| {
            let expr = arithmetic(&steps);
            let first = Evaluator::new(&prelude.types)
                .theorem(&expr, &Env::root(prelude.globals.clone()))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let second = Evaluator::new(&prelude.types)
                .theorem(&expr, &Env::root(prelude.globals.clone()))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            if first.kinds() != vec![BaseKind::Signed(64); 2] || first.kinds() != second.kinds() {
                return Err(TestCaseError::fail("free variable kinds differ"));
            }
            if first.goal.to_string() != second.goal.to_string() {
                return Err(TestCaseError::fail(format!(
                    "{} vs {}",
                    first.goal, second.goal
                )));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn let_bodies_always_fail() {
    let prelude = standard();
    let mut runner = TestRunner::new(Config::default());

    runner
        .run(&"[a-z]{1,6}", |name| {
            let expr = Expr::Let {
                bind: sprove_ir::Bind::NonRec(
                    Var::new(name.clone(), int()),
                    Box::new(Expr::var("zero", int())),
                ),
                body: Box::new(Expr::var(name, int())),
            };
            let env = Env::root(prelude.globals.clone());
            match Evaluator::new(&prelude.types).eval(&expr, &env) {
                Err(e) if matches!(e.kind, EvalErrorKind::UnsupportedConstruct { .. }) => Ok(()),
                Err(e) => Err(TestCaseError::fail(format!("wrong error: {e}"))),
                Ok(_) => Err(TestCaseError::fail("let produced a value")),
            }
        })
        .unwrap();
}
