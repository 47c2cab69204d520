#![cfg(unix)]

use std::fs;
use std::path::PathBuf;

use sprove_ir::Engine;
use sprove_verify::{
    BackendConfig, BackendFault, BaseKind, BinOp, Obligation, ProcessBackend, SolverBackend,
    SolverResult, SymVar, Term, VarOrigin,
};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sprove-process-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// A stand-in solver: `/bin/sh <script>`. MathSAT takes no flags of its own,
/// so the script path is the only argument.
fn fake_solver(dir: &PathBuf, body: &str, verbose: bool) -> ProcessBackend {
    let script = dir.join("solver.sh");
    fs::write(&script, body).unwrap();
    let mut cfg = BackendConfig::new(Engine::MathSat);
    cfg.executable = Some(PathBuf::from("/bin/sh"));
    cfg.extra_args = vec![script.display().to_string()];
    cfg.verbose = verbose;
    ProcessBackend::new(cfg)
}

fn var(name: &str) -> Term {
    Term::Var(SymVar {
        id: 0,
        name: name.to_string(),
        kind: BaseKind::Integer,
        origin: VarOrigin::Lambda,
    })
}

fn obligation(name: &str) -> Obligation {
    let goal = Term::binary(BinOp::Eq, var(name), var(name));
    Obligation::new(goal.free_vars(), goal)
}

#[test]
fn unsat_answer_is_proved_and_script_reaches_stdin() {
    let dir = scratch("unsat");
    let seen = dir.join("seen.smt2");
    let solver = fake_solver(
        &dir,
        &format!("cat > '{}'\necho unsat\n", seen.display()),
        false,
    );

    let answer = solver.check(&obligation("x")).unwrap();
    assert_eq!(answer.result, SolverResult::Proved);
    assert_eq!(answer.raw, "unsat\n");

    let script = fs::read_to_string(&seen).unwrap();
    assert!(script.contains("(declare-fun l0_x () Int)"), "{script}");
    assert!(script.contains("(assert (not (= l0_x l0_x)))"), "{script}");
    assert!(script.contains("(check-sat)"), "{script}");
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn sat_answer_carries_the_model() {
    let dir = scratch("sat");
    let solver = fake_solver(
        &dir,
        "cat > /dev/null\nprintf 'sat\\n(\\n  (define-fun l0_x () Int\\n    (- 1))\\n)\\n'\n",
        false,
    );

    let answer = solver.check(&obligation("x")).unwrap();
    match answer.result {
        SolverResult::Disproved { model: Some(m) } => {
            assert!(m.contains("(define-fun l0_x () Int"), "{m}");
            assert!(m.contains("(- 1)"), "{m}");
        }
        other => panic!("unexpected {other:?}"),
    }
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn verbose_output_includes_the_script() {
    let dir = scratch("verbose");
    let solver = fake_solver(&dir, "cat > /dev/null\necho unsat\n", true);

    let answer = solver.check(&obligation("x")).unwrap();
    assert!(answer.raw.contains("(check-sat)"), "{}", answer.raw);
    assert!(answer.raw.contains("; ---- response ----\nunsat"), "{}", answer.raw);
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn solver_closing_stdin_early_is_an_io_fault() {
    let dir = scratch("early-exit");
    let solver = fake_solver(&dir, "exec 0<&-\nexit 0\n", false);

    // Larger than a pipe buffer, so the write cannot complete without a reader.
    let long = "v".repeat(200_000);
    let err = solver.check(&obligation(&long)).unwrap_err();
    assert!(matches!(err, BackendFault::Io { .. }), "{err:?}");
    let _ = fs::remove_dir_all(dir);
}
