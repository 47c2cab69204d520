#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use miette::IntoDiagnostic;
use serde::Serialize;
use sprove_verify::{Attempt, BindingReport, BindingState, RunSummary};

pub const SCHEMA: &str = "sprove.report.v1";

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema: &'static str,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub bindings: Vec<BindingEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BindingEntry {
    pub name: String,
    pub location: String,
    pub mode: String,
    pub state: &'static str,
    pub solvers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adopted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub attempts: Vec<AttemptEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptEntry {
    pub backend: String,
    pub result: &'static str,
    pub elapsed_ms: u64,
    pub detail: String,
    /// Full backend output, kept for verbose bindings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

fn attempt_entry(a: &Attempt, verbose: bool) -> AttemptEntry {
    AttemptEntry {
        backend: a.backend.clone(),
        result: a.kind().as_str(),
        elapsed_ms: a.elapsed.as_millis() as u64,
        detail: a.summary(),
        raw: match &a.outcome {
            Ok(answer) if verbose => Some(answer.raw.clone()),
            _ => None,
        },
    }
}

fn binding_entry(r: &BindingReport) -> BindingEntry {
    let (adopted, result, attempts) = match &r.verdict {
        Some(v) => (
            Some(v.adopted().backend.clone()),
            Some(v.adopted().kind().as_str()),
            v.attempts.iter().map(|a| attempt_entry(a, r.verbose)).collect(),
        ),
        None => (None, None, Vec::new()),
    };
    BindingEntry {
        name: r.name.clone(),
        location: r.loc.to_string(),
        mode: r.mode.to_string(),
        state: r.state.as_str(),
        solvers: r.solvers.clone(),
        adopted,
        result,
        note: r.note.clone(),
        attempts,
    }
}

pub fn build_report(input: &Path, module: Option<String>, summary: &RunSummary) -> RunReport {
    RunReport {
        schema: SCHEMA,
        input: input.display().to_string(),
        module,
        ok: summary.ok(),
        error: summary.aborted.as_ref().map(|e| e.to_string()),
        bindings: summary.reports.iter().map(binding_entry).collect(),
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> miette::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    fs::write(path, json).into_diagnostic()?;
    Ok(())
}

/// One-line tally printed after a run.
pub fn tally(summary: &RunSummary) -> String {
    let count = |state: BindingState| summary.reports.iter().filter(|r| r.state == state).count();
    let skipped = summary
        .reports
        .iter()
        .filter(|r| r.state == BindingState::NotStarted)
        .count();
    format!(
        "{} annotation(s): {} succeeded, {} failed, {} skipped{}",
        summary.reports.len(),
        count(BindingState::Succeeded),
        summary.failures(),
        skipped,
        if summary.aborted.is_some() { " (run aborted)" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprove_ir::{Annotation, Binding, Expr, Program, ProofOption, ProofOptions, SrcLoc, Type, Var};
    use sprove_verify::{standard, Driver, DriverSettings, SolverRegistry};

    fn int() -> Type {
        Type::con("Int")
    }

    // `\x y -> x + y` under a safety annotation needs no solver at all.
    fn program() -> Program {
        let dict = Var::new("$fNumInt", Type::class("Num", vec![int()]));
        let plus = Expr::method(Var::new("+", Type::for_all("a", Type::var("a"))), int(), dict);
        let body = Expr::lam(
            Var::new("x", int()),
            Expr::lam(
                Var::new("y", int()),
                Expr::apps(plus, [Expr::var("x", int()), Expr::var("y", int())]),
            ),
        );
        Program {
            module: Some("Arith".to_string()),
            bindings: vec![
                Binding {
                    name: "add".to_string(),
                    loc: SrcLoc::new("Arith.hs", 4, 1),
                    ty: Type::funs([int(), int()], int()),
                    body: body.clone(),
                    annotations: vec![Annotation::Safety(ProofOptions::default())],
                },
                Binding {
                    name: "add_skipped".to_string(),
                    loc: SrcLoc::new("Arith.hs", 9, 1),
                    ty: Type::funs([int(), int()], int()),
                    body,
                    annotations: vec![Annotation::Theorem(ProofOptions::new([ProofOption::Skip(
                        "later".to_string(),
                    )]))],
                },
            ],
        }
    }

    #[test]
    fn report_serializes_with_schema_and_entries() {
        let prelude = standard();
        let registry = SolverRegistry::new();
        let driver = Driver::new(&prelude, &registry, DriverSettings::default());
        let program = program();
        let summary = driver.run(&program);

        let report = build_report(Path::new("arith.json"), program.module.clone(), &summary);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schema"], SCHEMA);
        assert_eq!(json["ok"], true);
        assert_eq!(json["module"], "Arith");
        assert!(json.get("error").is_none());
        assert_eq!(json["bindings"][0]["name"], "add");
        assert_eq!(json["bindings"][0]["location"], "Arith.hs:4:1");
        assert_eq!(json["bindings"][0]["mode"], "safety");
        assert_eq!(json["bindings"][0]["state"], "succeeded");
        assert_eq!(json["bindings"][1]["state"], "not_started");
        assert_eq!(json["bindings"][1]["note"], "skipped: later");

        assert_eq!(tally(&summary), "2 annotation(s): 1 succeeded, 0 failed, 1 skipped");
    }

    fn proved_report(name: &str, verbose: bool) -> BindingReport {
        use sprove_verify::{Attempt, BackendAnswer, Mode, SolverResult, Verdict};
        use std::time::Duration;

        BindingReport {
            name: name.to_string(),
            loc: SrcLoc::new("Arith.hs", 1, 1),
            mode: Mode::Theorem,
            state: BindingState::Succeeded,
            solvers: vec!["z3".to_string()],
            verdict: Some(Verdict {
                adopted: 0,
                attempts: vec![Attempt {
                    backend: "z3".to_string(),
                    elapsed: Duration::from_millis(3),
                    outcome: Ok(BackendAnswer {
                        result: SolverResult::Proved,
                        raw: "unsat\n".to_string(),
                    }),
                }],
            }),
            verbose,
            note: None,
        }
    }

    #[test]
    fn raw_output_only_for_verbose_bindings() {
        let summary = RunSummary {
            reports: vec![proved_report("loud", true), proved_report("quiet", false)],
            aborted: None,
        };
        let report = build_report(Path::new("arith.json"), None, &summary);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        let loud = &json["bindings"][0]["attempts"][0];
        assert_eq!(loud["raw"], "unsat\n");
        assert_eq!(loud["result"], "proved");
        assert_eq!(json["bindings"][0]["adopted"], "z3");

        let quiet = &json["bindings"][1]["attempts"][0];
        assert!(quiet.get("raw").is_none());
        assert_eq!(quiet["detail"], "z3: Q.E.D.");
    }

    #[test]
    fn report_is_written_to_disk() {
        let prelude = standard();
        let registry = SolverRegistry::new();
        let driver = Driver::new(&prelude, &registry, DriverSettings::default());
        let summary = driver.run(&program());

        let dir = std::env::temp_dir().join(format!("sprove-report-{}", std::process::id()));
        let path = dir.join("out").join("report.json");
        let report = build_report(Path::new("arith.json"), None, &summary);
        write_report(&path, &report).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"schema\": \"sprove.report.v1\""));
        let _ = fs::remove_dir_all(dir);
    }
}
