#![forbid(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use sprove_ir::Engine;
use tracing::debug;

use crate::eval::Obligation;
use crate::smtlib::render_script;
use crate::solver::{BackendAnswer, BackendConfig, BackendFault, SolverBackend, SolverResult};

/// Drives an SMT-LIB 2 solver executable over stdin/stdout.
#[derive(Clone, Debug)]
pub struct ProcessBackend {
    config: BackendConfig,
}

/// Default executable name for an engine.
pub fn executable_name(engine: Engine) -> &'static str {
    match engine {
        Engine::Z3 => "z3",
        Engine::Cvc4 => "cvc4",
        Engine::Cvc5 => "cvc5",
        Engine::Yices => "yices-smt2",
        Engine::Boolector => "boolector",
        Engine::Bitwuzla => "bitwuzla",
        Engine::MathSat => "mathsat",
    }
}

/// Flags that put the engine into SMT-LIB 2 mode reading stdin.
fn base_args(engine: Engine) -> &'static [&'static str] {
    match engine {
        Engine::Z3 => &["-in", "-smt2"],
        Engine::Cvc4 | Engine::Cvc5 => &["--lang=smt2", "--produce-models"],
        Engine::Yices => &[],
        Engine::Boolector => &["--smt2", "--model-gen"],
        Engine::Bitwuzla => &["--lang", "smt2", "--produce-models"],
        Engine::MathSat => &[],
    }
}

fn timeout_arg(engine: Engine, ms: u128) -> Option<String> {
    let secs = ms.div_ceil(1000).max(1);
    match engine {
        Engine::Z3 => Some(format!("-T:{secs}")),
        Engine::Cvc4 | Engine::Cvc5 => Some(format!("--tlimit={ms}")),
        Engine::Yices => Some(format!("--timeout={secs}")),
        Engine::Boolector => Some(format!("--time={secs}")),
        Engine::Bitwuzla => Some(format!("--time-limit={ms}")),
        Engine::MathSat => None,
    }
}

/// Locate an engine's executable, preferring an explicit path.
pub fn locate(engine: Engine, explicit: Option<&PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(p.clone()),
        None => which::which(executable_name(engine)).ok(),
    }
}

impl ProcessBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn command_args(&self) -> Vec<String> {
        let mut args: Vec<String> = base_args(self.config.engine)
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(t) = self.config.timeout
            && let Some(a) = timeout_arg(self.config.engine, t.as_millis())
        {
            args.push(a);
        }
        args.extend(self.config.extra_args.iter().cloned());
        args
    }
}

impl SolverBackend for ProcessBackend {
    fn name(&self) -> String {
        self.config.engine.to_string()
    }

    fn check(&self, obligation: &Obligation) -> Result<BackendAnswer, BackendFault> {
        let engine = self.config.engine;
        let exe = locate(engine, self.config.executable.as_ref()).ok_or_else(|| {
            BackendFault::NotFound {
                engine,
                executable: executable_name(engine).to_string(),
            }
        })?;
        let script = render_script(obligation, true);
        let args = self.command_args();
        debug!(backend = %engine, exe = %exe.display(), ?args, "spawning solver");

        let io = |source| BackendFault::Io {
            backend: engine.to_string(),
            source,
        };
        let mut child = Command::new(&exe)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io)?;
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(script.as_bytes())
        {
            // The solver stopped reading; reap it before reporting.
            let _ = child.kill();
            let _ = child.wait();
            return Err(io(e));
        }
        let output = child.wait_with_output().map_err(io)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify(&stdout, &stderr);
        let mut raw = String::new();
        if self.config.verbose {
            raw.push_str(&script);
            raw.push_str("; ---- response ----\n");
        }
        raw.push_str(&stdout);
        if !stderr.trim().is_empty() {
            raw.push_str(&stderr);
        }
        Ok(BackendAnswer { result, raw })
    }
}

/// Classify a solver transcript by its first answer line.
pub fn classify(stdout: &str, stderr: &str) -> SolverResult {
    let lines: Vec<&str> = stdout.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        match trimmed {
            "unsat" => return SolverResult::Proved,
            "sat" => {
                let model = lines[i + 1..]
                    .iter()
                    .filter(|l| !l.contains(":reason-unknown") && !l.trim_start().starts_with("(error"))
                    .copied()
                    .collect::<Vec<_>>()
                    .join("\n");
                let model = model.trim();
                return SolverResult::Disproved {
                    model: (!model.is_empty()).then(|| model.to_string()),
                };
            }
            "unknown" => {
                return SolverResult::Unknown {
                    reason: reason_after(&lines[i + 1..]),
                };
            }
            "timeout" => return SolverResult::Timeout,
            _ if trimmed.starts_with("(error") => {
                return SolverResult::Error {
                    message: error_message(trimmed),
                };
            }
            _ => {}
        }
    }
    let stderr = stderr.trim();
    if stderr.to_ascii_lowercase().contains("timeout") {
        return SolverResult::Timeout;
    }
    SolverResult::Error {
        message: if stderr.is_empty() {
            "no answer from solver".to_string()
        } else {
            stderr.lines().take(3).collect::<Vec<_>>().join("; ")
        },
    }
}

fn reason_after(rest: &[&str]) -> Option<String> {
    rest.iter()
        .map(|l| l.trim())
        .find(|l| l.starts_with("(:reason-unknown"))
        .map(|l| {
            l.trim_start_matches("(:reason-unknown")
                .trim_end_matches(')')
                .trim()
                .trim_matches('"')
                .to_string()
        })
        .filter(|r| !r.is_empty())
}

// `(error "line 3 column 5: message")` -> `line 3 column 5: message`
fn error_message(line: &str) -> String {
    let inner = line
        .trim_start_matches("(error")
        .trim_end_matches(')')
        .trim();
    inner.trim_matches('"').to_string()
}
