#![forbid(unsafe_code)]

mod config;
mod report;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Diagnostic, IntoDiagnostic};
use sprove_ir::{Engine, Program, SolverSelector};
use sprove_verify::{smtlib, standard, Driver, DriverSettings, SolverRegistry};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sprove",
    version,
    about = "Prove annotated bindings of a typed functional IR with SMT solvers"
)]
struct Cli {
    /// Configuration file. Defaults to the nearest `sprove.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Analyse every annotated binding of a program
    Check {
        /// Program in JSON form
        #[arg(default_value = "program.json")]
        path: PathBuf,

        /// Solver used when an annotation names none (repeatable; `any` = all installed)
        #[arg(long = "solver")]
        solvers: Vec<String>,

        /// Warn and continue when a proof fails
        #[arg(long, default_value_t = false)]
        warn_if_fails: bool,

        /// Show each backend's full output
        #[arg(long, default_value_t = false)]
        verbose: bool,

        /// Write a JSON report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List supported solvers and whether they are installed
    Solvers,

    /// Print the SMT-LIB script for one binding
    Smtlib {
        /// Program in JSON form
        path: PathBuf,

        /// Binding name
        binding: String,
    },
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("{failures} binding(s) failed")]
    #[diagnostic(code(sprove::check))]
    Failed { failures: usize },

    #[error("no theorem or safety annotation on `{0}`")]
    #[diagnostic(code(sprove::smtlib))]
    NoObligation(String),
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_program(path: &Path) -> miette::Result<Program> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("failed to read {}", path.display())))?;
    Ok(Program::from_json(&text)?)
}

fn config_start() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let cfg = config::load_config(cli.config.as_deref(), &config_start())?;
    match &cfg.config_path {
        Some(p) => debug!("using configuration {}", p.display()),
        None => debug!("no sprove.toml found; using defaults"),
    }

    match cli.cmd {
        Cmd::Check {
            path,
            solvers,
            warn_if_fails,
            verbose,
            report: report_path,
        } => {
            let mut default_solvers = Vec::new();
            for s in &solvers {
                let sel = config::parse_selector(s)?;
                if !default_solvers.contains(&sel) {
                    default_solvers.push(sel);
                }
            }
            if default_solvers.is_empty() {
                default_solvers = cfg.default_solvers.clone();
            }
            if default_solvers.is_empty() {
                default_solvers.push(SolverSelector::Engine(Engine::Z3));
            }
            let settings = DriverSettings {
                default_solvers,
                warn_if_fails: warn_if_fails || cfg.warn_if_fails,
                verbose,
            };

            let program = read_program(&path)?;
            let prelude = standard();
            let registry = cfg.registry();
            let driver = Driver::new(&prelude, &registry, settings);
            let summary = driver.run(&program);

            if let Some(out) = &report_path {
                let r = report::build_report(&path, program.module.clone(), &summary);
                report::write_report(out, &r)?;
            }
            println!("{}", report::tally(&summary));

            let (ok, failures) = (summary.ok(), summary.failures());
            match summary.aborted {
                Some(err) => Err(err.into()),
                None if !ok => Err(CliError::Failed { failures }.into()),
                None => Ok(()),
            }
        }
        Cmd::Solvers => {
            let registry = cfg.registry();
            for engine in Engine::ALL {
                let status = if registry.is_installed(engine) {
                    "installed"
                } else {
                    "not found"
                };
                println!("{:<10} {status}", engine.as_str());
            }
            Ok(())
        }
        Cmd::Smtlib { path, binding } => {
            let program = read_program(&path)?;
            let prelude = standard();
            let registry = cfg.registry();
            let driver = Driver::new(&prelude, &registry, DriverSettings::default());
            let Some(ob) = driver.obligation_of(&program, &binding)? else {
                return Err(CliError::NoObligation(binding).into());
            };
            print!("{}", smtlib::render_script(&ob, true));
            Ok(())
        }
    }
}
