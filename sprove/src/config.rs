#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::Deserialize;
use sprove_ir::{Engine, SolverSelector};
use sprove_verify::{EngineSettings, SolverRegistry};
use thiserror::Error;

pub const CONFIG_FILE: &str = "sprove.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(sprove::config))]
pub struct ConfigError {
    pub message: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    defaults: Defaults,

    #[serde(default)]
    solvers: BTreeMap<String, SolverSection>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Defaults {
    #[serde(default)]
    solvers: Vec<String>,

    #[serde(default)]
    warn_if_fails: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SolverSection {
    #[serde(default)]
    path: Option<PathBuf>,

    #[serde(default)]
    timeout_ms: Option<u64>,

    #[serde(default)]
    args: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,
    /// Empty means "use the built-in default".
    pub default_solvers: Vec<SolverSelector>,
    pub warn_if_fails: bool,
    pub engines: BTreeMap<Engine, EngineSettings>,
}

impl ResolvedConfig {
    pub fn registry(&self) -> SolverRegistry {
        let mut reg = SolverRegistry::new();
        for (engine, settings) in &self.engines {
            reg.configure(*engine, settings.clone());
        }
        reg
    }
}

/// `any` / `all` select every installed engine; anything else must name one.
pub fn parse_selector(s: &str) -> Result<SolverSelector, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "any" | "all" => Ok(SolverSelector::AllInstalled),
        _ => s
            .parse::<Engine>()
            .map(SolverSelector::Engine)
            .map_err(|e| ConfigError { message: e.message }),
    }
}

pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        match cur.parent() {
            Some(p) => cur = p.to_path_buf(),
            None => return None,
        }
    }
}

pub fn parse_config(raw: &str, origin: &Path) -> Result<ResolvedConfig, ConfigError> {
    let parsed: ConfigFile = toml::from_str(raw).map_err(|e| ConfigError {
        message: format!("failed to parse {}: {e}", origin.display()),
    })?;
    let base = origin.parent().unwrap_or_else(|| Path::new("."));

    let mut out = ResolvedConfig {
        config_path: Some(origin.to_path_buf()),
        warn_if_fails: parsed.defaults.warn_if_fails,
        ..ResolvedConfig::default()
    };
    for s in &parsed.defaults.solvers {
        let sel = parse_selector(s).map_err(|e| ConfigError {
            message: format!("{}: [defaults] solvers: {}", origin.display(), e.message),
        })?;
        if !out.default_solvers.contains(&sel) {
            out.default_solvers.push(sel);
        }
    }
    for (name, section) in parsed.solvers {
        let engine = name.parse::<Engine>().map_err(|e| ConfigError {
            message: format!("{}: [solvers.{name}]: {}", origin.display(), e.message),
        })?;
        out.engines.insert(
            engine,
            EngineSettings {
                path: section.path.map(|p| resolve_path(base, &p)),
                timeout: section.timeout_ms.map(Duration::from_millis),
                args: section.args,
            },
        );
    }
    Ok(out)
}

/// Load `explicit` if given (it must exist), otherwise the nearest
/// `sprove.toml` at or above `start`. No file means defaults.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<ResolvedConfig, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match find_config(start) {
            Some(p) => p,
            None => return Ok(ResolvedConfig::default()),
        },
    };
    let raw = fs::read_to_string(&path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw, &path)
}

fn resolve_path(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else if p.components().count() == 1 {
        // Bare executable name: leave it for PATH lookup by the OS.
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_file_resolves() {
        let raw = r#"
            [defaults]
            solvers = ["z3", "CVC5", "z3"]
            warn_if_fails = true

            [solvers.z3]
            path = "/opt/z3/bin/z3"
            timeout_ms = 5000
            args = ["-v:0"]

            [solvers.yices]
            path = "tools/yices-smt2"
        "#;
        let cfg = parse_config(raw, Path::new("/work/sprove.toml")).unwrap();
        assert!(cfg.warn_if_fails);
        assert_eq!(
            cfg.default_solvers,
            vec![
                SolverSelector::Engine(Engine::Z3),
                SolverSelector::Engine(Engine::Cvc5)
            ]
        );
        let z3 = &cfg.engines[&Engine::Z3];
        assert_eq!(z3.path.as_deref(), Some(Path::new("/opt/z3/bin/z3")));
        assert_eq!(z3.timeout, Some(Duration::from_millis(5000)));
        assert_eq!(z3.args, vec!["-v:0"]);
        assert_eq!(
            cfg.engines[&Engine::Yices].path.as_deref(),
            Some(Path::new("/work/tools/yices-smt2"))
        );
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let err = parse_config("[solvers.vampire]\n", Path::new("sprove.toml")).unwrap_err();
        assert!(err.message.contains("unknown solver `vampire`"), "{}", err.message);

        let err = parse_config("[defaults]\nsolvers = [\"eprover\"]\n", Path::new("sprove.toml"))
            .unwrap_err();
        assert!(err.message.contains("[defaults] solvers"), "{}", err.message);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[defaults]\nwarn_if_fail = true\n", Path::new("sprove.toml")).is_err());
    }

    #[test]
    fn selectors_parse() {
        assert_eq!(parse_selector("any").unwrap(), SolverSelector::AllInstalled);
        assert_eq!(
            parse_selector("Bitwuzla").unwrap(),
            SolverSelector::Engine(Engine::Bitwuzla)
        );
        assert!(parse_selector("nope").is_err());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = std::env::temp_dir().join("sprove-config-test-missing");
        let err = load_config(Some(&dir.join("nope.toml")), &dir).unwrap_err();
        assert!(err.message.starts_with("failed to read"), "{}", err.message);
    }
}
