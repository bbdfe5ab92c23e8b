//! Automation runtime resolution.
//!
//! The runner is replaceable: a packaged, self-contained executable is
//! preferred; otherwise a general-purpose script interpreter is located
//! from a small ordered list of well-known install paths (then a `PATH`
//! lookup) and handed the runner script as its first argument.

use crate::automation::error::AutomationError;
use crate::config::RunnerConfig;
use std::path::PathBuf;

/// A concrete program to spawn, plus the arguments that precede the
/// mode/script arguments (the runner script, for interpreter runtimes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRuntime {
    pub program: PathBuf,
    pub base_args: Vec<PathBuf>,
}

/// Resolve the runtime to invoke for a new session.
///
/// # Errors
///
/// Returns [`AutomationError::RuntimeNotFound`] when neither the packaged
/// runner nor a usable interpreter + runner script pair exists. No
/// process is spawned in that case.
pub fn resolve_runtime(config: &RunnerConfig) -> Result<ResolvedRuntime, AutomationError> {
    if let Some(runner) = &config.runner_path {
        if runner.exists() {
            return Ok(ResolvedRuntime {
                program: runner.clone(),
                base_args: Vec::new(),
            });
        }
    }

    // Interpreter fallback needs the runner script to interpret.
    let script = match &config.runner_script {
        Some(script) if script.exists() => script.clone(),
        _ => return Err(AutomationError::RuntimeNotFound),
    };

    for candidate in &config.interpreter_candidates {
        if candidate.exists() {
            return Ok(ResolvedRuntime {
                program: candidate.clone(),
                base_args: vec![script],
            });
        }
    }

    if let Ok(found) = which::which(&config.interpreter) {
        return Ok(ResolvedRuntime {
            program: found,
            base_args: vec![script],
        });
    }

    Err(AutomationError::RuntimeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> RunnerConfig {
        RunnerConfig {
            runner_path: None,
            interpreter_candidates: Vec::new(),
            interpreter: "definitely-not-a-real-interpreter".to_string(),
            runner_script: None,
        }
    }

    #[test]
    fn test_packaged_runner_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let runner = dir.path().join("runner");
        std::fs::write(&runner, b"").unwrap();

        let config = RunnerConfig {
            runner_path: Some(runner.clone()),
            ..empty_config()
        };
        let resolved = resolve_runtime(&config).unwrap();
        assert_eq!(resolved.program, runner);
        assert!(resolved.base_args.is_empty());
    }

    #[test]
    fn test_missing_packaged_runner_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("runner.ahk");
        std::fs::write(&script, b"").unwrap();
        let interpreter = dir.path().join("interp");
        std::fs::write(&interpreter, b"").unwrap();

        let config = RunnerConfig {
            runner_path: Some(dir.path().join("missing-runner")),
            interpreter_candidates: vec![dir.path().join("nope"), interpreter.clone()],
            runner_script: Some(script.clone()),
            ..empty_config()
        };
        let resolved = resolve_runtime(&config).unwrap();
        assert_eq!(resolved.program, interpreter);
        assert_eq!(resolved.base_args, vec![script]);
    }

    #[test]
    fn test_interpreter_without_script_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let interpreter = dir.path().join("interp");
        std::fs::write(&interpreter, b"").unwrap();

        let config = RunnerConfig {
            interpreter_candidates: vec![interpreter],
            ..empty_config()
        };
        let err = resolve_runtime(&config).unwrap_err();
        assert!(matches!(err, AutomationError::RuntimeNotFound));
    }

    #[test]
    fn test_path_lookup_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("runner.sh");
        std::fs::write(&script, b"").unwrap();

        // `sh` exists on every unix PATH.
        #[cfg(unix)]
        {
            let config = RunnerConfig {
                interpreter: "sh".to_string(),
                runner_script: Some(script.clone()),
                ..empty_config()
            };
            let resolved = resolve_runtime(&config).unwrap();
            assert_eq!(resolved.base_args, vec![script]);
        }
    }

    #[test]
    fn test_nothing_resolvable() {
        let err = resolve_runtime(&empty_config()).unwrap_err();
        assert!(matches!(err, AutomationError::RuntimeNotFound));
    }
}
