//! Log-level resolution for the CLI.
//!
//! Precedence: `--debug` > `--verbose` > `LOG_LEVEL` env > WARN.
//! Environment problems (an invalid `LOG_LEVEL`, the deprecated
//! `OPENAI_LOG`) are collected as deferred warnings so they can be
//! emitted through the subscriber once it exists.

use tracing::level_filters::LevelFilter;

/// Resolved logging setup plus warnings to emit after init.
#[derive(Debug)]
pub struct LogSetup {
    pub filter: LevelFilter,
    pub deferred_warnings: Vec<String>,
}

/// Resolve against the real process environment.
pub fn resolve(verbose: bool, debug: bool) -> LogSetup {
    resolve_from(
        verbose,
        debug,
        std::env::var("LOG_LEVEL").ok(),
        std::env::var("OPENAI_LOG").is_ok(),
    )
}

/// Pure resolution, separated from environment access for testing.
pub fn resolve_from(
    verbose: bool,
    debug: bool,
    log_level: Option<String>,
    openai_log_set: bool,
) -> LogSetup {
    let mut deferred_warnings = Vec::new();
    if openai_log_set {
        deferred_warnings
            .push("OPENAI_LOG is deprecated and ignored; use LOG_LEVEL instead".to_string());
    }

    let filter = if debug {
        LevelFilter::DEBUG
    } else if verbose {
        LevelFilter::INFO
    } else {
        match log_level.as_deref().map(str::trim) {
            None | Some("") => LevelFilter::WARN,
            Some(value) => match value.to_lowercase().as_str() {
                "error" => LevelFilter::ERROR,
                "warn" | "warning" => LevelFilter::WARN,
                "info" => LevelFilter::INFO,
                "debug" => LevelFilter::DEBUG,
                "trace" => LevelFilter::TRACE,
                other => {
                    deferred_warnings.push(format!(
                        "LOG_LEVEL '{other}' is not a valid level; falling back to WARN"
                    ));
                    LevelFilter::WARN
                }
            },
        }
    };

    LogSetup {
        filter,
        deferred_warnings,
    }
}

/// Install the global subscriber and emit any deferred warnings.
pub fn init(setup: &LogSetup) {
    tracing_subscriber::fmt()
        .with_max_level(setup.filter)
        .with_target(false)
        .init();
    for warning in &setup.deferred_warnings {
        tracing::warn!("{warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_win_over_environment() {
        let setup = resolve_from(true, false, Some("error".into()), false);
        assert_eq!(setup.filter, LevelFilter::INFO);

        let setup = resolve_from(true, true, Some("error".into()), false);
        assert_eq!(setup.filter, LevelFilter::DEBUG);
    }

    #[test]
    fn env_level_applies_without_flags() {
        let setup = resolve_from(false, false, Some("TRACE".into()), false);
        assert_eq!(setup.filter, LevelFilter::TRACE);
        assert!(setup.deferred_warnings.is_empty());
    }

    #[test]
    fn default_is_warn() {
        let setup = resolve_from(false, false, None, false);
        assert_eq!(setup.filter, LevelFilter::WARN);
        assert!(setup.deferred_warnings.is_empty());
    }

    #[test]
    fn invalid_env_level_defers_a_warning_and_falls_back() {
        let setup = resolve_from(false, false, Some("loud".into()), false);
        assert_eq!(setup.filter, LevelFilter::WARN);
        assert_eq!(setup.deferred_warnings.len(), 1);
        assert!(setup.deferred_warnings[0].contains("loud"));
    }

    #[test]
    fn deprecated_openai_log_defers_a_warning() {
        let setup = resolve_from(false, false, None, true);
        assert_eq!(setup.deferred_warnings.len(), 1);
        assert!(setup.deferred_warnings[0].contains("OPENAI_LOG"));
    }
}
