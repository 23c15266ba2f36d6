//! Operator resolution for detail edits.
//!
//! Every committed edit records who made it. Rather than requiring `--as`
//! on every invocation, the operator is resolved through a chain:
//!
//! 1. `--as <operator>`: explicit per-command override
//! 2. `REPAIR_OPERATOR` env var: process/session level
//! 3. `operator` in `~/.repair-timeline/config.toml`: global default

use std::env;

use crate::config::Config;

/// Error message shown when the operator cannot be resolved.
pub const OPERATOR_REQUIRED: &str = "operator required: pass --as <operator>, \
    set REPAIR_OPERATOR, or add `operator = \"...\"` to ~/.repair-timeline/config.toml";

/// Resolve the acting operator from the tiered resolution chain.
pub fn resolve_operator(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    resolve_with_env(explicit, env::var("REPAIR_OPERATOR").ok(), config)
}

fn resolve_with_env(
    explicit: Option<&str>,
    from_env: Option<String>,
    config: &Config,
) -> Result<String, String> {
    if let Some(op) = explicit.filter(|s| !s.is_empty()) {
        return Ok(op.to_string());
    }

    if let Some(op) = from_env
        && !op.is_empty()
    {
        return Ok(op);
    }

    config
        .operator
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OPERATOR_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(operator: Option<&str>) -> Config {
        Config {
            operator: operator.map(String::from),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_wins() {
        let result = resolve_with_env(
            Some("ana"),
            Some("env-op".into()),
            &config_with(Some("cfg")),
        );
        assert_eq!(result.unwrap(), "ana");
    }

    #[test]
    fn env_beats_config() {
        let result = resolve_with_env(None, Some("env-op".into()), &config_with(Some("cfg")));
        assert_eq!(result.unwrap(), "env-op");
    }

    #[test]
    fn config_is_last_resort() {
        let result = resolve_with_env(None, Some(String::new()), &config_with(Some("cfg")));
        assert_eq!(result.unwrap(), "cfg");
    }

    #[test]
    fn nothing_set_is_an_error() {
        let err = resolve_with_env(None, None, &config_with(None)).unwrap_err();
        assert_eq!(err, OPERATOR_REQUIRED);
    }
}
