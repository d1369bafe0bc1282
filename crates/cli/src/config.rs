//! Countdown settings loaded from the environment.
//!
//! | Env Var                  | Default    |
//! |--------------------------|------------|
//! | `FORMKIT_COUNTDOWN_SECS` | `120`      |
//! | `FORMKIT_IDLE_TEXT`      | `get code` |
//! | `FORMKIT_WAIT_TEMPLATE`  | `{n}s`     |
//! | `RUST_LOG`               | `formkit=info` |

use anyhow::Context;
use formkit_countdown::CountdownConfig;

pub const COUNTDOWN_SECS_VAR: &str = "FORMKIT_COUNTDOWN_SECS";
pub const IDLE_TEXT_VAR: &str = "FORMKIT_IDLE_TEXT";
pub const WAIT_TEMPLATE_VAR: &str = "FORMKIT_WAIT_TEMPLATE";

pub fn countdown_from_env() -> anyhow::Result<CountdownConfig> {
    countdown_from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from any key lookup; unset keys keep their defaults.
pub fn countdown_from_lookup<F>(lookup: F) -> anyhow::Result<CountdownConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = CountdownConfig::default();

    if let Some(secs) = lookup(COUNTDOWN_SECS_VAR) {
        let secs: u32 = secs
            .trim()
            .parse()
            .with_context(|| format!("{COUNTDOWN_SECS_VAR} must be a whole number of seconds"))?;
        config = config.with_duration_secs(secs);
    }
    if let Some(text) = lookup(IDLE_TEXT_VAR) {
        config = config.with_idle_text(text);
    }
    if let Some(template) = lookup(WAIT_TEMPLATE_VAR) {
        config = config.with_wait_template(template);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = countdown_from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, CountdownConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = countdown_from_lookup(lookup(&[
            (COUNTDOWN_SECS_VAR, " 60 "),
            (IDLE_TEXT_VAR, "send code"),
            (WAIT_TEMPLATE_VAR, "{n} seconds"),
        ]))
        .expect("config");
        assert_eq!(config.duration_secs, 60);
        assert_eq!(config.idle_text, "send code");
        assert_eq!(config.wait_message(5), "5 seconds");
    }

    #[test]
    fn rejects_bad_seconds() {
        let err = countdown_from_lookup(lookup(&[(COUNTDOWN_SECS_VAR, "soon")]))
            .expect_err("should fail");
        assert!(err.to_string().contains(COUNTDOWN_SECS_VAR));
    }
}
