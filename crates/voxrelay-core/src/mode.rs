//! Mode selection — which provider answers a request.
//!
//! A pure function of the configuration snapshot it is given. Callers take a
//! fresh snapshot per request, so nothing here needs a restart to change.

use crate::config::schema::{Config, LocalPrecedence};
use crate::types::ActiveMode;

/// Pick exactly one backend for the given configuration.
///
/// Remote priority is fixed: OpenAI key, then Gemini key, then none.
/// The local adapter is placed by `local.precedence`.
pub fn select_mode(config: &Config) -> ActiveMode {
    let remote = if config.providers.openai.is_configured() {
        ActiveMode::OpenAi
    } else if config.providers.gemini.is_configured() {
        ActiveMode::Gemini
    } else {
        ActiveMode::None
    };

    match config.local.precedence {
        LocalPrecedence::Disabled => remote,
        LocalPrecedence::Prefer => ActiveMode::Local,
        LocalPrecedence::Fallback if remote == ActiveMode::None => ActiveMode::Local,
        LocalPrecedence::Fallback => remote,
    }
}

/// Model identifier for `mode`, or `None` when nothing is active.
pub fn active_model(config: &Config, mode: ActiveMode) -> Option<&str> {
    match mode {
        ActiveMode::OpenAi => Some(config.providers.openai.model.as_str()),
        ActiveMode::Gemini => Some(config.providers.gemini.model.as_str()),
        ActiveMode::Local => Some(config.local.model_path.as_str()),
        ActiveMode::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(openai: &str, gemini: &str) -> Config {
        let mut config = Config::default();
        config.providers.openai.api_key = openai.to_string();
        config.providers.gemini.api_key = gemini.to_string();
        config
    }

    #[test]
    fn test_no_keys_selects_none() {
        assert_eq!(select_mode(&Config::default()), ActiveMode::None);
    }

    #[test]
    fn test_openai_wins_over_gemini() {
        assert_eq!(select_mode(&config_with("sk-1", "g-1")), ActiveMode::OpenAi);
    }

    #[test]
    fn test_gemini_flip() {
        let before = config_with("", "");
        let after = config_with("", "g-1");
        assert_eq!(select_mode(&before), ActiveMode::None);
        assert_eq!(select_mode(&after), ActiveMode::Gemini);
    }

    #[test]
    fn test_repeated_calls_agree() {
        let config = config_with("", "g-1");
        let first = select_mode(&config);
        for _ in 0..10 {
            assert_eq!(select_mode(&config), first);
        }
    }

    #[test]
    fn test_local_prefer_overrides_remote() {
        let mut config = config_with("sk-1", "");
        config.local.precedence = LocalPrecedence::Prefer;
        assert_eq!(select_mode(&config), ActiveMode::Local);
    }

    #[test]
    fn test_local_fallback_only_without_remote() {
        let mut config = config_with("", "");
        config.local.precedence = LocalPrecedence::Fallback;
        assert_eq!(select_mode(&config), ActiveMode::Local);

        config.providers.gemini.api_key = "g-1".to_string();
        assert_eq!(select_mode(&config), ActiveMode::Gemini);
    }

    #[test]
    fn test_active_model_per_mode() {
        let config = Config::default();
        assert_eq!(active_model(&config, ActiveMode::OpenAi), Some("gpt-4o-mini"));
        assert_eq!(active_model(&config, ActiveMode::Gemini), Some("gemini-1.5-flash"));
        assert_eq!(
            active_model(&config, ActiveMode::Local),
            Some("./models/ggml-model-q4_0.bin")
        );
        assert_eq!(active_model(&config, ActiveMode::None), None);
    }
}
