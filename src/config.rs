//! Environment-derived server configuration
//!
//! The server reads `PORT` plus one variable family per provider
//! (`OPENAI_API_KEY` / `OPENAI_API_URL` / `OPENAI_MODEL` and so on). A
//! provider counts as environment-configured only when its API key is set;
//! URL and model fall back to the catalog defaults when absent.

use crate::provider::{ProviderConfig, ProviderId};
use std::env;

pub const DEFAULT_PORT: u16 = 3001;

/// One provider's environment variable family
struct EnvFamily {
    provider: ProviderId,
    key: &'static str,
    /// Legacy alias accepted for the key variable
    key_alias: Option<&'static str>,
    url: &'static str,
    model: &'static str,
}

/// Checked in this order when falling back to "any configured provider"
const FAMILIES: &[EnvFamily] = &[
    EnvFamily {
        provider: ProviderId::OpenAi,
        key: "OPENAI_API_KEY",
        key_alias: None,
        url: "OPENAI_API_URL",
        model: "OPENAI_MODEL",
    },
    EnvFamily {
        provider: ProviderId::Claude,
        key: "ANTHROPIC_API_KEY",
        key_alias: None,
        url: "ANTHROPIC_API_URL",
        model: "ANTHROPIC_MODEL",
    },
    EnvFamily {
        provider: ProviderId::Gemini,
        key: "GOOGLE_API_KEY",
        key_alias: Some("DEFAULT_GEMINI_API_KEY"),
        url: "GOOGLE_API_URL",
        model: "GOOGLE_MODEL",
    },
    EnvFamily {
        provider: ProviderId::Deepseek,
        key: "DEEPSEEK_API_KEY",
        key_alias: None,
        url: "DEEPSEEK_API_URL",
        model: "DEEPSEEK_MODEL",
    },
    EnvFamily {
        provider: ProviderId::Moonshot,
        key: "MOONSHOT_API_KEY",
        key_alias: None,
        url: "MOONSHOT_API_URL",
        model: "MOONSHOT_MODEL",
    },
];

/// Provider configs resolved from the environment at startup. Captured once
/// and injected; the server never re-reads the environment per request.
#[derive(Debug, Clone, Default)]
pub struct EnvProviderConfigs {
    configs: Vec<ProviderConfig>,
}

impl EnvProviderConfigs {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let configs = FAMILIES
            .iter()
            .filter_map(|family| {
                let api_key = non_empty(family.key)
                    .or_else(|| family.key_alias.and_then(non_empty))?;
                Some(ProviderConfig {
                    provider: family.provider,
                    api_key,
                    api_url: non_empty(family.url).unwrap_or_default(),
                    model: non_empty(family.model).unwrap_or_default(),
                    ..Default::default()
                })
            })
            .collect();
        Self { configs }
    }

    /// Environment config for one specific provider
    pub fn for_provider(&self, provider: ProviderId) -> Option<ProviderConfig> {
        self.configs
            .iter()
            .find(|c| c.provider == provider)
            .cloned()
    }

    /// First configured provider in catalog order
    pub fn first_available(&self) -> Option<ProviderConfig> {
        self.configs.first().cloned()
    }

    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.configs.iter().map(|c| c.provider).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub providers: EnvProviderConfigs,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self {
            port,
            providers: EnvProviderConfigs::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn provider_configured_only_when_key_present() {
        let configs = EnvProviderConfigs::from_lookup(lookup(&[
            ("OPENAI_API_URL", "https://proxy.internal/v1"),
            ("DEEPSEEK_API_KEY", "sk-ds"),
        ]));
        // URL without key does not count as configured
        assert!(configs.for_provider(ProviderId::OpenAi).is_none());
        let deepseek = configs.for_provider(ProviderId::Deepseek).unwrap();
        assert_eq!(deepseek.api_key, "sk-ds");
        assert!(deepseek.api_url.is_empty());
    }

    #[test]
    fn gemini_accepts_legacy_key_alias() {
        let configs =
            EnvProviderConfigs::from_lookup(lookup(&[("DEFAULT_GEMINI_API_KEY", "g-key")]));
        let gemini = configs.for_provider(ProviderId::Gemini).unwrap();
        assert_eq!(gemini.api_key, "g-key");

        // The primary name wins over the alias
        let configs = EnvProviderConfigs::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "primary"),
            ("DEFAULT_GEMINI_API_KEY", "legacy"),
        ]));
        let gemini = configs.for_provider(ProviderId::Gemini).unwrap();
        assert_eq!(gemini.api_key, "primary");
    }

    #[test]
    fn first_available_follows_catalog_order() {
        let configs = EnvProviderConfigs::from_lookup(lookup(&[
            ("MOONSHOT_API_KEY", "m-key"),
            ("ANTHROPIC_API_KEY", "a-key"),
        ]));
        let first = configs.first_available().unwrap();
        assert_eq!(first.provider, ProviderId::Claude);
        assert_eq!(
            configs.configured_providers(),
            vec![ProviderId::Claude, ProviderId::Moonshot]
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let configs = EnvProviderConfigs::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]));
        assert!(configs.first_available().is_none());
    }
}
