use crate::config::Config;
use crate::providers::{OllamaProvider, OpenAIProvider, OpenRouterProvider};
use crate::traits::Provider;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    match provider_name.to_lowercase().as_str() {
        "ollama" => {
            let mut provider = OllamaProvider::new()
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "STRIDE_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openrouter" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENROUTER_API_KEY", "STRIDE_OPENROUTER_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenRouterProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: openai, openrouter, ollama",
            provider_name
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!("No API key found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config {
            provider: Some("frontier".into()),
            ..Config::default()
        };
        let err = create_provider(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn ollama_needs_no_api_key() {
        let config = Config {
            provider: Some("ollama".into()),
            ..Config::default()
        };
        assert!(create_provider(&config).is_ok());
    }

    #[test]
    fn config_key_is_a_fallback() {
        let resolved =
            resolve_api_key_with_fallback(&["STRIDE_TEST_KEY_THAT_IS_NEVER_SET"], "from-config");
        assert_eq!(resolved.unwrap(), "from-config");
    }
}
