use super::service::ConfigError;
use super::settings::AppConfig;

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_non_empty("models.api_base", &config.models.api_base)?;
    validate_non_empty("models.embedding_model", &config.models.embedding_model)?;
    validate_non_empty("models.chat_model", &config.models.chat_model)?;
    validate_non_empty("rag.collection", &config.rag.collection)?;

    let temperature = config.models.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::Invalid(format!(
            "models.temperature must be between 0.0 and 2.0 (got {})",
            temperature
        )));
    }

    if config.models.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "models.request_timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.rag.default_top_k == 0 {
        return Err(ConfigError::Invalid(
            "rag.default_top_k must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_non_empty(path: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", path)));
    }
    Ok(())
}
