use reqwest::Url;

use super::{types::Config, ConfigError, PipelineKind};

/// Validate configuration
/// Currently validates:
/// - Session base URL parses as an http(s) URL
/// - Session timeout and viewport are not 0
/// - Every pipeline's resolved attempt budget is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Session validation
    let url = Url::parse(&config.session.base_url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "session.base_url is not a valid URL ({}): {}",
            config.session.base_url, e
        ))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError(format!(
            "session.base_url must be http or https, got {}",
            url.scheme()
        )));
    }

    if config.session.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "session.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.session.viewport_width == 0 || config.session.viewport_height == 0 {
        return Err(ConfigError::ValidationError(
            "session viewport dimensions cannot be 0".to_string(),
        ));
    }

    // Pipeline validation
    for kind in PipelineKind::ALL {
        if config.pipeline(kind).max_attempts == 0 {
            return Err(ConfigError::ValidationError(format!(
                "pipelines.{}.max_attempts cannot be 0",
                kind
            )));
        }
    }

    Ok(())
}
