//! Full configuration validation.
//!
//! Validates numeric ranges and URL shapes, collecting every error.

use crate::schema::HarborConfig;
use harbor_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HarborConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "updates.timeout_secs",
        u64::from(config.updates.timeout_secs),
        1,
        120,
    );
    if config.updates.check_on_startup && !config.updates.repository.contains('/') {
        errors.push(format!(
            "updates.repository = {:?} must be in owner/repo form",
            config.updates.repository
        ));
    }

    validate_http_url(&mut errors, "backend.url", &config.backend.url);
    validate_range(
        &mut errors,
        "backend.startup_timeout_ms",
        config.backend.startup_timeout_ms,
        0,
        600_000,
    );
    validate_range(
        &mut errors,
        "backend.probe_timeout_ms",
        config.backend.probe_timeout_ms,
        50,
        10_000,
    );

    if let Some(url) = &config.frontend.url {
        validate_http_url(&mut errors, "frontend.url", url);
    }
    if let Some(command) = &config.frontend.command {
        if command.trim().is_empty() {
            errors.push("frontend.command is empty".into());
        }
    }
    validate_range(
        &mut errors,
        "frontend.probe_interval_ms",
        config.frontend.probe_interval_ms,
        50,
        10_000,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

fn validate_http_url(errors: &mut Vec<String>, name: &str, value: &str) {
    let trimmed = value.trim();
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match rest {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => {}
        _ => errors.push(format!("{name} = {value:?} is not an http(s) URL")),
    }
}
