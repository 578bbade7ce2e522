use crate::error::AppError;
use std::path::Path;

/// Validates the configuration settings
///
/// # Validation Rules
/// - API domain cannot be empty and must be a valid URL or domain name
/// - If log file path is provided, it cannot be empty and its parent
///   directory must exist or be creatable
/// - Pacing delays must be nonzero; a zero delay would hammer the provider
/// - At least one retry attempt is required
pub fn validate_config(
    api_domain: &str,
    log_file_path: &Option<String>,
    per_entity_delay_ms: u64,
    league_delay_ms: u64,
    max_retry_attempts: u32,
) -> Result<(), AppError> {
    if api_domain.is_empty() {
        return Err(AppError::config_error("API domain cannot be empty"));
    }

    // Check if API domain looks like a valid URL or domain
    if !api_domain.starts_with("http://")
        && !api_domain.starts_with("https://")
        && !api_domain.contains('.')
        && !api_domain.starts_with("localhost")
    {
        return Err(AppError::config_error(
            "API domain must be a valid URL or domain name",
        ));
    }

    if let Some(log_path) = log_file_path {
        if log_path.is_empty() {
            return Err(AppError::config_error("Log file path cannot be empty"));
        }

        // Check if parent directory exists or can be created
        if let Some(parent) = Path::new(log_path).parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_error(format!(
                    "Cannot create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    if per_entity_delay_ms == 0 || league_delay_ms == 0 {
        return Err(AppError::config_error(
            "Request pacing delays must be greater than zero",
        ));
    }

    if max_retry_attempts == 0 {
        return Err(AppError::config_error(
            "At least one retry attempt is required",
        ));
    }

    Ok(())
}
