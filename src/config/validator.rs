//! Configuration validation run before the pipeline starts.

use crate::config::DocBuildConfig;
use crate::error::ConfigError;

/// Reject configurations the pipeline could not run with.
pub fn validate_config(config: &DocBuildConfig) -> Result<(), ConfigError> {
    validate_output_format(&config.output_format)?;
    validate_env_name(&config.footprint_env)?;

    if !config.cheatsheet_source.ends_with(".tex") {
        return Err(ConfigError::ValidationFailed(format!(
            "Cheatsheet source must be a .tex file, got '{}'",
            config.cheatsheet_source
        )));
    }

    if config.site_generator_candidates.is_empty()
        || config.site_generator_candidates.iter().any(|c| c.trim().is_empty())
    {
        return Err(ConfigError::ValidationFailed(
            "At least one non-empty site generator candidate is required".to_string(),
        ));
    }

    let commands = [
        ("cmap_generator", &config.cmap_generator),
        ("dependency_lister", &config.dependency_lister),
        ("latex_compiler", &config.latex_compiler),
        ("source_dir", &config.source_dir),
        ("static_dir", &config.static_dir),
        ("downloads_dir", &config.downloads_dir),
    ];
    for (key, value) in commands {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(format!("'{}' cannot be empty", key)));
        }
    }

    Ok(())
}

/// The format doubles as a directory name, so it must be a single path segment.
fn validate_output_format(format: &str) -> Result<(), ConfigError> {
    if format.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Output format cannot be empty".to_string(),
        ));
    }
    if format.contains(['/', '\\']) || format == "." || format == ".." {
        return Err(ConfigError::ValidationFailed(format!(
            "Output format must be a plain name, got '{}'",
            format
        )));
    }
    Ok(())
}

fn validate_env_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(ConfigError::ValidationFailed(format!(
            "Invalid environment variable name: '{}'",
            name
        )));
    }
    Ok(())
}
