//! Config file loader and serialization.

use crate::config::DocBuildConfig;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local config file name, looked up at the repository root.
pub const PROJECT_CONFIG_FILE: &str = "docbuild.toml";

/// Get the global config path: ~/.config/docbuild/config.toml
pub fn get_global_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    Ok(home.join(".config/docbuild").join("config.toml"))
}

/// Load config from a TOML file. Keys missing from the file keep their defaults.
pub fn load_config_from_file(path: &Path) -> Result<DocBuildConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: DocBuildConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to a TOML file.
pub fn save_config_to_file(config: &DocBuildConfig, path: &Path) -> Result<(), ConfigError> {
    validate_config_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}

/// Pick and load the effective configuration.
///
/// Lookup order, first hit wins:
/// 1. `explicit` (must exist)
/// 2. `<root>/docbuild.toml`
/// 3. the global user config
/// 4. compiled-in defaults
pub fn resolve_config(root: &Path, explicit: Option<&Path>) -> Result<DocBuildConfig, ConfigError> {
    if let Some(path) = explicit {
        log::info!("[Config] Loading explicit config: {}", path.display());
        return load_config_from_file(path);
    }

    let project = root.join(PROJECT_CONFIG_FILE);
    if project.is_file() {
        log::info!("[Config] Loading project config: {}", project.display());
        return load_config_from_file(&project);
    }

    if let Ok(global) = get_global_config_path() {
        if global.is_file() {
            log::info!("[Config] Loading user config: {}", global.display());
            return load_config_from_file(&global);
        }
    }

    log::info!("[Config] No config file found, using defaults");
    Ok(DocBuildConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validate_config_path() {
        assert!(validate_config_path(Path::new("docbuild.toml")).is_ok());
        assert!(validate_config_path(Path::new("docbuild.json")).is_err());
        assert!(validate_config_path(Path::new("docbuild")).is_err());
        assert!(validate_config_path(Path::new("")).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("docbuild.toml");
        fs::write(&path, "output_format = \"singlehtml\"\ndocstring_footprint = 2\n").unwrap();

        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.output_format, "singlehtml");
        assert_eq!(config.docstring_footprint, 2);
        assert_eq!(config.latex_compiler, "pdflatex");
    }

    #[test]
    fn test_missing_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        let err = load_config_from_file(&temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("broken.toml");
        fs::write(&path, "output_format = [unterminated").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::InvalidToml(_))
        ));
    }
}
