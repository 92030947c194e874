pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{BootstrapSettings, ExecutorSettings, Settings, StoreSettings};

use std::path::PathBuf;

const CONFIG_PATH_ENV: &str = "STACKFLOW_CONFIG_PATH";
const CANDIDATES: [&str; 2] = ["stackflow.local.yaml", "stackflow.yaml"];

/// Get the StackFlow config directory, creating it when missing
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("stackflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the settings file
///
/// Search order:
/// 1. `STACKFLOW_CONFIG_PATH` environment variable
/// 2. current directory: stackflow.local.yaml, stackflow.yaml
/// 3. `./.stackflow/` directory, same order
/// 4. `~/.config/stackflow/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at missing file {}", CONFIG_PATH_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let stackflow_dir = current_dir.join(".stackflow");
    if stackflow_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = stackflow_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("stackflow").join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

/// Locate and parse the settings file
pub fn load() -> Result<Settings> {
    let path = find_config_file()?;
    Settings::load_from(&path)
}

/// Like [`load`], but falls back to defaults when no file exists
pub fn load_or_default() -> Result<Settings> {
    match load() {
        Err(ConfigError::SettingsFileNotFound) => Ok(Settings::default()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("stackflow"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yaml"), "log_level: debug").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        let settings = load();

        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().ends_with("stackflow.yaml"));
        assert_eq!(settings.unwrap().log_level.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("stackflow.yaml"), "# shared").unwrap();
        fs::write(temp_dir.path().join("stackflow.local.yaml"), "# local").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();

        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.ends_with("stackflow.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_stackflow_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let stackflow_dir = temp_dir.path().join(".stackflow");
        fs::create_dir(&stackflow_dir).unwrap();
        fs::write(stackflow_dir.join("stackflow.yaml"), "# in dir").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file().unwrap();

        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.ends_with(".stackflow/stackflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "# custom").unwrap();

        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        }

        let result = find_config_file();

        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_find_config_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let has_global = dirs::config_dir()
            .map(|d| d.join("stackflow").join("config.yaml").exists())
            .unwrap_or(false);

        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_config_file();
        let settings = load_or_default();

        std::env::set_current_dir(original_dir).unwrap();

        if !has_global {
            assert!(matches!(result, Err(ConfigError::SettingsFileNotFound)));
            assert_eq!(settings.unwrap(), Settings::default());
        }
    }
}
