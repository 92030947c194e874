use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Settings file not found. Looked in:\n\
        - current directory: stackflow.local.yaml, stackflow.yaml\n\
        - ./.stackflow/ directory\n\
        - ~/.config/stackflow/config.yaml\n\
        Set STACKFLOW_CONFIG_PATH to point at a file directly"
    )]
    SettingsFileNotFound,

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
