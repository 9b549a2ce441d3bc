#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parse {source_name}: {detail}")]
    Parse { source_name: String, detail: String },

    #[error("vm entry #{index} has no name")]
    MissingName { index: usize },

    #[error("invalid vm name {0:?}: use lowercase letters, digits and '-', starting with a letter, at most 63 characters")]
    InvalidName(String),

    #[error("duplicate vm name: {0}")]
    DuplicateName(String),

    #[error("vm {vm}: disk_size_gb must be a positive integer, got {value}")]
    InvalidDiskSize { vm: String, value: i64 },

    #[error("invalid repository: {0}")]
    InvalidRepo(String),

    #[error("invalid parameter {key}={value}")]
    InvalidParam { key: String, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    pub(crate) fn parse(source_name: &str, detail: impl std::fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            detail: detail.to_string(),
        }
    }
}
