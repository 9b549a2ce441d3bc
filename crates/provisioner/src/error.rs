#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("config error: {0}")]
    Config(#[from] vmspec::ConfigError),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("unknown vm: {0}")]
    UnknownVm(String),
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;
