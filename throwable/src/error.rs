use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(#[from] envconfig::Error),
    #[error("Invalid capture config: {0}")]
    InvalidConfig(String),
    #[error("Stack capturer already configured")]
    AlreadyConfigured,
}
