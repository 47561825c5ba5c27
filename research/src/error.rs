use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Agent error: {0}")]
    AgentError(#[from] agent::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Logging setup error: {0}")]
    LoggingError(String),

    #[error("Agent finished without an answer")]
    NoAnswer,

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
