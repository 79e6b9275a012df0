use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SiloError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("unknown bin: {0}")]
    UnknownBin(u32),
    #[error("invalid state: {0}")]
    State(String),
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing notifier")]
    MissingNotifier,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
