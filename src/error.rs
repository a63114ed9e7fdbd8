use thiserror::Error;

use crate::mirrors::RunRejected;

#[derive(Error, Debug)]
pub enum WelcomeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Mirror refresh rejected: {0}")]
    Rejected(#[from] RunRejected),

    #[error("Unsupported desktop environment: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, WelcomeError>;
