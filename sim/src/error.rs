use thiserror::Error;

/// Errors raised while loading or validating a [`crate::SimConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by the [`crate::SimWorld`] driver API.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown garrison: {0}")]
    UnknownGarrison(u32),

    #[error("Garrison {0} cannot order an attack on itself")]
    SelfTarget(u32),
}

pub type Result<T> = std::result::Result<T, SimError>;
