use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Invalid content: {0}")]
    InvalidContent(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
