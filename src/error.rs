use std::fmt;

#[derive(Debug)]
pub enum OutpaintError {
    ConfigError(String),
    InvalidArgument(String),
    RequestError(String),
    BackendError { status: u16, body: String },
    ResponseError(String),
    ImageError(String),
}

impl fmt::Display for OutpaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutpaintError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            OutpaintError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            OutpaintError::RequestError(msg) => write!(f, "Request error: {}", msg),
            OutpaintError::BackendError { status, body } => {
                write!(f, "Backend error (HTTP {}): {}", status, body)
            }
            OutpaintError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            OutpaintError::ImageError(msg) => write!(f, "Image error: {}", msg),
        }
    }
}

impl std::error::Error for OutpaintError {}

pub type Result<T> = std::result::Result<T, OutpaintError>;
