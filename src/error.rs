use thiserror::Error;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

/// Every way a backend call can end other than success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("{0}")] Validation(String),
    #[error("Network error: {0}")] Network(String),
    #[error("Rate limit exceeded. Please try again later.")] RateLimited,
    #[error("{message}")] Http { status: u16, message: String },
    #[error("{0}")] Api(String),
    #[error("Malformed response: {0}")] Parse(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Generated image is not valid base64: {0}")] Base64(#[from] base64::DecodeError),
    #[error("Generated image could not be decoded: {0}")] Image(#[from] image::ImageError),
    #[error("Image decoding was interrupted: {0}")] Interrupted(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("required element #{0} is missing from the page")] MissingElement(&'static str),
}
