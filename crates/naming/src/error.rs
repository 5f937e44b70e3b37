//! Error types for the naming directory

use thiserror::Error;

/// Naming directory errors
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("name not found: {0}")]
    NotFound(String),

    #[error("name already bound: {0}")]
    AlreadyBound(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid object reference: {0}")]
    InvalidReference(String),

    #[error("buffer underflow: need {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("frame too large: {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("request failed on the directory: {0}")]
    Remote(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, NamingError>;
