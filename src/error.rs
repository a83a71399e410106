use thiserror::Error;

/// Unified error type for navdial
#[derive(Error, Debug)]
pub enum DialError {
    #[error("missing required asset: {0}")]
    MissingAsset(&'static str),

    #[error("invalid dimension {name}: {value}")]
    InvalidDimension { name: &'static str, value: f32 },

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DialResult<T> = Result<T, DialError>;
