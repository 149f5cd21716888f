use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Canonicalization errors
    #[error("Tag value too short: {bytes} byte(s), need at least {min}")]
    TagTooShort { bytes: usize, min: usize },

    // Reader errors
    #[error("Reader fault: {0}")]
    Reader(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
