//! Error types for the range analyser.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyserError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid IP address: {0}")]
    InvalidIp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Analysis interrupted")]
    Interrupted,
}

pub type Result<T, E = AnalyserError> = std::result::Result<T, E>;
