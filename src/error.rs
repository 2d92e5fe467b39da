//! # Error Types
//!
//! Custom error types for DS4 Bridge using `thiserror`.
//!
//! Only bootstrap code returns these. Event handlers never fail outward:
//! anything that goes wrong while reacting to an event is logged and dropped.

use thiserror::Error;

/// Main error type for DS4 Bridge
#[derive(Debug, Error)]
pub enum Ds4BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay script line could not be parsed
    #[error("Script error on line {line}: {source}")]
    Script {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Controller slot index outside the supported range
    #[error("Invalid controller slot: {0}")]
    InvalidSlot(u8),
}

/// Result type alias for DS4 Bridge
pub type Result<T> = std::result::Result<T, Ds4BridgeError>;
