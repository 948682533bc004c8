use aes_accel::RegisterError;
use thiserror::Error;

/// Errors raised on the host side of the link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// A register access was rejected by the bus.
    #[error("register access failed: {0}")]
    Register(#[from] RegisterError),

    /// Reading from or writing to the link failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A wait exceeded the configured budget, in ticks.
    #[error("accelerator did not complete within {0} ticks")]
    CompletionTimeout(u64),

    /// A frame had the wrong number of bytes.
    #[error("invalid frame length: expected {expected}, got {got}")]
    FrameLength {
        /// Required length.
        expected: usize,
        /// Length received.
        got: usize,
    },

    /// The config file is not valid TOML for this schema.
    #[error("malformed config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result alias for link operations.
pub type Result<T> = std::result::Result<T, LinkError>;
