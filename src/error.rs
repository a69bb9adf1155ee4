//! Error types for buswire.

use thiserror::Error;

/// Main error type for all bus operations.
#[derive(Debug, Error)]
pub enum BuswireError {
    /// The underlying transport channel failed. Never retried by the
    /// protocol layer; terminates the run.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Malformed bytes at some framing/decoding layer (wrong length,
    /// bad preamble, bad checksum, unknown direction tag, mismatched
    /// fixed fields).
    #[error("parse error: {0}")]
    Parse(String),

    /// The bus gateway reported that no device answered. Expected and
    /// routinely handled during enumeration; distinct from a transport
    /// failure.
    #[error("bus timeout: no device answered")]
    Timeout,

    /// A well-formed response that is semantically impossible given what
    /// was requested. Indicates a bus/gateway bug; always fatal.
    #[error("protocol contract violation: {0}")]
    Contract(String),

    /// No free address range large enough for a newly learned device.
    #[error("no suitable free space in usage map for a device of size {size}")]
    CapacityExhausted {
        /// Address span the learn-mode device asked for.
        size: u8,
    },
}

impl BuswireError {
    /// Process exit code for a fatal error.
    ///
    /// Usage errors exit with 2 (clap's default); the remaining fatal
    /// classes each get a distinct code so operators can script against
    /// them. `Timeout` is handled inside the enumeration loops and only
    /// reaches here if something is badly wrong, so it maps to the
    /// protocol-violation code.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuswireError::Transport(_) => 3,
            BuswireError::Parse(_) | BuswireError::Timeout | BuswireError::Contract(_) => 4,
            BuswireError::CapacityExhausted { .. } => 5,
        }
    }
}

/// Result type alias using BuswireError.
pub type Result<T> = std::result::Result<T, BuswireError>;
