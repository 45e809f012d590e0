//! Error types for the scouting core.
//!
//! Every failure mode in this crate has a defined recovery path; these
//! types exist to carry diagnostics, not to abort anything.

/// Enumeration of scouting client errors.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// A single inbound relay frame could not be parsed. The frame is
    /// dropped; the connection stays up.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration values detected before startup.
    #[error("Config error: {0}")]
    Config(String),
}
