//! Error types for specglow
//!
//! Two recognized failure kinds; nothing on the per-frame path returns a
//! recoverable error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VizError {
    /// The process has no audio decode capability at all. Reported once at
    /// startup; audio features are inoperable afterwards.
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// The decode service rejected the provided buffer.
    #[error("failed to decode audio: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, VizError>;
