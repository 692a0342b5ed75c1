//! Error types shared by the signature and delta codecs.

use std::fmt;

/// Errors produced by this crate's encoders and decoders.
///
/// The three kinds are closed and distinguishable by the caller. `Format`
/// covers anything wrong with the wire bytes themselves (bad magic, a
/// strong-hash length outside the algorithm's range, a truncated record).
/// `Io` is forwarded verbatim from the underlying reader or writer. `Internal`
/// signals a bug: a state the crate's own invariants should have made
/// unreachable.
#[derive(thiserror::Error, Debug)]
pub enum RdiffError {
    /// The signature or delta wire format was invalid.
    #[error("format error: {0}")]
    Format(String),
    /// An I/O error was returned by the underlying reader or writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// An invariant the crate relies on did not hold; this indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RdiffError {
    pub(crate) fn format(msg: impl fmt::Display) -> Self {
        Self::Format(msg.to_string())
    }

    pub(crate) fn internal(msg: impl fmt::Display) -> Self {
        Self::Internal(msg.to_string())
    }
}

/// A `Result` alias using [`RdiffError`].
pub type Result<T> = std::result::Result<T, RdiffError>;
