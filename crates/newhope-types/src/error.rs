/// Key-exchange operation errors.
///
/// Every structural deviation aborts the current handshake step; nothing is
/// retried internally. A reconciliation disagreement (both sides complete but
/// derive different keys) is not detectable here and must be caught by a
/// higher-layer key-confirmation step.
#[derive(Debug, thiserror::Error)]
pub enum KexError {
    /// A wire message was not exactly the expected fixed length.
    #[error("message length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// The random-byte source could not supply entropy.
    #[error("random source failed to supply entropy")]
    RandomSourceFailure,

    /// The hash capability produced output of the wrong length.
    #[error("hash produced malformed output")]
    HashFailure,
}
