use thiserror::Error;

/// Errors produced by the composite AES-CBC + HMAC transforms.
///
/// Every variant is fatal for the current message and deterministic for the
/// same inputs; nothing here is retryable.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid composite key size: expected {expected} bytes, got {got}")]
    InvalidKeySize { expected: usize, got: usize },

    #[error("invalid IV size: expected {expected} bytes, got {got}")]
    InvalidIvSize { expected: usize, got: usize },

    #[error("authentication tag missing or wrong size: expected {expected} bytes, got {got}")]
    MissingTag { expected: usize, got: usize },

    /// Tag verification failed. Carries no detail: the failure must be
    /// indistinguishable regardless of where the mismatch occurred.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// PKCS#7 padding was malformed on a message whose tag already verified.
    #[error("invalid PKCS#7 padding")]
    InvalidPadding,

    /// The transform state machine was driven out of order.
    #[error("transform misuse: {0}")]
    UsageError(&'static str),
}
