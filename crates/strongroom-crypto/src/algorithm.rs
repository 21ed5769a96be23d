//! Descriptors for the AES-CBC + HMAC-SHA2 variants.
//!
//! Fixed parameter table, keyed by the JOSE content-encryption names:
//!
//! | Name          | Composite key | Hash    | Tag      |
//! |---------------|---------------|---------|----------|
//! | A128CBC-HS256 | 256 bits      | SHA-256 | 16 bytes |
//! | A192CBC-HS384 | 384 bits      | SHA-384 | 24 bytes |
//! | A256CBC-HS512 | 512 bits      | SHA-512 | 32 bytes |
//!
//! The composite key splits in half: the first half keys AES-CBC, the
//! second half keys the HMAC, and the tag is the digest truncated to the
//! HMAC key length.

use crate::types::AES_BLOCK_SIZE;

/// The three fixed AES-CBC + HMAC variants.
///
/// Descriptors are immutable process-wide constants; copy and share freely.
/// The name-to-parameters mapping is the wire contract for callers that
/// persist or transmit a variant identifier (e.g. a JOSE `enc` header)
/// alongside IV, tag, and ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CbcHmacAlgorithm {
    /// AES-128-CBC with HMAC-SHA-256, 256-bit composite key.
    Aes128CbcHmacSha256,
    /// AES-192-CBC with HMAC-SHA-384, 384-bit composite key.
    Aes192CbcHmacSha384,
    /// AES-256-CBC with HMAC-SHA-512, 512-bit composite key.
    Aes256CbcHmacSha512,
}

/// Every supported variant, in key-size order.
pub const ALGORITHMS: &[CbcHmacAlgorithm] = &[
    CbcHmacAlgorithm::Aes128CbcHmacSha256,
    CbcHmacAlgorithm::Aes192CbcHmacSha384,
    CbcHmacAlgorithm::Aes256CbcHmacSha512,
];

impl CbcHmacAlgorithm {
    /// JOSE `enc` identifier for this variant.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aes128CbcHmacSha256 => "A128CBC-HS256",
            Self::Aes192CbcHmacSha384 => "A192CBC-HS384",
            Self::Aes256CbcHmacSha512 => "A256CBC-HS512",
        }
    }

    /// Look up a variant by its JOSE `enc` identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        ALGORITHMS.iter().copied().find(|a| a.name() == name)
    }

    /// Composite key size in bits.
    pub const fn key_size(self) -> usize {
        match self {
            Self::Aes128CbcHmacSha256 => 256,
            Self::Aes192CbcHmacSha384 => 384,
            Self::Aes256CbcHmacSha512 => 512,
        }
    }

    /// Composite key size in bytes.
    pub const fn key_size_in_bytes(self) -> usize {
        self.key_size() / 8
    }

    /// Cipher block size in bits (128 for AES, every variant).
    pub const fn block_size(self) -> usize {
        AES_BLOCK_SIZE * 8
    }

    /// Cipher block size in bytes.
    pub const fn block_size_in_bytes(self) -> usize {
        AES_BLOCK_SIZE
    }

    /// AES sub-key size in bytes (first half of the composite key).
    pub const fn aes_key_size_in_bytes(self) -> usize {
        self.key_size_in_bytes() / 2
    }

    /// HMAC sub-key size in bytes (second half of the composite key).
    pub const fn hmac_key_size_in_bytes(self) -> usize {
        self.key_size_in_bytes() / 2
    }

    /// Authentication tag length in bytes: the HMAC digest left-truncated
    /// to the HMAC key length.
    pub const fn tag_size_in_bytes(self) -> usize {
        self.hmac_key_size_in_bytes()
    }
}
