//! PKCS#7 block padding.
//!
//! Padding is always present: a block-aligned message gains one full block
//! of `0x10` bytes, so removal is never ambiguous.

use crate::error::CryptoError;
use crate::types::AES_BLOCK_SIZE;

/// Pad a sub-block tail out to one full block.
///
/// `tail` must be shorter than [`AES_BLOCK_SIZE`]. The returned block ends
/// in `n` copies of `n`, where `n = AES_BLOCK_SIZE - tail.len()`.
pub(crate) fn pad(tail: &[u8]) -> [u8; AES_BLOCK_SIZE] {
    debug_assert!(tail.len() < AES_BLOCK_SIZE);
    let n = (AES_BLOCK_SIZE - tail.len()) as u8;
    let mut block = [n; AES_BLOCK_SIZE];
    block[..tail.len()].copy_from_slice(tail);
    block
}

/// Strip PKCS#7 padding from a decrypted message.
///
/// `data` must be non-empty and block-aligned; the final `n` bytes must all
/// equal `n` with `n` in `1..=AES_BLOCK_SIZE`. Returns the plaintext with
/// the padding removed.
pub(crate) fn unpad(data: &[u8]) -> Result<&[u8], CryptoError> {
    if data.is_empty() || data.len() % AES_BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidPadding);
    }
    let n = data[data.len() - 1] as usize;
    if n == 0 || n > AES_BLOCK_SIZE {
        return Err(CryptoError::InvalidPadding);
    }
    let (rest, padding) = data.split_at(data.len() - n);
    if padding.iter().any(|&b| b as usize != n) {
        return Err(CryptoError::InvalidPadding);
    }
    Ok(rest)
}
