//! Composite authenticated encryption for the JOSE AES-CBC + HMAC family.
//!
//! Implements A128CBC-HS256, A192CBC-HS384, and A256CBC-HS512: AES-CBC over
//! PKCS#7-padded plaintext combined with a truncated HMAC in the
//! encrypt-then-MAC, split-key construction. Select a variant with
//! [`CbcHmacAlgorithm`], then build a per-message [`Encryptor`] or
//! [`Decryptor`] from a caller-supplied composite key, IV, and associated
//! data.
//!
//! This crate only combines already-vetted primitives (the RustCrypto
//! `aes`, `cbc`, `hmac`, and `sha2` implementations); it does not generate
//! or store keys, and it does not pick algorithms for the caller.

pub mod aes_cbc_hmac;
pub mod algorithm;
pub mod error;
mod padding;
pub mod types;

pub use aes_cbc_hmac::{generate_iv, Decryptor, Encryptor};
pub use algorithm::{CbcHmacAlgorithm, ALGORITHMS};
pub use error::CryptoError;
pub use types::{AAD_BITS_LENGTH, AES_BLOCK_SIZE, AES_CBC_IV_LENGTH};
