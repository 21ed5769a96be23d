//! Composite AES-CBC + HMAC-SHA2 authenticated encryption.
//!
//! Encrypt-then-MAC with a split key, as used by the JOSE content-encryption
//! algorithms: the first half of the composite key drives AES-CBC over
//! PKCS#7-padded plaintext, the second half keys an HMAC over
//! `associated_data || IV || ciphertext || u64_be(aad bit length)`, and the
//! tag is the digest left-truncated to the HMAC key length.
//!
//! One [`Encryptor`] or [`Decryptor`] instance handles exactly one message.
//! Instances hold transient key and chaining state and are discarded after
//! finalization; reusing one is a [`CryptoError::UsageError`].
//!
//! Decryption offers two paths with different guarantees:
//! [`Decryptor::transform`] verifies the whole MAC before decrypting a
//! single block, while the streaming [`Decryptor::update`] hands out
//! unverified plaintext and defers the verdict to [`Decryptor::finalize`].

use std::fmt;

use aes::{Aes128, Aes192, Aes256};
use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::algorithm::CbcHmacAlgorithm;
use crate::error::CryptoError;
use crate::padding;
use crate::types::{AAD_BITS_LENGTH, AES_BLOCK_SIZE, AES_CBC_IV_LENGTH};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Generate a random 16-byte CBC IV.
///
/// Caller-side convenience: the transforms never generate IVs themselves,
/// and IV unpredictability per (key, message) is the caller's contract.
pub fn generate_iv() -> [u8; AES_CBC_IV_LENGTH] {
    let mut iv = [0u8; AES_CBC_IV_LENGTH];
    getrandom::getrandom(&mut iv).expect("getrandom failed");
    iv
}

/// CBC encryption state over the three AES widths.
enum CbcEnc {
    Aes128(Aes128CbcEnc),
    Aes192(Aes192CbcEnc),
    Aes256(Aes256CbcEnc),
}

impl CbcEnc {
    fn new(algorithm: CbcHmacAlgorithm, aes_key: &[u8], iv: &[u8]) -> Self {
        // Sub-key and IV lengths are checked by the factory before this runs.
        match algorithm {
            CbcHmacAlgorithm::Aes128CbcHmacSha256 => Self::Aes128(
                Aes128CbcEnc::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
            CbcHmacAlgorithm::Aes192CbcHmacSha384 => Self::Aes192(
                Aes192CbcEnc::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
            CbcHmacAlgorithm::Aes256CbcHmacSha512 => Self::Aes256(
                Aes256CbcEnc::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
        }
    }

    /// Encrypt `buf` in place; length must be a block multiple.
    fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % AES_BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(AES_BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.encrypt_block_mut(block),
                Self::Aes192(c) => c.encrypt_block_mut(block),
                Self::Aes256(c) => c.encrypt_block_mut(block),
            }
        }
    }
}

/// CBC decryption state over the three AES widths.
enum CbcDec {
    Aes128(Aes128CbcDec),
    Aes192(Aes192CbcDec),
    Aes256(Aes256CbcDec),
}

impl CbcDec {
    fn new(algorithm: CbcHmacAlgorithm, aes_key: &[u8], iv: &[u8]) -> Self {
        match algorithm {
            CbcHmacAlgorithm::Aes128CbcHmacSha256 => Self::Aes128(
                Aes128CbcDec::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
            CbcHmacAlgorithm::Aes192CbcHmacSha384 => Self::Aes192(
                Aes192CbcDec::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
            CbcHmacAlgorithm::Aes256CbcHmacSha512 => Self::Aes256(
                Aes256CbcDec::new_from_slices(aes_key, iv)
                    .expect("key and IV lengths validated at construction"),
            ),
        }
    }

    /// Decrypt `buf` in place; length must be a block multiple.
    fn decrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % AES_BLOCK_SIZE, 0);
        for chunk in buf.chunks_exact_mut(AES_BLOCK_SIZE) {
            let block = GenericArray::from_mut_slice(chunk);
            match self {
                Self::Aes128(c) => c.decrypt_block_mut(block),
                Self::Aes192(c) => c.decrypt_block_mut(block),
                Self::Aes256(c) => c.decrypt_block_mut(block),
            }
        }
    }
}

/// Running HMAC over the three hash widths.
enum TagMac {
    Sha256(HmacSha256),
    Sha384(HmacSha384),
    Sha512(HmacSha512),
}

impl TagMac {
    fn new(algorithm: CbcHmacAlgorithm, hmac_key: &[u8]) -> Self {
        match algorithm {
            CbcHmacAlgorithm::Aes128CbcHmacSha256 => Self::Sha256(
                HmacSha256::new_from_slice(hmac_key).expect("HMAC accepts any key length"),
            ),
            CbcHmacAlgorithm::Aes192CbcHmacSha384 => Self::Sha384(
                HmacSha384::new_from_slice(hmac_key).expect("HMAC accepts any key length"),
            ),
            CbcHmacAlgorithm::Aes256CbcHmacSha512 => Self::Sha512(
                HmacSha512::new_from_slice(hmac_key).expect("HMAC accepts any key length"),
            ),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(m) => m.update(data),
            Self::Sha384(m) => m.update(data),
            Self::Sha512(m) => m.update(data),
        }
    }

    /// Full digest. Resets the inner state; the transform is done with it.
    fn finalize(&mut self) -> Vec<u8> {
        match self {
            Self::Sha256(m) => m.clone().finalize().into_bytes().to_vec(),
            Self::Sha384(m) => m.clone().finalize().into_bytes().to_vec(),
            Self::Sha512(m) => m.clone().finalize().into_bytes().to_vec(),
        }
    }
}

/// Validated, split, MAC-primed state shared by both factory paths.
struct Primed<'a> {
    aes_key: &'a [u8],
    mac: TagMac,
    aad_bits: [u8; AAD_BITS_LENGTH],
}

fn prime<'a>(
    algorithm: CbcHmacAlgorithm,
    key: &'a [u8],
    iv: &[u8],
    associated_data: &[u8],
) -> Result<Primed<'a>, CryptoError> {
    if key.len() != algorithm.key_size_in_bytes() {
        return Err(CryptoError::InvalidKeySize {
            expected: algorithm.key_size_in_bytes(),
            got: key.len(),
        });
    }
    if iv.len() != AES_CBC_IV_LENGTH {
        return Err(CryptoError::InvalidIvSize {
            expected: AES_CBC_IV_LENGTH,
            got: iv.len(),
        });
    }

    // First half encrypts, second half authenticates.
    let (aes_key, hmac_key) = key.split_at(key.len() / 2);

    // The MAC input starts with the associated data and the IV; ciphertext
    // follows as it is produced, and the 8-byte big-endian bit length of
    // the associated data closes the input.
    let mut mac = TagMac::new(algorithm, hmac_key);
    mac.update(associated_data);
    mac.update(iv);

    Ok(Primed {
        aes_key,
        mac,
        aad_bits: ((associated_data.len() as u64) * 8).to_be_bytes(),
    })
}

impl CbcHmacAlgorithm {
    /// Build a streaming [`Encryptor`] for one message.
    ///
    /// # Arguments
    /// * `key` - Composite key of exactly [`key_size_in_bytes`](Self::key_size_in_bytes);
    ///   AES half first, HMAC half second
    /// * `iv` - 16-byte CBC initialization vector, unpredictable per message
    /// * `associated_data` - Authenticated but not encrypted (may be empty)
    pub fn create_encryptor(
        self,
        key: &[u8],
        iv: &[u8],
        associated_data: &[u8],
    ) -> Result<Encryptor, CryptoError> {
        let primed = prime(self, key, iv, associated_data)?;
        Ok(Encryptor {
            cipher: CbcEnc::new(self, primed.aes_key, iv),
            mac: primed.mac,
            aad_bits: primed.aad_bits,
            tag_size: self.tag_size_in_bytes(),
            pending: Vec::new(),
            finalized: false,
        })
    }

    /// Build a streaming [`Decryptor`] for one message.
    ///
    /// Same validation as [`create_encryptor`](Self::create_encryptor), plus
    /// `tag` must be exactly [`tag_size_in_bytes`](Self::tag_size_in_bytes).
    pub fn create_decryptor(
        self,
        key: &[u8],
        iv: &[u8],
        associated_data: &[u8],
        tag: &[u8],
    ) -> Result<Decryptor, CryptoError> {
        let primed = prime(self, key, iv, associated_data)?;
        if tag.len() != self.tag_size_in_bytes() {
            return Err(CryptoError::MissingTag {
                expected: self.tag_size_in_bytes(),
                got: tag.len(),
            });
        }
        Ok(Decryptor {
            cipher: CbcDec::new(self, primed.aes_key, iv),
            mac: primed.mac,
            aad_bits: primed.aad_bits,
            tag: tag.to_vec(),
            pending: Vec::new(),
            streamed: false,
            finalized: false,
        })
    }
}

/// Streaming encryptor for one message.
///
/// Feed plaintext with [`update`](Self::update), then call
/// [`finalize`](Self::finalize) once to flush the padded final block and
/// obtain the authentication tag, or use [`transform`](Self::transform) for
/// the one-shot equivalent.
pub struct Encryptor {
    cipher: CbcEnc,
    mac: TagMac,
    aad_bits: [u8; AAD_BITS_LENGTH],
    tag_size: usize,
    pending: Vec<u8>,
    finalized: bool,
}

impl Encryptor {
    /// Encrypt a plaintext chunk.
    ///
    /// Returns the ciphertext produced for this chunk; bytes short of a
    /// block boundary stay buffered, so the result may be empty.
    pub fn update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.finalized {
            return Err(CryptoError::UsageError("update after finalize"));
        }
        self.pending.extend_from_slice(plaintext);

        let whole = self.pending.len() - self.pending.len() % AES_BLOCK_SIZE;
        let mut ciphertext: Vec<u8> = self.pending.drain(..whole).collect();
        self.cipher.encrypt_blocks(&mut ciphertext);
        self.mac.update(&ciphertext);
        Ok(ciphertext)
    }

    /// Flush the padded final block and produce the authentication tag.
    ///
    /// Returns `(final_ciphertext, tag)`. The tag is the HMAC digest over
    /// `aad || iv || ciphertext || aad_bit_length` left-truncated to the
    /// variant's tag size, and is owned by the caller. One-shot: a second
    /// call is a [`CryptoError::UsageError`].
    pub fn finalize(&mut self) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        if self.finalized {
            return Err(CryptoError::UsageError("finalize called twice"));
        }
        self.finalized = true;

        let mut ciphertext = padding::pad(&self.pending).to_vec();
        self.pending.zeroize();
        self.cipher.encrypt_blocks(&mut ciphertext);
        self.mac.update(&ciphertext);
        self.mac.update(&self.aad_bits);

        let mut digest = self.mac.finalize();
        let tag = digest[..self.tag_size].to_vec();
        digest.zeroize();
        Ok((ciphertext, tag))
    }

    /// One-shot convenience: `update` then `finalize`.
    ///
    /// Returns the complete ciphertext and the authentication tag.
    pub fn transform(mut self, plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let mut ciphertext = self.update(plaintext)?;
        let (tail, tag) = self.finalize()?;
        ciphertext.extend_from_slice(&tail);
        Ok((ciphertext, tag))
    }
}

impl Drop for Encryptor {
    fn drop(&mut self) {
        // Buffered plaintext tail
        self.pending.zeroize();
    }
}

impl fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryptor")
            .field("tag_size", &self.tag_size)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

/// Streaming decryptor for one message.
///
/// [`transform`](Self::transform) is the recommended path: it verifies the
/// entire MAC before any block is decrypted. The streaming
/// [`update`](Self::update)/[`finalize`](Self::finalize) pair trades that
/// guarantee for constant memory; see `update` for the caller contract.
pub struct Decryptor {
    cipher: CbcDec,
    mac: TagMac,
    aad_bits: [u8; AAD_BITS_LENGTH],
    tag: Vec<u8>,
    pending: Vec<u8>,
    streamed: bool,
    finalized: bool,
}

impl Decryptor {
    /// Decrypt a ciphertext chunk without waiting for verification.
    ///
    /// The chunk is folded into the running MAC and complete blocks are
    /// decrypted, always holding back at least one block: the final block
    /// carries the padding and is only released by
    /// [`finalize`](Self::finalize) after the tag verdict.
    ///
    /// Caller contract: the returned plaintext is UNVERIFIED until
    /// `finalize` succeeds. Callers that cannot withhold all output until
    /// then must use [`transform`](Self::transform) instead.
    pub fn update(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.finalized {
            return Err(CryptoError::UsageError("update after finalize"));
        }
        self.streamed = true;
        self.mac.update(ciphertext);
        self.pending.extend_from_slice(ciphertext);

        let release = if self.pending.len() > AES_BLOCK_SIZE {
            (self.pending.len() - AES_BLOCK_SIZE) / AES_BLOCK_SIZE * AES_BLOCK_SIZE
        } else {
            0
        };
        let mut buf: Vec<u8> = self.pending.drain(..release).collect();
        self.cipher.decrypt_blocks(&mut buf);
        Ok(buf)
    }

    /// Verify the tag, then release the remaining plaintext.
    ///
    /// The MAC is closed with the associated-data bit length and compared
    /// against the caller's tag in constant time. Only after that verdict
    /// is the held-back block decrypted and the padding inspected, so a
    /// forged message fails with [`CryptoError::AuthenticationFailed`] and
    /// never with a padding-shaped error.
    pub fn finalize(&mut self) -> Result<Vec<u8>, CryptoError> {
        if self.finalized {
            return Err(CryptoError::UsageError("finalize called twice"));
        }
        self.finalized = true;

        self.mac.update(&self.aad_bits);
        self.verify_tag()?;

        // Reachable only with a valid tag; a misaligned or empty message
        // cannot carry well-formed padding.
        if self.pending.is_empty() || self.pending.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidPadding);
        }
        let mut tail = std::mem::take(&mut self.pending);
        self.cipher.decrypt_blocks(&mut tail);
        let plaintext = padding::unpad(&tail)?.to_vec();
        tail.zeroize();
        Ok(plaintext)
    }

    /// Verify-before-decrypt one-shot over the whole ciphertext.
    ///
    /// Computes the entire MAC over `ciphertext` plus the length trailer
    /// and compares it against the tag before any CBC decryption or
    /// padding removal. On failure, no plaintext bytes, padding state, or
    /// partial decryption are exposed.
    pub fn transform(mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.streamed {
            return Err(CryptoError::UsageError(
                "one-shot transform after streaming updates",
            ));
        }

        self.mac.update(ciphertext);
        self.mac.update(&self.aad_bits);
        self.verify_tag()?;

        if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidPadding);
        }
        let mut buf = ciphertext.to_vec();
        self.cipher.decrypt_blocks(&mut buf);
        let plaintext = padding::unpad(&buf)?.to_vec();
        buf.zeroize();
        Ok(plaintext)
    }

    fn verify_tag(&mut self) -> Result<(), CryptoError> {
        let mut digest = self.mac.finalize();
        let ok: bool = digest[..self.tag.len()].ct_eq(&self.tag).into();
        digest.zeroize();
        if ok {
            Ok(())
        } else {
            Err(CryptoError::AuthenticationFailed)
        }
    }
}

impl fmt::Debug for Decryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decryptor")
            .field("streamed", &self.streamed)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}
