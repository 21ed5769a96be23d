/// AES block size in bytes (128 bits, every variant).
pub const AES_BLOCK_SIZE: usize = 16;

/// CBC initialization vector length in bytes (one AES block).
pub const AES_CBC_IV_LENGTH: usize = 16;

/// Length in bytes of the associated-data bit-length trailer: a u64,
/// big-endian, appended as the final MAC input block.
pub const AAD_BITS_LENGTH: usize = 8;
