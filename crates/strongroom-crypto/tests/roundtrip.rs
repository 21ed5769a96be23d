//! End-to-end properties of the composite AES-CBC + HMAC transforms:
//! round-trips across variants, the tamper matrix, and the
//! verify-before-release contract.

use strongroom_crypto::{generate_iv, CbcHmacAlgorithm, CryptoError, ALGORITHMS};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).unwrap();
    buf
}

fn encrypt(
    algorithm: CbcHmacAlgorithm,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    algorithm
        .create_encryptor(key, iv, aad)
        .unwrap()
        .transform(plaintext)
        .unwrap()
}

#[test]
fn round_trip_all_variants_various_sizes() {
    for &algorithm in ALGORITHMS {
        let key = random_bytes(algorithm.key_size_in_bytes());
        let iv = generate_iv();
        let aad = b"eyJhbGciOiJkaXIifQ";

        for len in [0, 1, 15, 16, 17, 255, 4096] {
            let plaintext = random_bytes(len);
            let (ciphertext, tag) = encrypt(algorithm, &key, &iv, aad, &plaintext);

            let dec = algorithm.create_decryptor(&key, &iv, aad, &tag).unwrap();
            assert_eq!(
                dec.transform(&ciphertext).unwrap(),
                plaintext,
                "{} with {len}-byte plaintext",
                algorithm.name()
            );
        }
    }
}

#[test]
fn streaming_and_one_shot_agree_on_large_input() {
    for &algorithm in ALGORITHMS {
        let key = random_bytes(algorithm.key_size_in_bytes());
        let iv = generate_iv();
        let plaintext = random_bytes(100 * 1024);

        let (one_shot, tag) = encrypt(algorithm, &key, &iv, &[], &plaintext);

        let mut enc = algorithm.create_encryptor(&key, &iv, &[]).unwrap();
        let mut streamed = Vec::new();
        for chunk in plaintext.chunks(1000) {
            streamed.extend(enc.update(chunk).unwrap());
        }
        let (tail, streamed_tag) = enc.finalize().unwrap();
        streamed.extend(tail);

        assert_eq!(hex::encode(&streamed), hex::encode(&one_shot));
        assert_eq!(hex::encode(&streamed_tag), hex::encode(&tag));

        let mut dec = algorithm.create_decryptor(&key, &iv, &[], &tag).unwrap();
        let mut recovered = Vec::new();
        for chunk in one_shot.chunks(777) {
            recovered.extend(dec.update(chunk).unwrap());
        }
        recovered.extend(dec.finalize().unwrap());
        assert_eq!(recovered, plaintext);
    }
}

#[test]
fn any_single_bit_flip_fails_authentication() {
    let algorithm = CbcHmacAlgorithm::Aes128CbcHmacSha256;
    let key = random_bytes(32);
    let iv = generate_iv();
    let aad = b"header";
    let plaintext = b"the quick brown fox";
    let (ciphertext, tag) = encrypt(algorithm, &key, &iv, aad, plaintext);

    // Ciphertext flips, every bit
    for byte in 0..ciphertext.len() {
        for bit in 0..8 {
            let mut corrupt = ciphertext.clone();
            corrupt[byte] ^= 1 << bit;
            let dec = algorithm.create_decryptor(&key, &iv, aad, &tag).unwrap();
            assert!(
                matches!(dec.transform(&corrupt), Err(CryptoError::AuthenticationFailed)),
                "ciphertext bit {bit} of byte {byte}"
            );
        }
    }

    // IV flips
    for byte in 0..iv.len() {
        let mut corrupt_iv = iv;
        corrupt_iv[byte] ^= 0x01;
        let dec = algorithm
            .create_decryptor(&key, &corrupt_iv, aad, &tag)
            .unwrap();
        assert!(matches!(
            dec.transform(&ciphertext),
            Err(CryptoError::AuthenticationFailed)
        ));
    }

    // AAD flip
    let dec = algorithm
        .create_decryptor(&key, &iv, b"hexder", &tag)
        .unwrap();
    assert!(matches!(
        dec.transform(&ciphertext),
        Err(CryptoError::AuthenticationFailed)
    ));

    // Tag flips, every byte
    for byte in 0..tag.len() {
        let mut corrupt_tag = tag.clone();
        corrupt_tag[byte] ^= 0x80;
        let dec = algorithm
            .create_decryptor(&key, &iv, aad, &corrupt_tag)
            .unwrap();
        assert!(matches!(
            dec.transform(&ciphertext),
            Err(CryptoError::AuthenticationFailed)
        ));
    }
}

#[test]
fn aad_presence_is_bound_both_ways() {
    let algorithm = CbcHmacAlgorithm::Aes256CbcHmacSha512;
    let key = random_bytes(64);
    let iv = generate_iv();

    let (ct_with, tag_with) = encrypt(algorithm, &key, &iv, b"bound", b"data");
    let dec = algorithm.create_decryptor(&key, &iv, &[], &tag_with).unwrap();
    assert!(dec.transform(&ct_with).is_err());

    let (ct_without, tag_without) = encrypt(algorithm, &key, &iv, &[], b"data");
    let dec = algorithm
        .create_decryptor(&key, &iv, b"bound", &tag_without)
        .unwrap();
    assert!(dec.transform(&ct_without).is_err());
}

#[test]
fn failed_one_shot_decrypt_returns_no_plaintext() {
    let algorithm = CbcHmacAlgorithm::Aes128CbcHmacSha256;
    let key = random_bytes(32);
    let iv = generate_iv();
    let (ciphertext, tag) = encrypt(algorithm, &key, &iv, &[], b"secret");

    let mut bad_tag = tag.clone();
    bad_tag[0] ^= 0xff;
    let dec = algorithm.create_decryptor(&key, &iv, &[], &bad_tag).unwrap();

    // The one-shot path yields Err and nothing else: no partial buffers,
    // no padding detail.
    let result = dec.transform(&ciphertext);
    assert!(matches!(result, Err(CryptoError::AuthenticationFailed)));
}

#[test]
fn zero_key_concrete_scenario() {
    // A128CBC-HS256, all-zero 32-byte key, all-zero IV, no AAD, "test".
    let algorithm = CbcHmacAlgorithm::from_name("A128CBC-HS256").unwrap();
    let key = [0u8; 32];
    let iv = [0u8; 16];

    let (ciphertext, tag) = encrypt(algorithm, &key, &iv, &[], b"test");
    assert_eq!(tag.len(), 16);
    assert_eq!(ciphertext.len(), 16);

    let dec = algorithm.create_decryptor(&key, &iv, &[], &tag).unwrap();
    assert_eq!(dec.transform(&ciphertext).unwrap(), b"test");

    let mut corrupt_tag = tag.clone();
    corrupt_tag[15] ^= 0x01;
    let dec = algorithm
        .create_decryptor(&key, &iv, &[], &corrupt_tag)
        .unwrap();
    assert!(matches!(
        dec.transform(&ciphertext),
        Err(CryptoError::AuthenticationFailed)
    ));
}

#[test]
fn cross_variant_same_inputs_different_tags() {
    let a128 = CbcHmacAlgorithm::Aes128CbcHmacSha256;
    let a256 = CbcHmacAlgorithm::Aes256CbcHmacSha512;
    let key128 = random_bytes(32);
    let key256 = random_bytes(64);
    let iv = generate_iv();
    let aad = b"shared header";
    let plaintext = b"same plaintext under both variants";

    let (ct128, tag128) = encrypt(a128, &key128, &iv, aad, plaintext);
    let (ct256, tag256) = encrypt(a256, &key256, &iv, aad, plaintext);

    assert_eq!(tag128.len(), 16);
    assert_eq!(tag256.len(), 32);

    let dec = a128.create_decryptor(&key128, &iv, aad, &tag128).unwrap();
    assert_eq!(dec.transform(&ct128).unwrap(), plaintext);
    let dec = a256.create_decryptor(&key256, &iv, aad, &tag256).unwrap();
    assert_eq!(dec.transform(&ct256).unwrap(), plaintext);
}

#[test]
fn variant_names_round_trip_as_wire_identifiers() {
    for &algorithm in ALGORITHMS {
        let name = algorithm.name();
        let resolved = CbcHmacAlgorithm::from_name(name).unwrap();
        assert_eq!(resolved, algorithm);

        // The persisted identifier fully determines key and tag sizes.
        let key = random_bytes(resolved.key_size_in_bytes());
        let iv = generate_iv();
        let (ciphertext, tag) = encrypt(resolved, &key, &iv, &[], b"payload");
        assert_eq!(tag.len(), resolved.tag_size_in_bytes());

        let dec = resolved.create_decryptor(&key, &iv, &[], &tag).unwrap();
        assert_eq!(dec.transform(&ciphertext).unwrap(), b"payload");
    }
}
