//! Key derivation for the standard security handler (revisions 3 and 4).
//!
//! - Algorithm 2: file encryption key from the user password
//! - Algorithm 3: owner password hash (`/O`)
//! - Algorithm 5: user password hash (`/U`)

use super::rc4::rc4_crypt;
use md5::{Digest, Md5};

/// Password padding string.
const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Pad or truncate a password to exactly 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

/// Hash `input` with MD5, then re-hash the first `key_length` bytes 50 times.
fn md5_stretched(input: &[u8], key_length: usize) -> Vec<u8> {
    let mut hash = Md5::digest(input).to_vec();
    for _ in 0..50 {
        hash = Md5::digest(&hash[..key_length]).to_vec();
    }
    hash.truncate(key_length);
    hash
}

/// RC4 `data` with `key`, then 19 more passes with the key XORed by 1..=19.
fn rc4_twenty_rounds(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut result = rc4_crypt(key, data);
    for round in 1..=19u8 {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        result = rc4_crypt(&round_key, &result);
    }
    result
}

/// Algorithm 2: compute the file encryption key.
///
/// Metadata is always encrypted, so the revision 4 `0xFFFFFFFF` step never
/// applies.
pub fn compute_encryption_key(
    password: &[u8],
    owner_hash: &[u8],
    permissions: i32,
    file_id: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    let key_length = key_length.min(16);
    let mut input = Vec::with_capacity(32 + owner_hash.len() + 4 + file_id.len());
    input.extend_from_slice(&pad_password(password));
    input.extend_from_slice(owner_hash);
    input.extend_from_slice(&permissions.to_le_bytes());
    input.extend_from_slice(file_id);

    if revision >= 3 {
        md5_stretched(&input, key_length)
    } else {
        Md5::digest(&input)[..key_length].to_vec()
    }
}

/// Algorithm 3: compute the `/O` value.
///
/// An empty owner password falls back to the user password.
pub fn compute_owner_hash(
    owner_password: &[u8],
    user_password: &[u8],
    revision: u32,
    key_length: usize,
) -> Vec<u8> {
    let password = if owner_password.is_empty() {
        user_password
    } else {
        owner_password
    };
    let key_length = key_length.min(16);
    let padded_user = pad_password(user_password);

    if revision >= 3 {
        let rc4_key = md5_stretched(&pad_password(password), key_length);
        rc4_twenty_rounds(&rc4_key, &padded_user)
    } else {
        let rc4_key = &Md5::digest(pad_password(password))[..key_length];
        rc4_crypt(rc4_key, &padded_user)
    }
}

/// Algorithm 5: compute the `/U` value for revisions 3 and 4.
///
/// The 16 hashed bytes are followed by 16 bytes of zero padding.
pub fn compute_user_hash(key: &[u8], file_id: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(PADDING);
    hasher.update(file_id);
    let seed = hasher.finalize();

    let mut hash = rc4_twenty_rounds(key, &seed);
    hash.resize(32, 0);
    hash
}
