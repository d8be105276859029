//! AES-128 in CBC mode with PKCS#7 padding.

use crate::error::{Error, Result};
use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use md5::{Digest, Md5};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Encrypt `data`; the IV is not included in the output.
pub fn aes128_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|e| Error::Encryption(format!("AES-128 setup: {}", e)))?;
    let mut buffer = vec![0u8; data.len() + 16];
    buffer[..data.len()].copy_from_slice(data);
    let encrypted = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buffer, data.len())
        .map_err(|_| Error::Encryption("AES-128 buffer too small".to_string()))?;
    Ok(encrypted.to_vec())
}

/// Decrypt `data` produced by [`aes128_encrypt`].
pub fn aes128_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|e| Error::Encryption(format!("AES-128 setup: {}", e)))?;
    let mut buffer = data.to_vec();
    let decrypted = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| Error::Encryption("AES-128 padding check failed".to_string()))?;
    Ok(decrypted.to_vec())
}

/// Random IV from a v4 UUID mixed with the clock.
pub fn generate_iv() -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    hasher.update(now.as_nanos().to_le_bytes());
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&hasher.finalize());
    iv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = [3u8; 16];
        let iv = generate_iv();
        let cipher = aes128_encrypt(&key, &iv, b"exactly sixteen!").unwrap();
        assert_eq!(cipher.len(), 32);
        assert_eq!(aes128_decrypt(&key, &iv, &cipher).unwrap(), b"exactly sixteen!");
    }

    #[test]
    fn test_wrong_key_length() {
        assert!(aes128_encrypt(&[0u8; 5], &[0u8; 16], b"x").is_err());
    }

    #[test]
    fn test_bad_padding_detected() {
        let key = [3u8; 16];
        let iv = [0u8; 16];
        assert!(aes128_decrypt(&key, &iv, &[0u8; 15]).is_err());
    }
}
