//! Password protection for written documents.
//!
//! Implements the standard security handler for two revisions:
//! - RC4 with a 128-bit key (V=2, R=3)
//! - AES-128 in CBC mode (V=4, R=4, crypt filter `/StdCF` with `/AESV2`)
//!
//! A [`Protection`] context is derived once per save from the configured
//! passwords, permission mask, and file identifier. The serializer asks it to
//! encrypt every string and stream with a key derived from the owning
//! object's number and generation.

mod aes;
mod algorithms;
mod rc4;

pub use algorithms::{compute_encryption_key, compute_owner_hash, compute_user_hash, pad_password};

use crate::config::ProtectionConfig;
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef, dict, name};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Cipher used for strings and streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    /// RC4, 128-bit key (revision 3)
    Rc4_128,
    /// AES-128 CBC (revision 4)
    Aes128,
}

impl EncryptionAlgorithm {
    /// Key length in bytes.
    pub fn key_length(self) -> usize {
        16
    }

    /// `/V` and `/R` values for the encryption dictionary.
    pub fn version_revision(self) -> (i64, u32) {
        match self {
            EncryptionAlgorithm::Rc4_128 => (2, 3),
            EncryptionAlgorithm::Aes128 => (4, 4),
        }
    }

    /// Whether this is an AES cipher.
    pub fn is_aes(self) -> bool {
        matches!(self, EncryptionAlgorithm::Aes128)
    }
}

bitflags::bitflags! {
    /// User access permissions (`/P`).
    ///
    /// Bit positions follow the standard security handler; reserved bits are
    /// added when the value is written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Permissions: u32 {
        /// Print the document
        const PRINT = 1 << 2;
        /// Modify contents
        const MODIFY = 1 << 3;
        /// Copy or extract text and graphics
        const COPY = 1 << 4;
        /// Add or modify annotations and fill forms
        const ANNOTATE = 1 << 5;
        /// Fill in form fields
        const FILL_FORMS = 1 << 8;
        /// Extract for accessibility
        const EXTRACT_ACCESSIBILITY = 1 << 9;
        /// Insert, rotate, or delete pages
        const ASSEMBLE = 1 << 10;
        /// Print at full quality
        const PRINT_HIGH_QUALITY = 1 << 11;
    }
}

impl Permissions {
    /// Signed `/P` value with the reserved bits set.
    pub fn p_value(self) -> i32 {
        (self.bits() | 0xFFFF_F0C0) as i32
    }
}

/// Active protection context threaded through serialization.
#[derive(Debug, Clone)]
pub struct Protection {
    algorithm: EncryptionAlgorithm,
    key: Vec<u8>,
    owner_hash: Vec<u8>,
    user_hash: Vec<u8>,
    permissions: i32,
    file_id: Vec<u8>,
}

impl Protection {
    /// Derive the context from the configuration and the file identifier.
    pub fn new(config: &ProtectionConfig, file_id: &[u8]) -> Self {
        let algorithm = config.algorithm;
        let (_, revision) = algorithm.version_revision();
        let key_length = algorithm.key_length();
        let permissions = config.permissions.p_value();

        let owner_hash = compute_owner_hash(
            config.owner_password.as_bytes(),
            config.user_password.as_bytes(),
            revision,
            key_length,
        );
        let key = compute_encryption_key(
            config.user_password.as_bytes(),
            &owner_hash,
            permissions,
            file_id,
            revision,
            key_length,
        );
        let user_hash = compute_user_hash(&key, file_id);

        log::debug!("Protection derived: {:?}, P={}", algorithm, permissions);

        Self {
            algorithm,
            key,
            owner_hash,
            user_hash,
            permissions,
            file_id: file_id.to_vec(),
        }
    }

    /// The cipher in use.
    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// The file identifier the key was derived with.
    pub fn file_id(&self) -> &[u8] {
        &self.file_id
    }

    /// Per-object key: MD5(file key, low 3 bytes of the object number, low 2
    /// bytes of the generation, and "sAlT" for AES), truncated to
    /// `min(n + 5, 16)` bytes.
    pub fn object_key(&self, obj: ObjectRef) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(&self.key);
        hasher.update(&obj.id.to_le_bytes()[..3]);
        hasher.update(obj.gen.to_le_bytes());
        if self.algorithm.is_aes() {
            hasher.update(b"sAlT");
        }
        let hash = hasher.finalize();
        let length = (self.key.len() + 5).min(16);
        hash[..length].to_vec()
    }

    /// Encrypt string or stream bytes belonging to `obj`.
    ///
    /// AES output carries its random IV as the first 16 bytes.
    pub fn encrypt(&self, data: &[u8], obj: ObjectRef) -> Result<Vec<u8>> {
        let key = self.object_key(obj);
        match self.algorithm {
            EncryptionAlgorithm::Rc4_128 => Ok(rc4::rc4_crypt(&key, data)),
            EncryptionAlgorithm::Aes128 => {
                let iv = aes::generate_iv();
                let mut out = iv.to_vec();
                out.extend(aes::aes128_encrypt(&key, &iv, data)?);
                Ok(out)
            },
        }
    }

    /// Reverse of [`Protection::encrypt`].
    pub fn decrypt(&self, data: &[u8], obj: ObjectRef) -> Result<Vec<u8>> {
        let key = self.object_key(obj);
        match self.algorithm {
            EncryptionAlgorithm::Rc4_128 => Ok(rc4::rc4_crypt(&key, data)),
            EncryptionAlgorithm::Aes128 => {
                if data.len() < 16 {
                    return Err(Error::Encryption("AES data shorter than its IV".to_string()));
                }
                aes::aes128_decrypt(&key, &data[..16], &data[16..])
            },
        }
    }

    /// Whether `password` opens the document as a user.
    pub fn authenticate_user(&self, password: &str) -> bool {
        let (_, revision) = self.algorithm.version_revision();
        let key = compute_encryption_key(
            password.as_bytes(),
            &self.owner_hash,
            self.permissions,
            &self.file_id,
            revision,
            self.algorithm.key_length(),
        );
        compute_user_hash(&key, &self.file_id)[..16] == self.user_hash[..16]
    }

    /// The `/Encrypt` dictionary describing this context.
    pub fn encrypt_dictionary(&self) -> Object {
        let (version, revision) = self.algorithm.version_revision();
        let mut entries: Dictionary = dict([
            ("Filter", name("Standard")),
            ("V", Object::Integer(version)),
            ("R", Object::Integer(revision as i64)),
            ("Length", Object::Integer(self.algorithm.key_length() as i64 * 8)),
            ("O", Object::String(self.owner_hash.clone())),
            ("U", Object::String(self.user_hash.clone())),
            ("P", Object::Integer(self.permissions as i64)),
        ]);

        if self.algorithm.is_aes() {
            let std_cf = Object::Dictionary(dict([
                ("CFM", name("AESV2")),
                ("AuthEvent", name("DocOpen")),
                ("Length", Object::Integer(16)),
            ]));
            entries.insert("CF".into(), Object::Dictionary(dict([("StdCF", std_cf)])));
            entries.insert("StmF".into(), name("StdCF"));
            entries.insert("StrF".into(), name("StdCF"));
        }

        Object::Dictionary(entries)
    }
}

/// A fresh 16-byte file identifier (MD5 of a random UUID and the clock).
pub fn generate_file_id() -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    hasher.update(now.as_nanos().to_le_bytes());
    hasher.finalize().to_vec()
}
