//! Protected output: the encryption dictionary and per-object ciphers.
//!
//! Reading protected files is not supported, so these tests derive the key
//! from the written `/ID` and decrypt objects by hand.

use pdf_engine::encryption::Protection;
use pdf_engine::{
    CompressionLevel, Document, DocumentConfig, DocumentInfo, EncryptionAlgorithm, Object, ObjectRef, Permissions,
    ProtectionConfig, RawDocument,
};

fn protected(protection: ProtectionConfig) -> (ProtectionConfig, RawDocument) {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = DocumentConfig::new()
        .with_compression(CompressionLevel::None)
        .with_info(DocumentInfo::new().title("Secret plans"))
        .with_protection(protection.clone());
    let mut doc = Document::new(config).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", 12.0).unwrap();
    doc.text(72.0, 72.0, "Confidential").unwrap();
    (protection, RawDocument::parse(&doc.to_bytes().unwrap()).unwrap())
}

/// Rebuild the cipher context the writer used.
fn protection_of(config: &ProtectionConfig, raw: &RawDocument) -> Protection {
    let id = raw.trailer().get("ID").and_then(Object::as_array).unwrap();
    let first = id[0].as_string().unwrap();
    Protection::new(config, first)
}

fn encrypt_dict(raw: &RawDocument) -> pdf_engine::Dictionary {
    let r = raw.trailer().get("Encrypt").and_then(Object::as_reference).unwrap();
    raw.dictionary(r.id).unwrap().clone()
}

fn content_ref(raw: &RawDocument) -> ObjectRef {
    let page = raw.page(0).unwrap();
    raw.get_key(page.object.id, "Contents").unwrap().as_reference().unwrap()
}

mod dictionary {
    use super::*;

    #[test]
    fn test_rc4_fields() {
        let config = ProtectionConfig::new("user", "owner").with_algorithm(EncryptionAlgorithm::Rc4_128);
        let (_, raw) = protected(config);
        assert!(raw.is_encrypted());

        let encrypt = encrypt_dict(&raw);
        assert_eq!(encrypt.get("Filter").and_then(Object::as_name), Some("Standard"));
        assert_eq!(encrypt.get("V").and_then(Object::as_integer), Some(2));
        assert_eq!(encrypt.get("R").and_then(Object::as_integer), Some(3));
        assert_eq!(encrypt.get("O").and_then(Object::as_string).map(<[u8]>::len), Some(32));
        assert_eq!(encrypt.get("U").and_then(Object::as_string).map(<[u8]>::len), Some(32));
    }

    #[test]
    fn test_aes_crypt_filter() {
        let config = ProtectionConfig::new("user", "owner").with_algorithm(EncryptionAlgorithm::Aes128);
        let (_, raw) = protected(config);
        let encrypt = encrypt_dict(&raw);
        assert_eq!(encrypt.get("V").and_then(Object::as_integer), Some(4));
        assert_eq!(encrypt.get("R").and_then(Object::as_integer), Some(4));
        assert_eq!(encrypt.get("StmF").and_then(Object::as_name), Some("StdCF"));
        assert_eq!(encrypt.get("StrF").and_then(Object::as_name), Some("StdCF"));
    }

    #[test]
    fn test_permissions_mask() {
        let permissions = Permissions::PRINT | Permissions::COPY;
        let config = ProtectionConfig::new("", "owner").with_permissions(permissions);
        let (_, raw) = protected(config);
        let p = encrypt_dict(&raw).get("P").and_then(Object::as_integer).unwrap();
        assert_eq!(p, permissions.p_value() as i64);
        assert!(p < 0);
    }
}

mod ciphers {
    use super::*;

    fn assert_content_decrypts(algorithm: EncryptionAlgorithm) {
        let config = ProtectionConfig::new("user", "owner").with_algorithm(algorithm);
        let (config, raw) = protected(config);
        let protection = protection_of(&config, &raw);

        let r = content_ref(&raw);
        let stored = raw.stream_data(r.id).unwrap();
        assert!(!stored.windows(12).any(|w| w == b"Confidential"));

        let plain = protection.decrypt(&stored, r).unwrap();
        let text = String::from_utf8(plain).unwrap();
        assert!(text.contains("(Confidential) Tj"));
    }

    #[test]
    fn test_rc4_content() {
        assert_content_decrypts(EncryptionAlgorithm::Rc4_128);
    }

    #[test]
    fn test_aes_content() {
        assert_content_decrypts(EncryptionAlgorithm::Aes128);
    }

    #[test]
    fn test_info_strings_encrypted() {
        let (config, raw) = protected(ProtectionConfig::new("", "owner"));
        let protection = protection_of(&config, &raw);

        let info = raw.trailer().get("Info").and_then(Object::as_reference).unwrap();
        let title = raw.get_key(info.id, "Title").unwrap().as_string().unwrap();
        assert_ne!(title, b"Secret plans");
        assert_eq!(protection.decrypt(title, info).unwrap(), b"Secret plans");
    }

    #[test]
    fn test_search_sees_ciphertext_only() {
        let (_, raw) = protected(ProtectionConfig::new("user", "owner"));
        assert!(raw.search("Confidential", false).is_empty());
    }
}
