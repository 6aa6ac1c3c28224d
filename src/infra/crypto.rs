use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};

use crate::domain::ports::{EncryptedValue, PiiCodec};
use crate::error::AppError;

/// AES-256-GCM field encryption. Ciphertext is base64 with the 16-byte
/// auth tag appended; the 12-byte IV travels separately, also base64.
pub struct AesGcmCodec {
    cipher: Aes256Gcm,
}

impl AesGcmCodec {
    pub fn new(key_base64: &str) -> Result<Self, String> {
        let key_bytes = general_purpose::STANDARD
            .decode(key_base64)
            .map_err(|_| "ENCRYPTION_KEY must be valid base64".to_string())?;
        if key_bytes.len() != 32 {
            return Err("ENCRYPTION_KEY must be a base64 encoded 32 byte key".to_string());
        }
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self { cipher: Aes256Gcm::new(key) })
    }
}

impl PiiCodec for AesGcmCodec {
    fn encrypt(&self, plaintext: &str) -> Result<EncryptedValue, AppError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| AppError::InternalWithMsg("PII encryption failed".into()))?;
        Ok(EncryptedValue {
            value: general_purpose::STANDARD.encode(ciphertext),
            iv: general_purpose::STANDARD.encode(nonce),
        })
    }

    fn decrypt(&self, value: &str, iv: &str) -> Result<String, AppError> {
        let ciphertext = general_purpose::STANDARD
            .decode(value)
            .map_err(|_| AppError::InternalWithMsg("Corrupt PII ciphertext".into()))?;
        let iv_bytes = general_purpose::STANDARD
            .decode(iv)
            .map_err(|_| AppError::InternalWithMsg("Corrupt PII IV".into()))?;
        if iv_bytes.len() != 12 {
            return Err(AppError::InternalWithMsg("Corrupt PII IV".into()));
        }
        let nonce = Nonce::from_slice(&iv_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| AppError::InternalWithMsg("PII decryption failed".into()))?;
        String::from_utf8(plaintext)
            .map_err(|_| AppError::InternalWithMsg("PII plaintext is not UTF-8".into()))
    }
}
