// Credential Vault
//
// Protects stored warehouse credentials with AES-256-GCM under an
// externally managed key. The key store is shared with whichever surface
// writes credentials; this core only reads them. If the two sides point
// at different key files or purpose labels, every decryption fails
// deterministically. That is a configuration contract, not something to
// retry around.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Purpose label, mixed into every seal as associated data. Changing it
/// invalidates all previously protected payloads.
const PURPOSE: &str = "inventa.sql-credentials.v1";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("username and password must both be non-empty")]
    EmptyField,

    #[error("key store at '{0}' does not hold a valid 256-bit key")]
    InvalidKey(String),

    #[error("failed to read key store: {0}")]
    KeyStore(#[from] std::io::Error),

    #[error(
        "failed to decrypt credential; the protection key may have been rotated \
         or the payload is corrupt"
    )]
    Decryption,

    #[error("failed to serialize credential: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A decrypted warehouse credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs and panics
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Envelope sealed inside each opaque payload
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    username: String,
    password: String,
    created_utc: DateTime<Utc>,
}

pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        }
    }

    /// Loads the shared key from a key store file: either 32 raw bytes or
    /// their base64 encoding.
    pub fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        let raw = std::fs::read(path)?;
        let key = decode_key(&raw)
            .ok_or_else(|| VaultError::InvalidKey(path.display().to_string()))?;
        Ok(Self::new(key))
    }

    /// Generates a fresh random key and persists it, for first start on a
    /// machine whose key store does not exist yet.
    pub fn create_key_file(path: &Path) -> Result<Self, VaultError> {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, BASE64.encode(key))?;
        Ok(Self::new(key))
    }

    /// Binds the pair plus a creation timestamp under the fixed purpose
    /// label and returns an opaque base64 string.
    pub fn protect(&self, username: &str, password: &str) -> Result<String, VaultError> {
        if username.is_empty() || password.is_empty() {
            return Err(VaultError::EmptyField);
        }

        let envelope = StoredCredential {
            username: username.to_string(),
            password: password.to_string(),
            created_utc: Utc::now(),
        };
        let plaintext = serde_json::to_vec(&envelope)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &plaintext,
                    aad: PURPOSE.as_bytes(),
                },
            )
            .map_err(|_| VaultError::Decryption)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Recovers the pair, or fails with [`VaultError::Decryption`]. Never
    /// returns partially decoded data: GCM authentication rejects the
    /// whole payload before any plaintext is released.
    pub fn unprotect(&self, opaque: &str) -> Result<Credential, VaultError> {
        let payload = BASE64
            .decode(opaque.trim())
            .map_err(|_| VaultError::Decryption)?;
        if payload.len() <= NONCE_LEN {
            return Err(VaultError::Decryption);
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: PURPOSE.as_bytes(),
                },
            )
            .map_err(|_| VaultError::Decryption)?;

        let envelope: StoredCredential =
            serde_json::from_slice(&plaintext).map_err(|_| VaultError::Decryption)?;
        if envelope.username.is_empty() || envelope.password.is_empty() {
            return Err(VaultError::Decryption);
        }

        Ok(Credential {
            username: envelope.username,
            password: envelope.password,
        })
    }

    /// Same decryption path as [`unprotect`](Self::unprotect), but
    /// swallows the error. For admin surfaces that only need a yes/no.
    pub fn try_validate(&self, opaque: &str) -> bool {
        self.unprotect(opaque).is_ok()
    }
}

fn decode_key(raw: &[u8]) -> Option<[u8; KEY_LEN]> {
    if raw.len() == KEY_LEN {
        return raw.try_into().ok();
    }
    let text = std::str::from_utf8(raw).ok()?;
    let decoded = BASE64.decode(text.trim()).ok()?;
    decoded.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_with_key(byte: u8) -> CredentialVault {
        CredentialVault::new([byte; KEY_LEN])
    }

    #[test]
    fn protect_unprotect_round_trip() {
        let vault = vault_with_key(1);
        let opaque = vault.protect("svc", "p@ss").unwrap();
        let credential = vault.unprotect(&opaque).unwrap();
        assert_eq!(credential.username, "svc");
        assert_eq!(credential.password, "p@ss");
    }

    #[test]
    fn payload_is_opaque() {
        let vault = vault_with_key(1);
        let opaque = vault.protect("svc", "p@ss").unwrap();
        assert!(!opaque.contains("svc"));
        assert!(!opaque.contains("p@ss"));
    }

    #[test]
    fn rotated_key_fails_decryption() {
        let old = vault_with_key(1);
        let new = vault_with_key(2);
        let opaque = old.protect("svc", "p@ss").unwrap();
        assert!(matches!(new.unprotect(&opaque), Err(VaultError::Decryption)));
        assert!(!new.try_validate(&opaque));
    }

    #[test]
    fn tampered_payload_fails_decryption() {
        let vault = vault_with_key(1);
        let opaque = vault.protect("svc", "p@ss").unwrap();
        let mut bytes = BASE64.decode(&opaque).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = BASE64.encode(bytes);
        assert!(matches!(
            vault.unprotect(&tampered),
            Err(VaultError::Decryption)
        ));
    }

    #[test]
    fn garbage_fails_decryption() {
        let vault = vault_with_key(1);
        assert!(matches!(
            vault.unprotect("not-base64!!"),
            Err(VaultError::Decryption)
        ));
        assert!(matches!(vault.unprotect(""), Err(VaultError::Decryption)));
        assert!(!vault.try_validate("AAAA"));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let vault = vault_with_key(1);
        assert!(matches!(vault.protect("", "p"), Err(VaultError::EmptyField)));
        assert!(matches!(vault.protect("u", ""), Err(VaultError::EmptyField)));
    }

    #[test]
    fn key_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("keys").join("credential.key");

        let writer = CredentialVault::create_key_file(&key_path).unwrap();
        let opaque = writer.protect("svc", "p@ss").unwrap();

        // A second process loading the same key store can decrypt
        let reader = CredentialVault::from_key_file(&key_path).unwrap();
        assert_eq!(reader.unprotect(&opaque).unwrap().username, "svc");
    }

    #[test]
    fn unrelated_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("bad.key");
        std::fs::write(&key_path, "too short").unwrap();
        assert!(matches!(
            CredentialVault::from_key_file(&key_path),
            Err(VaultError::InvalidKey(_))
        ));
    }
}
