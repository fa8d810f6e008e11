// crates/flood-alert-credentials/src/cipher.rs
// ============================================================================
// Module: Secret Cipher
// Description: AES-256-GCM sealing of credential secrets.
// Purpose: Keep secrets encrypted at rest with a locally generated key.
// Dependencies: ring, base64
// ============================================================================

//! ## Overview
//! The key file holds 32 random bytes, base64 encoded, and is created on
//! first use with owner-only permissions where the platform supports it.
//! Sealed values are `base64(nonce || ciphertext || tag)` with a fresh random
//! 96-bit nonce per seal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ring::aead::AES_256_GCM;
use ring::aead::Aad;
use ring::aead::LessSafeKey;
use ring::aead::NONCE_LEN;
use ring::aead::Nonce;
use ring::aead::UnboundKey;
use ring::rand::SecureRandom;
use ring::rand::SystemRandom;
use tracing::info;

use crate::CredentialStoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// AES-256 key length in bytes.
const KEY_LEN: usize = 32;

// ============================================================================
// SECTION: Cipher
// ============================================================================

/// Seals and opens secrets with a single AES-256-GCM key.
pub struct SecretCipher {
    /// AEAD key.
    key: LessSafeKey,
    /// Nonce source.
    rng: SystemRandom,
}

impl SecretCipher {
    /// Builds a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Crypto`] when the key length is wrong.
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self, CredentialStoreError> {
        if bytes.len() != KEY_LEN {
            return Err(CredentialStoreError::Crypto(format!(
                "key must be {KEY_LEN} bytes, found {}",
                bytes.len()
            )));
        }
        let unbound = UnboundKey::new(&AES_256_GCM, bytes)
            .map_err(|_| CredentialStoreError::Crypto("key rejected".to_string()))?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    /// Loads the key file, generating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError`] when the key file cannot be read,
    /// written, or decoded.
    pub fn load_or_create(path: &Path) -> Result<Self, CredentialStoreError> {
        if path.exists() {
            let text = fs::read_to_string(path)
                .map_err(|err| CredentialStoreError::Io(format!("{}: {err}", path.display())))?;
            let bytes = STANDARD.decode(text.trim()).map_err(|err| {
                CredentialStoreError::Corrupt(format!("key file {}: {err}", path.display()))
            })?;
            return Self::from_key_bytes(&bytes);
        }
        let rng = SystemRandom::new();
        let mut bytes = [0_u8; KEY_LEN];
        rng.fill(&mut bytes)
            .map_err(|_| CredentialStoreError::Crypto("key generation failed".to_string()))?;
        write_private_file(path, STANDARD.encode(bytes).as_bytes())?;
        info!(path = %path.display(), "generated credential key file");
        Self::from_key_bytes(&bytes)
    }

    /// Encrypts `plaintext`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Crypto`] when sealing fails.
    pub fn seal(&self, plaintext: &str) -> Result<String, CredentialStoreError> {
        let mut nonce_bytes = [0_u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CredentialStoreError::Crypto("nonce generation failed".to_string()))?;
        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CredentialStoreError::Crypto("encryption failed".to_string()))?;
        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&in_out);
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypts a value produced by [`SecretCipher::seal`].
    ///
    /// # Errors
    ///
    /// Returns [`CredentialStoreError::Crypto`] when the value was tampered
    /// with or sealed under another key.
    pub fn open(&self, sealed: &str) -> Result<String, CredentialStoreError> {
        let data = STANDARD
            .decode(sealed)
            .map_err(|err| CredentialStoreError::Corrupt(format!("sealed value: {err}")))?;
        if data.len() < NONCE_LEN {
            return Err(CredentialStoreError::Corrupt("sealed value too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CredentialStoreError::Corrupt("invalid nonce".to_string()))?;
        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CredentialStoreError::Crypto("decryption failed".to_string()))?;
        String::from_utf8(plaintext.to_vec())
            .map_err(|_| CredentialStoreError::Corrupt("secret is not utf-8".to_string()))
    }
}

/// Writes a file readable only by its owner where supported.
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<(), CredentialStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|err| CredentialStoreError::Io(format!("{}: {err}", parent.display())))?;
    }
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .map_err(|err| CredentialStoreError::Io(format!("{}: {err}", path.display())))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|err| CredentialStoreError::Io(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
