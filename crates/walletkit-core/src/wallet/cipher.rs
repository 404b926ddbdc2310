/*
[INPUT]:  Mnemonic and private-key strings about to be written to disk
[OUTPUT]: Sealed strings (plaintext passthrough or AES-256-GCM hex blobs)
[POS]:    Wallet layer - at-rest protection applied by the file repository
[UPDATE]: When adding a new sealing scheme or changing the blob layout
*/

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

const NONCE_LEN: usize = 12;
pub const SALT_LEN: usize = 32;

/// Seals secret strings before they reach the wallet file
pub trait AtRestCipher: Send + Sync {
    /// Tag written alongside the sealed data
    fn name(&self) -> &'static str;

    fn encrypt(&self, plaintext: &str) -> Result<String>;

    fn decrypt(&self, sealed: &str) -> Result<Zeroizing<String>>;

    fn is_plaintext(&self) -> bool {
        false
    }

    /// KDF salt the file must carry for this cipher to open it
    fn salt(&self) -> Option<&[u8]> {
        None
    }
}

/// Stores secrets as-is
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextCipher;

impl AtRestCipher for PlaintextCipher {
    fn name(&self) -> &'static str {
        "plaintext"
    }

    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, sealed: &str) -> Result<Zeroizing<String>> {
        Ok(Zeroizing::new(sealed.to_string()))
    }

    fn is_plaintext(&self) -> bool {
        true
    }
}

/// AES-256-GCM keyed by Argon2id(passphrase, salt).
///
/// Blob layout: hex(nonce || ciphertext || tag), fresh random nonce per seal.
/// The salt is stored once per wallet file, not per blob.
pub struct AesGcmCipher {
    key: Zeroizing<[u8; 32]>,
    salt: [u8; SALT_LEN],
}

impl AesGcmCipher {
    /// Fresh random salt, for a wallet file that has none yet
    pub fn generate(passphrase: &str) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::derive(passphrase, &salt)
    }

    /// Re-derive the key for an existing file's salt
    pub fn derive(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LEN] = salt
            .try_into()
            .map_err(|_| WalletError::Storage(format!("kdf salt must be {SALT_LEN} bytes")))?;

        let params = Params::new(Params::DEFAULT_M_COST, Params::DEFAULT_T_COST, Params::DEFAULT_P_COST, Some(32))
            .map_err(|e| WalletError::Storage(format!("argon2 params: {e}")))?;
        let mut key = Zeroizing::new([0u8; 32]);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password_into(passphrase.as_bytes(), &salt, key.as_mut_slice())
            .map_err(|e| WalletError::Storage(format!("derive wallet key: {e}")))?;

        Ok(Self { key, salt })
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_slice())
            .map_err(|_| WalletError::Storage("init aes-gcm".to_string()))
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmCipher(..)")
    }
}

impl AtRestCipher for AesGcmCipher {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn salt(&self) -> Option<&[u8]> {
        Some(&self.salt)
    }

    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| WalletError::Storage("encrypt wallet secret".to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(hex::encode(combined))
    }

    fn decrypt(&self, sealed: &str) -> Result<Zeroizing<String>> {
        let data = hex::decode(sealed)
            .map_err(|e| WalletError::Storage(format!("sealed secret is not hex: {e}")))?;
        if data.len() <= NONCE_LEN {
            return Err(WalletError::Storage("sealed secret too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            self.cipher()?
                .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|_| WalletError::Storage("decrypt wallet secret (wrong passphrase?)".to_string()))?,
        );
        String::from_utf8(plaintext.to_vec())
            .map(Zeroizing::new)
            .map_err(|_| WalletError::Storage("decrypted secret is not utf-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [5u8; SALT_LEN];

    #[test]
    fn test_aes_gcm_encrypt_then_decrypt() {
        let cipher = AesGcmCipher::derive("correct horse", &SALT).unwrap();
        let sealed = cipher.encrypt("abandon about").unwrap();
        assert!(!sealed.contains("abandon"));
        assert_eq!(cipher.decrypt(&sealed).unwrap().as_str(), "abandon about");
    }

    #[test]
    fn test_aes_gcm_nonce_is_fresh() {
        let cipher = AesGcmCipher::derive("pw", &SALT).unwrap();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn test_same_salt_reopens() {
        let sealed = AesGcmCipher::derive("pw", &SALT).unwrap().encrypt("secret").unwrap();
        let reopened = AesGcmCipher::derive("pw", &SALT).unwrap();
        assert_eq!(reopened.decrypt(&sealed).unwrap().as_str(), "secret");
    }

    #[test]
    fn test_salt_changes_the_key() {
        let first = AesGcmCipher::generate("pw").unwrap();
        let second = AesGcmCipher::generate("pw").unwrap();
        assert_ne!(first.salt(), second.salt());
        assert_ne!(first.key.as_slice(), second.key.as_slice());

        let sealed = first.encrypt("secret").unwrap();
        assert!(matches!(second.decrypt(&sealed).unwrap_err(), WalletError::Storage(_)));
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let sealed = AesGcmCipher::derive("one", &SALT).unwrap().encrypt("secret").unwrap();
        let err = AesGcmCipher::derive("two", &SALT).unwrap().decrypt(&sealed).unwrap_err();
        assert!(matches!(err, WalletError::Storage(_)));
    }

    #[test]
    fn test_short_salt_rejected() {
        assert!(AesGcmCipher::derive("pw", &[1u8; 8]).is_err());
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let cipher = AesGcmCipher::derive("pw", &SALT).unwrap();
        assert!(cipher.decrypt("00ff").is_err());
        assert!(cipher.decrypt("not hex").is_err());
    }

    #[test]
    fn test_plaintext_passthrough() {
        let cipher = PlaintextCipher;
        assert!(cipher.is_plaintext());
        assert!(cipher.salt().is_none());
        assert_eq!(cipher.decrypt(&cipher.encrypt("x").unwrap()).unwrap().as_str(), "x");
    }
}
