/*
[INPUT]:  OS entropy or a user-supplied phrase, optional passphrase
[OUTPUT]: Validated BIP-39 mnemonics and 64-byte seeds
[POS]:    Crypto layer - root of the HD key tree
[UPDATE]: When supported word counts or seed derivation change
*/

use std::fmt;

use bip39::{Language, Mnemonic};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{Result, WalletError};

/// Supported phrase lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    /// 128-bit entropy
    Twelve,
    /// 256-bit entropy
    TwentyFour,
}

impl WordCount {
    pub const fn entropy_bytes(self) -> usize {
        match self {
            WordCount::Twelve => 16,
            WordCount::TwentyFour => 32,
        }
    }

    pub const fn words(self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::TwentyFour => 24,
        }
    }

    fn from_words(count: usize) -> Option<Self> {
        match count {
            12 => Some(WordCount::Twelve),
            24 => Some(WordCount::TwentyFour),
            _ => None,
        }
    }
}

/// A checksum-valid 12 or 24 word English mnemonic
#[derive(Clone, PartialEq, Eq)]
pub struct MnemonicPhrase {
    inner: Mnemonic,
}

impl MnemonicPhrase {
    pub fn word_count(&self) -> usize {
        self.inner.word_count()
    }

    /// Space-separated phrase. Handle with care: this is the wallet secret.
    pub fn phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.to_string())
    }
}

impl fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnemonicPhrase")
            .field("word_count", &self.word_count())
            .finish_non_exhaustive()
    }
}

/// 64-byte BIP-39 seed, regenerated on demand and never persisted
pub struct Seed(Zeroizing<[u8; 64]>);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// BIP-39 generation, validation and seeding
pub struct MnemonicService;

impl MnemonicService {
    /// Fresh 12-word mnemonic from 128 bits of OS entropy
    pub fn generate() -> Result<MnemonicPhrase> {
        Self::generate_with(WordCount::Twelve)
    }

    pub fn generate_with(count: WordCount) -> Result<MnemonicPhrase> {
        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut entropy[..count.entropy_bytes()]);
        let inner = Mnemonic::from_entropy_in(Language::English, &entropy[..count.entropy_bytes()])
            .map_err(|e| WalletError::InvalidMnemonic { reason: e.to_string() })?;
        Ok(MnemonicPhrase { inner })
    }

    /// True iff the candidate has 12 or 24 wordlist words and a valid checksum
    pub fn validate(candidate: &str) -> bool {
        Self::parse(candidate).is_ok()
    }

    /// Parse and validate, reporting why a candidate was rejected
    pub fn parse(candidate: &str) -> Result<MnemonicPhrase> {
        let normalized = normalize(candidate);
        let count = normalized.split(' ').filter(|w| !w.is_empty()).count();
        if WordCount::from_words(count).is_none() {
            return Err(WalletError::InvalidMnemonic {
                reason: format!("expected 12 or 24 words, got {count}"),
            });
        }

        let inner = Mnemonic::parse_in_normalized(Language::English, &normalized).map_err(|e| {
            WalletError::InvalidMnemonic {
                reason: describe(e),
            }
        })?;

        Ok(MnemonicPhrase { inner })
    }

    /// PBKDF2-HMAC-SHA512, 2048 rounds, salt `"mnemonic" + passphrase`
    pub fn to_seed(mnemonic: &MnemonicPhrase, passphrase: &str) -> Seed {
        Seed(Zeroizing::new(mnemonic.inner.to_seed(passphrase)))
    }
}

fn normalize(candidate: &str) -> Zeroizing<String> {
    let words: Vec<String> = candidate
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    Zeroizing::new(words.join(" "))
}

// Word positions are reported, never the words themselves.
fn describe(err: bip39::Error) -> String {
    match err {
        bip39::Error::UnknownWord(index) => format!("word #{} is not in the wordlist", index + 1),
        bip39::Error::InvalidChecksum => "checksum mismatch".to_string(),
        other => other.to_string(),
    }
}
