//! The batch code value type and its random generator.

use core::str::FromStr;

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use skuhub_core::{DomainError, DomainResult};

/// Total length of a batch code: 3-char category prefix, dash, 3-char suffix.
pub const BATCH_CODE_LEN: usize = 7;

const PREFIX_LEN: usize = 3;
const SUFFIX_LEN: usize = 3;

/// Base36 alphabet the random suffix is drawn from.
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of distinct suffixes per category prefix (36^3).
pub const SUFFIX_COMBINATIONS: u32 = 36 * 36 * 36;

/// A batch code such as `SHO-4K7`.
///
/// The prefix is the owning category's code; the suffix is random. Codes are
/// immutable once assigned to an inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchCode(String);

impl BatchCode {
    /// Draw a fresh code under `prefix`.
    ///
    /// The `CryptoRng` bound keeps deterministic generators out of
    /// production call sites; codes are externally visible and must not be
    /// predictable.
    pub fn generate<R: Rng + CryptoRng>(prefix: &str, rng: &mut R) -> DomainResult<Self> {
        let prefix = validate_prefix(prefix)?;
        let mut code = String::with_capacity(BATCH_CODE_LEN);
        code.push_str(&prefix);
        code.push('-');
        for _ in 0..SUFFIX_LEN {
            code.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category prefix of the code.
    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    /// Random suffix of the code.
    pub fn suffix(&self) -> &str {
        &self.0[PREFIX_LEN + 1..]
    }
}

fn validate_prefix(prefix: &str) -> DomainResult<String> {
    if prefix.len() != PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation(format!(
            "batch code prefix must be exactly {PREFIX_LEN} ASCII letters or digits, got {prefix:?}"
        )));
    }
    Ok(prefix.to_ascii_uppercase())
}

impl FromStr for BatchCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            DomainError::validation(format!(
                "batch code must look like XXX-YYY (base36 uppercase), got {s:?}"
            ))
        };
        if s.len() != BATCH_CODE_LEN {
            return Err(malformed());
        }
        let (prefix, rest) = s.split_at(PREFIX_LEN);
        let suffix = rest.strip_prefix('-').ok_or_else(malformed)?;
        let valid_part = |part: &str| {
            part.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        };
        if !valid_part(prefix) || !valid_part(suffix) {
            return Err(malformed());
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for BatchCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BatchCode> for String {
    fn from(code: BatchCode) -> Self {
        code.0
    }
}

impl core::fmt::Display for BatchCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
