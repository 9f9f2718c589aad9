//! # Piece Digests
//!
//! Manifests list pieces by content digest in URL-safe, unpadded base64.
//! Storage paths use the lowercase hex form, sharded by its first two
//! characters. [`to_hex`] is the canonical conversion; [`PieceDigest`]
//! carries the validated hex form through the fetch path.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::DigestError;

/// Convert a URL-safe base64 digest into lowercase hex.
///
/// `-`/`_` are translated to `+`/`/`, the text is right-padded with `=` to
/// a multiple of four, decoded with the standard alphabet, and rendered as
/// hex.
pub fn to_hex(digest: &str) -> Result<String, DigestError> {
    let bytes = decode_base64url(digest)?;
    Ok(encode_hex(&bytes))
}

/// Convert a hex digest back into URL-safe, unpadded base64.
pub fn from_hex(hex: &str) -> Result<String, DigestError> {
    let bytes = decode_hex(hex)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_base64url(digest: &str) -> Result<Vec<u8>, DigestError> {
    let trimmed = digest.trim();
    if trimmed.is_empty() {
        return Err(DigestError::Empty);
    }

    let mut standard: String = trimmed
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    STANDARD
        .decode(standard.as_bytes())
        .map_err(|source| DigestError::Base64 {
            digest: trimmed.to_string(),
            source,
        })
}

/// Encode bytes as lowercase hex string.
fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode hex string to bytes. Returns error if invalid.
fn decode_hex(hex: &str) -> Result<Vec<u8>, DigestError> {
    let hex = hex.trim();
    if hex.is_empty() {
        return Err(DigestError::Empty);
    }
    if hex.len() % 2 != 0 {
        return Err(DigestError::OddLength(hex.len()));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DigestError::InvalidHex(hex.to_string()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| DigestError::InvalidHex(hex.to_string()))
        })
        .collect()
}

/// A piece digest in its normalised lowercase hex form.
///
/// The inner string is non-empty and of even length, so [`shard`](Self::shard)
/// always has two characters to return.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PieceDigest(String);

impl PieceDigest {
    /// Parse a digest as listed in a manifest (URL-safe base64).
    pub fn from_base64url(digest: &str) -> Result<Self, DigestError> {
        to_hex(digest).map(Self)
    }

    /// Parse a digest already in hex form. Upper-case input is normalised.
    pub fn from_hex(hex: &str) -> Result<Self, DigestError> {
        let bytes = decode_hex(hex)?;
        Ok(Self(encode_hex(&bytes)))
    }

    /// The lowercase hex form.
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// Shard directory name: the first two hex characters.
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }

    /// The manifest form (URL-safe, unpadded base64).
    pub fn to_base64url(&self) -> String {
        // The inner string is validated hex, so decoding cannot fail.
        let bytes = decode_hex(&self.0).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

impl std::fmt::Display for PieceDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PieceDigest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PieceDigest> for String {
    fn from(digest: PieceDigest) -> Self {
        digest.0
    }
}
