//! Opaque identifiers for edit links.
//!
//! A token is `base64url(version || masked_id || tag)` without padding:
//! - `version` is a single byte, currently [`TOKEN_VERSION`];
//! - `masked_id` is the big-endian id XOR a mask derived from the secret;
//! - `tag` is the first [`TAG_LEN`] bytes of a keyed SHA-256 over the
//!   version and masked id.
//!
//! The mask only obfuscates. The tag is what makes corrupted or hand-made
//! tokens fail with [`CodecError::Checksum`] instead of decoding to some
//! unrelated id. Tokens use the URL-safe alphabet, so they need no escaping
//! in a path segment, and percent-encoding them is still lossless.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::model::ResourceId;

pub const TOKEN_VERSION: u8 = 1;
pub const TAG_LEN: usize = 4;
const ID_LEN: usize = 8;
const PAYLOAD_LEN: usize = 1 + ID_LEN + TAG_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("identifier token is empty")]
    Empty,
    #[error("identifier token is not valid base64url: {0}")]
    Alphabet(String),
    #[error("identifier token has {0} bytes, expected 13")]
    Length(usize),
    #[error("unsupported identifier token version {0}")]
    Version(u8),
    #[error("identifier token checksum mismatch")]
    Checksum,
    #[error("identifier token encodes id 0")]
    ZeroId,
}

#[derive(Clone)]
pub struct IdentifierCodec {
    key: [u8; 32],
}

impl fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierCodec").finish_non_exhaustive()
    }
}

impl IdentifierCodec {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    pub fn encode(&self, id: ResourceId) -> String {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = TOKEN_VERSION;
        let masked = self.apply_mask(id.get().to_be_bytes());
        payload[1..1 + ID_LEN].copy_from_slice(&masked);
        let tag = self.tag(&payload[..1 + ID_LEN]);
        payload[1 + ID_LEN..].copy_from_slice(&tag);
        URL_SAFE_NO_PAD.encode(payload)
    }

    /// Expects a token that has already been percent-decoded.
    pub fn decode(&self, token: &str) -> Result<ResourceId, CodecError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CodecError::Empty);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|e| CodecError::Alphabet(e.to_string()))?;
        if bytes.len() != PAYLOAD_LEN {
            return Err(CodecError::Length(bytes.len()));
        }
        if bytes[0] != TOKEN_VERSION {
            return Err(CodecError::Version(bytes[0]));
        }
        let expected = self.tag(&bytes[..1 + ID_LEN]);
        if bytes[1 + ID_LEN..] != expected {
            return Err(CodecError::Checksum);
        }

        let mut masked = [0u8; ID_LEN];
        masked.copy_from_slice(&bytes[1..1 + ID_LEN]);
        let raw = u64::from_be_bytes(self.apply_mask(masked));
        ResourceId::new(raw).ok_or(CodecError::ZeroId)
    }

    fn apply_mask(&self, mut bytes: [u8; ID_LEN]) -> [u8; ID_LEN] {
        let digest = Sha256::new()
            .chain_update(b"mask")
            .chain_update(self.key)
            .finalize();
        for (b, m) in bytes.iter_mut().zip(digest.iter()) {
            *b ^= m;
        }
        bytes
    }

    fn tag(&self, body: &[u8]) -> [u8; TAG_LEN] {
        let digest = Sha256::new()
            .chain_update(b"tag")
            .chain_update(self.key)
            .chain_update(body)
            .finalize();
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest[..TAG_LEN]);
        tag
    }
}
