//! # Opaque Identifier Codec
//!
//! Turns internal holder codes into URL-safe opaque tokens and back.
//! External callers only ever see tokens; the plaintext code never leaves
//! the gateway.
//!
//! ## Construction
//!
//! Deterministic authenticated encryption (SIV style):
//!
//! ```text
//! k_enc, k_nonce = HKDF-SHA256(master_key, info = "...enc" / "...nonce")
//! nonce          = HMAC-SHA256(k_nonce, plaintext)[..12]
//! token          = base64url_nopad(0x01 || nonce || ChaCha20-Poly1305(k_enc, nonce, plaintext))
//! ```
//!
//! Equal codes map to equal tokens, so tokens are stable links. Any change
//! to a token (or a token issued under another key) fails authentication
//! rather than decoding to some other code. On decode the synthetic nonce
//! is recomputed from the recovered plaintext and compared in constant time.
//!
//! ## Key Management
//!
//! One 32-byte master key per process, loaded at startup. Rotating it
//! invalidates every token issued before. Derived keys are zeroized on drop.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Length of the master key in bytes.
pub const KEY_LEN: usize = 32;

const ENVELOPE_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
/// Tokens longer than this are rejected before any decoding work.
const MAX_TOKEN_LEN: usize = 1024;

const INFO_ENC: &[u8] = b"bff-identifier-codec/v1/enc";
const INFO_NONCE: &[u8] = b"bff-identifier-codec/v1/nonce";

// -- Errors -------------------------------------------------------------------

/// The configured master key is unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("encryption key is not valid base64")]
    InvalidEncoding,
    #[error("encryption key must be 32 bytes, got {actual}")]
    InvalidLength { actual: usize },
    #[error("key derivation failed")]
    Derivation,
}

/// A plaintext could not be turned into a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("cannot encode an empty identifier")]
    Empty,
    #[error("identifier encryption failed")]
    Cipher,
}

/// A token could not be turned back into a plaintext.
///
/// Always a caller error: the token was not produced by this codec under
/// the current key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("unsupported token version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("token failed authentication")]
    Authentication,
}

// -- Codec --------------------------------------------------------------------

/// Reversible, keyed transform between holder codes and opaque tokens.
///
/// Cheap to clone; share one instance behind an `Arc` for the process.
#[derive(Clone)]
pub struct IdentifierCodec {
    enc_key: Zeroizing<[u8; KEY_LEN]>,
    nonce_key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for IdentifierCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierCodec")
            .field("enc_key", &"[REDACTED]")
            .field("nonce_key", &"[REDACTED]")
            .finish()
    }
}

impl IdentifierCodec {
    /// Build a codec from raw master key bytes.
    pub fn new(master_key: &[u8; KEY_LEN]) -> Result<Self, KeyError> {
        let hk = Hkdf::<Sha256>::new(None, master_key);
        Ok(Self {
            enc_key: expand(&hk, INFO_ENC)?,
            nonce_key: expand(&hk, INFO_NONCE)?,
        })
    }

    /// Build a codec from a standard-base64 master key (the form it takes
    /// in configuration).
    pub fn from_base64_key(encoded: &str) -> Result<Self, KeyError> {
        let raw = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| KeyError::InvalidEncoding)?,
        );
        let key: &[u8; KEY_LEN] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidLength { actual: raw.len() })?;
        Self::new(key)
    }

    /// Encode a holder code into an opaque token.
    pub fn encode(&self, plaintext: &str) -> Result<String, EncodeError> {
        if plaintext.is_empty() {
            return Err(EncodeError::Empty);
        }
        let nonce = self
            .synthetic_nonce(plaintext.as_bytes())
            .ok_or(EncodeError::Cipher)?;
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| EncodeError::Cipher)?;

        let mut envelope = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        envelope.push(ENVELOPE_VERSION);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(envelope))
    }

    /// Decode an opaque token back into the holder code it carries.
    pub fn decode(&self, token: &str) -> Result<String, DecodeError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(DecodeError::Malformed("token too long"));
        }
        let envelope = URL_SAFE_NO_PAD
            .decode(token.as_bytes())
            .map_err(|_| DecodeError::Malformed("not base64url"))?;
        // Version byte, nonce, tag and at least one plaintext byte.
        if envelope.len() < 1 + NONCE_LEN + TAG_LEN + 1 {
            return Err(DecodeError::Malformed("token too short"));
        }

        let (version, rest) = envelope
            .split_first()
            .ok_or(DecodeError::Malformed("token too short"))?;
        if *version != ENVELOPE_VERSION {
            return Err(DecodeError::UnsupportedVersion(*version));
        }
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let plaintext = Zeroizing::new(
            self.cipher()
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| DecodeError::Authentication)?,
        );

        let expected = self
            .synthetic_nonce(&plaintext)
            .ok_or(DecodeError::Authentication)?;
        if !bool::from(expected.as_slice().ct_eq(nonce)) {
            return Err(DecodeError::Authentication);
        }

        String::from_utf8(plaintext.to_vec()).map_err(|_| DecodeError::Malformed("not utf-8"))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(self.enc_key.as_slice()))
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> Option<[u8; NONCE_LEN]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.nonce_key.as_slice()).ok()?;
        mac.update(plaintext);
        let digest = mac.finalize().into_bytes();
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        Some(nonce)
    }
}

fn expand(hk: &Hkdf<Sha256>, info: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, KeyError> {
    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(info, okm.as_mut_slice())
        .map_err(|_| KeyError::Derivation)?;
    Ok(okm)
}
