// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secret envelope: AES-256-GCM encryption of wallet secrets at rest.
//!
//! The envelope string is three base64 segments joined by `.`:
//! `nonce.tag.ciphertext`. Each encryption draws a fresh 96-bit random
//! nonce, so encrypting the same plaintext twice never yields the same
//! envelope. Decryption fails closed: a tampered or malformed envelope
//! returns an error and no partial plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64ct::{Base64, Encoding};
use rand::RngCore;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SEGMENT_DELIMITER: char = '.';

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("encryption failed")]
    EncryptFailed,

    /// Authentication failure or corrupted ciphertext. Deliberately carries
    /// no detail.
    #[error("decryption failed")]
    DecryptFailed,

    #[error("malformed envelope: {0}")]
    Malformed(String),
}

/// Symmetric envelope over arbitrary secret strings.
///
/// Holds the process-wide 256-bit key, validated at startup by
/// [`crate::config::parse_envelope_key`]. This type is a pure transform: it
/// never stores keys or ciphertexts itself.
#[derive(Clone)]
pub struct SecretEnvelope {
    key: Key<Aes256Gcm>,
}

impl std::fmt::Debug for SecretEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEnvelope").finish_non_exhaustive()
    }
}

impl SecretEnvelope {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key: key.into() }
    }

    /// Encrypt a secret for storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EnvelopeError> {
        let cipher = Aes256Gcm::new(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // AEAD output is ciphertext with the 16-byte tag appended.
        let sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| EnvelopeError::EncryptFailed)?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}{SEGMENT_DELIMITER}{}{SEGMENT_DELIMITER}{}",
            Base64::encode_string(&nonce_bytes),
            Base64::encode_string(tag),
            Base64::encode_string(ciphertext),
        ))
    }

    /// Decrypt a stored envelope back to the original secret.
    pub fn decrypt(&self, envelope: &str) -> Result<String, EnvelopeError> {
        let segments: Vec<&str> = envelope.split(SEGMENT_DELIMITER).collect();
        let [nonce_b64, tag_b64, ciphertext_b64] = segments.as_slice() else {
            return Err(EnvelopeError::Malformed(format!(
                "expected 3 segments, got {}",
                segments.len()
            )));
        };

        let nonce_bytes = decode_segment(nonce_b64, "nonce")?;
        let tag = decode_segment(tag_b64, "tag")?;
        let ciphertext = decode_segment(ciphertext_b64, "ciphertext")?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce_bytes.len()
            )));
        }
        if tag.len() != TAG_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "tag must be {TAG_LEN} bytes, got {}",
                tag.len()
            )));
        }

        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(nonce, sealed.as_slice())
            .map_err(|_| EnvelopeError::DecryptFailed)?;

        String::from_utf8(plaintext).map_err(|_| EnvelopeError::DecryptFailed)
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>, EnvelopeError> {
    Base64::decode_vec(segment)
        .map_err(|_| EnvelopeError::Malformed(format!("{name} segment is not valid base64")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    fn envelope() -> SecretEnvelope {
        SecretEnvelope::new([0x42; 32])
    }

    #[test]
    fn roundtrip_preserves_plaintext() {
        let env = envelope();
        let large: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10 * 1024)
            .map(char::from)
            .collect();

        for secret in ["", "a", "über straße 😀 памятка", large.as_str()] {
            let sealed = env.encrypt(secret).unwrap();
            assert_eq!(env.decrypt(&sealed).unwrap(), secret);
        }
    }

    #[test]
    fn same_plaintext_never_produces_same_envelope() {
        let env = envelope();
        let a = env.encrypt("twelve words of mnemonic material").unwrap();
        let b = env.encrypt("twelve words of mnemonic material").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn envelope_has_three_base64_segments() {
        let sealed = envelope().encrypt("secret").unwrap();
        let segments: Vec<&str> = sealed.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(Base64::decode_vec(segments[0]).unwrap().len(), NONCE_LEN);
        assert_eq!(Base64::decode_vec(segments[1]).unwrap().len(), TAG_LEN);
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let env = envelope();
        let sealed = env.encrypt("do not touch").unwrap();

        let mut segments: Vec<String> = sealed.split('.').map(str::to_string).collect();
        let mut ct = Base64::decode_vec(&segments[2]).unwrap();
        ct[0] ^= 0xFF;
        segments[2] = Base64::encode_string(&ct);

        let result = env.decrypt(&segments.join("."));
        assert!(matches!(result, Err(EnvelopeError::DecryptFailed)));
    }

    #[test]
    fn tampered_tag_fails_closed() {
        let env = envelope();
        let sealed = env.encrypt("do not touch").unwrap();

        let mut segments: Vec<String> = sealed.split('.').map(str::to_string).collect();
        let mut tag = Base64::decode_vec(&segments[1]).unwrap();
        tag[3] ^= 0x01;
        segments[1] = Base64::encode_string(&tag);

        assert!(env.decrypt(&segments.join(".")).is_err());
    }

    #[test]
    fn wrong_key_fails_closed() {
        let sealed = envelope().encrypt("secret").unwrap();
        let other = SecretEnvelope::new([0x43; 32]);
        assert!(matches!(
            other.decrypt(&sealed),
            Err(EnvelopeError::DecryptFailed)
        ));
    }

    #[test]
    fn malformed_envelopes_are_rejected() {
        let env = envelope();
        for bad in ["", "only-one", "two.segments", "a.b.c.d", "!!!.###.$$$"] {
            assert!(
                matches!(env.decrypt(bad), Err(EnvelopeError::Malformed(_))),
                "expected malformed error for {bad:?}"
            );
        }
    }
}
