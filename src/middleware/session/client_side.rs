//! Cookie-carried session backend.
//!
//! # Responsibilities
//! - Encrypt the session mapping into one base64 blob (AES-GCM)
//! - Bind the expiry timestamp to the ciphertext as associated data
//! - Split the blob into cookie-sized chunks and clear stale chunks
//! - Reverse the process on load, degrading silently on any failure
//!
//! # Design Decisions
//! - A fresh random 12-byte nonce per write; nonces are never reused
//! - Tampering with the expiry invalidates the authentication tag, since
//!   the expiry travels as associated data
//! - Authentication or decoding failures yield an empty session; the
//!   client never learns why its cookie was rejected

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::aes::cipher::consts::U12;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, KeyInit, Nonce};

use async_trait::async_trait;
use http::HeaderMap;

use crate::connection::{Connection, SessionMap};
use crate::error::ConfigError;
use crate::middleware::session::{
    append_set_cookie, SessionBackend, SessionCookieConfig, SessionError,
};
use crate::observability::metrics;

type Aes192Gcm = AesGcm<Aes192, U12>;

const NONCE_SIZE: usize = 12;
const CHUNK_SIZE: usize = 4096 - 64;
const AAD_TAG: &[u8] = b"additional_authenticated_data=";

/// Configuration for [`ClientSideSessionBackend`].
#[derive(Debug, Clone)]
pub struct ClientSideSessionConfig {
    /// Encryption secret; must be 16, 24 or 32 bytes long.
    pub secret: Vec<u8>,
    pub cookie: SessionCookieConfig,
}

impl ClientSideSessionConfig {
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret,
            cookie: SessionCookieConfig::default(),
        }
    }
}

/// AES-GCM keyed by the configured secret length.
enum SessionCipher {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

impl std::fmt::Debug for SessionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            SessionCipher::Aes128(_) => "Aes128",
            SessionCipher::Aes192(_) => "Aes192",
            SessionCipher::Aes256(_) => "Aes256",
        };
        f.debug_tuple(variant).finish()
    }
}

impl SessionCipher {
    fn from_secret(secret: &[u8]) -> Result<Self, ConfigError> {
        let invalid = |_| ConfigError::InvalidSecretLength(secret.len());
        match secret.len() {
            16 => Ok(Self::Aes128(Box::new(
                Aes128Gcm::new_from_slice(secret).map_err(invalid)?,
            ))),
            24 => Ok(Self::Aes192(Box::new(
                Aes192Gcm::new_from_slice(secret).map_err(invalid)?,
            ))),
            32 => Ok(Self::Aes256(Box::new(
                Aes256Gcm::new_from_slice(secret).map_err(invalid)?,
            ))),
            other => Err(ConfigError::InvalidSecretLength(other)),
        }
    }

    fn encrypt(
        &self,
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::from_slice(nonce);
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        match self {
            Self::Aes128(cipher) => cipher.encrypt(nonce, payload),
            Self::Aes192(cipher) => cipher.encrypt(nonce, payload),
            Self::Aes256(cipher) => cipher.encrypt(nonce, payload),
        }
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, aes_gcm::Error> {
        let nonce = Nonce::from_slice(nonce);
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        match self {
            Self::Aes128(cipher) => cipher.decrypt(nonce, payload),
            Self::Aes192(cipher) => cipher.decrypt(nonce, payload),
            Self::Aes256(cipher) => cipher.decrypt(nonce, payload),
        }
    }
}

/// Expiry claim carried as associated data.
#[derive(Deserialize, serde::Serialize)]
struct AadClaims {
    expires_at: i64,
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Session backend storing the encrypted session in client cookies.
#[derive(Debug)]
pub struct ClientSideSessionBackend {
    config: ClientSideSessionConfig,
    cipher: SessionCipher,
    cookie_pattern: Regex,
}

impl ClientSideSessionBackend {
    /// Construct the backend, refusing invalid secrets and cookie config.
    pub fn new(config: ClientSideSessionConfig) -> Result<Self, ConfigError> {
        config.cookie.validate()?;
        let cipher = SessionCipher::from_secret(&config.secret)?;
        let cookie_pattern = Regex::new(&format!(
            "^{}(?:-\\d+)?$",
            regex::escape(&config.cookie.key)
        ))
        .map_err(|_| ConfigError::InvalidSessionKey)?;
        Ok(Self {
            config,
            cipher,
            cookie_pattern,
        })
    }

    pub fn config(&self) -> &ClientSideSessionConfig {
        &self.config
    }

    /// Serialize, encrypt, encode and chunk the session mapping.
    pub fn dump_data(&self, session: &SessionMap) -> Result<Vec<String>, SessionError> {
        let serialized = serde_json::to_vec(session)?;
        let aad = serde_json::to_vec(&AadClaims {
            expires_at: now_secs() + self.config.cookie.max_age as i64,
        })?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, &serialized, &aad)
            .map_err(|_| SessionError::Encrypt)?;

        let mut combined =
            Vec::with_capacity(NONCE_SIZE + ciphertext.len() + AAD_TAG.len() + aad.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        combined.extend_from_slice(AAD_TAG);
        combined.extend_from_slice(&aad);

        let encoded = BASE64.encode(combined);
        Ok(encoded
            .as_bytes()
            .chunks(CHUNK_SIZE)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect())
    }

    /// Decode and decrypt chunk values, in the order given by the caller.
    ///
    /// Any failure — malformed base64, missing associated data, expired
    /// session, authentication mismatch, bad payload — yields an empty
    /// session.
    pub fn load_data(&self, chunks: &[String]) -> SessionMap {
        let joined = chunks.concat();
        let Ok(decoded) = BASE64.decode(joined.as_bytes()) else {
            return SessionMap::new();
        };
        let Some(tag_index) = find_tag(&decoded, AAD_TAG) else {
            return SessionMap::new();
        };
        if tag_index < NONCE_SIZE {
            return SessionMap::new();
        }

        let aad = &decoded[tag_index + AAD_TAG.len()..];
        let Ok(claims) = serde_json::from_slice::<AadClaims>(aad) else {
            return SessionMap::new();
        };
        if claims.expires_at <= now_secs() {
            return SessionMap::new();
        }

        let nonce = &decoded[..NONCE_SIZE];
        let ciphertext = &decoded[NONCE_SIZE..tag_index];
        match self.cipher.decrypt(nonce, ciphertext, aad) {
            Ok(plaintext) => serde_json::from_slice(&plaintext).unwrap_or_default(),
            Err(_) => SessionMap::new(),
        }
    }

    /// Session cookie keys present on the connection, sorted
    /// lexicographically. Suffixes are compared as strings, so chunk 10
    /// orders before chunk 2; kept for wire compatibility with existing
    /// cookies.
    pub fn cookie_keys(&self, connection: &Connection) -> Vec<String> {
        let mut keys: Vec<String> = connection
            .cookies()
            .keys()
            .filter(|key| self.cookie_pattern.is_match(key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl SessionBackend for ClientSideSessionBackend {
    async fn load_from_connection(
        &self,
        connection: &Connection,
    ) -> Result<SessionMap, SessionError> {
        let keys = self.cookie_keys(connection);
        if keys.is_empty() {
            return Ok(SessionMap::new());
        }
        let chunks: Vec<String> = keys
            .iter()
            .filter_map(|key| connection.cookie(key))
            .map(str::to_string)
            .collect();
        metrics::record_session_load();
        Ok(self.load_data(&chunks))
    }

    async fn store_in_headers(
        &self,
        session: Option<&SessionMap>,
        headers: &mut HeaderMap,
        connection: &Connection,
    ) -> Result<(), SessionError> {
        let existing = self.cookie_keys(connection);
        let key = &self.config.cookie.key;

        let kept = match session.filter(|session| !session.is_empty()) {
            Some(session) => {
                let chunks = self.dump_data(session)?;
                for (index, chunk) in chunks.iter().enumerate() {
                    let cookie = self
                        .config
                        .cookie
                        .cookie(format!("{key}-{index}"), chunk.clone());
                    append_set_cookie(headers, &cookie)?;
                }
                metrics::record_session_store();
                chunks.len()
            }
            None => 0,
        };

        // Cookies with the same key are overwritten above; anything past
        // the new chunk count would linger and corrupt the next load.
        for stale in existing.iter().skip(kept) {
            append_set_cookie(headers, &self.config.cookie.clearing_cookie(stale.clone()))?;
            tracing::trace!(cookie = %stale, "cleared stale session cookie");
        }
        Ok(())
    }
}

fn find_tag(haystack: &[u8], tag: &[u8]) -> Option<usize> {
    haystack
        .windows(tag.len())
        .position(|window| window == tag)
}
