use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::error::{KeyGenError, KeyImportError};

pub const DEFAULT_MODULUS_BITS: usize = 2048;
const MIN_MODULUS_BITS: usize = 1024;
const MAX_MODULUS_BITS: usize = 8192;

const PUBLIC_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PUBLIC_END: &str = "-----END PUBLIC KEY-----";

/// A private key together with its public half. Built only by generation or
/// import, so the two halves are never out of step.
#[derive(Clone)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    fn from_private(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("fingerprint", &IdentityManager::fingerprint(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Creates and (de)serializes RSA key material for signing with SHA-256.
#[derive(Debug, Clone)]
pub struct IdentityManager {
    op_timeout: Duration,
}

impl IdentityManager {
    pub fn new(op_timeout: Duration) -> Self {
        Self { op_timeout }
    }

    /// Generate an RSA key pair with public exponent 65537.
    ///
    /// The work runs on the blocking pool. Failure, including running past the
    /// configured timeout, is returned to the caller. A timed out generation is
    /// not cancelled: the blocking task runs to completion and its key is
    /// discarded.
    pub async fn generate_key_pair(&self, modulus_bits: usize) -> Result<KeyPair, KeyGenError> {
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&modulus_bits) || modulus_bits % 8 != 0 {
            return Err(KeyGenError::UnsupportedModulus(modulus_bits));
        }

        debug!(modulus_bits, "generating key pair");
        let task = tokio::task::spawn_blocking(move || {
            let mut rng = rand::thread_rng();
            RsaPrivateKey::new(&mut rng, modulus_bits)
        });

        let private_key = match timeout(self.op_timeout, task).await {
            Ok(Ok(Ok(key))) => key,
            Ok(Ok(Err(e))) => {
                error!("key generation failed: {e}");
                return Err(KeyGenError::Primitive(e.to_string()));
            }
            Ok(Err(join_err)) => {
                error!("key generation task failed: {join_err}");
                return Err(KeyGenError::Primitive(join_err.to_string()));
            }
            Err(_) => {
                error!(timeout = ?self.op_timeout, "key generation timed out");
                return Err(KeyGenError::Timeout(self.op_timeout));
            }
        };

        let pair = KeyPair::from_private(private_key);
        debug!(fingerprint = %Self::fingerprint(pair.public_key()), "key pair ready");
        Ok(pair)
    }

    /// SPKI DER, base64 on a single line, between PEM markers.
    pub fn export_public_key(key: &RsaPublicKey) -> Result<String, KeyImportError> {
        let der = key
            .to_public_key_der()
            .map_err(|e| KeyImportError::Encoding(e.to_string()))?;
        let body = STANDARD.encode(der.as_bytes());
        Ok(format!("{PUBLIC_BEGIN}\n{body}\n{PUBLIC_END}"))
    }

    /// Accepts the single-line form written by [`export_public_key`] as well
    /// as line-wrapped PEM.
    ///
    /// [`export_public_key`]: IdentityManager::export_public_key
    pub fn import_public_key(pem: &str) -> Result<RsaPublicKey, KeyImportError> {
        let pem = pem.trim();
        let body = pem
            .strip_prefix(PUBLIC_BEGIN)
            .ok_or(KeyImportError::MissingMarker(PUBLIC_BEGIN))?
            .strip_suffix(PUBLIC_END)
            .ok_or(KeyImportError::MissingMarker(PUBLIC_END))?;

        let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact)?;

        RsaPublicKey::from_public_key_der(&der).map_err(|e| KeyImportError::Encoding(e.to_string()))
    }

    /// PKCS#8 PEM of the private key.
    pub fn export_private_key(pair: &KeyPair) -> Result<String, KeyImportError> {
        let pem = pair
            .private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyImportError::Encoding(e.to_string()))?;
        Ok(pem.to_string())
    }

    pub fn import_private_key(pem: &str) -> Result<KeyPair, KeyImportError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| KeyImportError::Encoding(e.to_string()))?;
        Ok(KeyPair::from_private(private_key))
    }

    /// First 16 hex characters of SHA-256 over the SPKI DER.
    pub fn fingerprint(key: &RsaPublicKey) -> String {
        match key.to_public_key_der() {
            Ok(der) => {
                let digest = Sha256::digest(der.as_bytes());
                format!("{:x}", digest)[..16].to_string()
            }
            Err(_) => "unknown".to_string(),
        }
    }
}
