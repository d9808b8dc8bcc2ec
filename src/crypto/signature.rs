use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::identity::KeyPair;
use crate::error::{SigningError, VerificationError};

/// PSS salt length in bytes, for both signing and verification.
pub const SALT_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// RSA-PSS over SHA-256 of the UTF-8 message text. Holds no key state; every
/// call gets the key it needs.
#[derive(Debug, Clone)]
pub struct SignatureService {
    op_timeout: Duration,
}

impl SignatureService {
    pub fn new(op_timeout: Duration) -> Self {
        Self { op_timeout }
    }

    pub async fn sign(&self, pair: &KeyPair, message: &str) -> Result<Signature, SigningError> {
        let private_key = pair.private_key().clone();
        let digest = Sha256::digest(message.as_bytes());

        let task = tokio::task::spawn_blocking(move || {
            let mut rng = rand::thread_rng();
            private_key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha256>(SALT_LEN), &digest)
        });

        match timeout(self.op_timeout, task).await {
            Ok(Ok(Ok(bytes))) => {
                debug!(len = bytes.len(), "signed message");
                Ok(Signature(bytes))
            }
            Ok(Ok(Err(e))) => {
                warn!("signing failed: {e}");
                Err(SigningError::Primitive(e.to_string()))
            }
            Ok(Err(join_err)) => Err(SigningError::Primitive(join_failure(join_err))),
            Err(_) => {
                warn!(timeout = ?self.op_timeout, "signing timed out");
                Err(SigningError::Timeout(self.op_timeout))
            }
        }
    }

    /// `Ok(false)` whenever the signature does not match the message and key.
    /// Errors are reserved for input that cannot be checked at all.
    pub async fn verify(
        &self,
        public_key: &RsaPublicKey,
        message: &str,
        signature: &[u8],
    ) -> Result<bool, VerificationError> {
        let expected = public_key.size();
        if signature.len() != expected {
            return Err(VerificationError::SignatureLength {
                expected,
                actual: signature.len(),
            });
        }

        let public_key = public_key.clone();
        let signature = signature.to_vec();
        let digest = Sha256::digest(message.as_bytes());

        let task = tokio::task::spawn_blocking(move || {
            public_key
                .verify(Pss::new_with_salt::<Sha256>(SALT_LEN), &digest, &signature)
                .is_ok()
        });

        match timeout(self.op_timeout, task).await {
            Ok(Ok(valid)) => {
                debug!(valid, "verified signature");
                Ok(valid)
            }
            Ok(Err(join_err)) => Err(VerificationError::Primitive(join_failure(join_err))),
            Err(_) => {
                warn!(timeout = ?self.op_timeout, "verification timed out");
                Err(VerificationError::Timeout(self.op_timeout))
            }
        }
    }
}

fn join_failure(err: JoinError) -> String {
    warn!("crypto task failed: {err}");
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::IdentityManager;

    async fn key_pair() -> KeyPair {
        IdentityManager::new(Duration::from_secs(120))
            .generate_key_pair(1024)
            .await
            .unwrap()
    }

    fn service() -> SignatureService {
        SignatureService::new(Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_sign_verify_various_texts() {
        let pair = key_pair().await;
        let service = service();

        for text in ["Este es un mensaje de prueba.", "", "ñandú 🦤 日本語"] {
            let signature = service.sign(&pair, text).await.unwrap();
            assert_eq!(signature.as_bytes().len(), pair.public_key().size());
            assert!(
                service
                    .verify(pair.public_key(), text, signature.as_bytes())
                    .await
                    .unwrap(),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_sign_verify_any_text() {
        use proptest::prelude::*;
        use proptest::test_runner::TestRunner;

        let rt = tokio::runtime::Runtime::new().unwrap();
        let pair = rt.block_on(key_pair());
        let service = service();

        let mut runner = TestRunner::new(ProptestConfig::with_cases(16));
        runner
            .run(&any::<String>(), |text| {
                let valid = rt.block_on(async {
                    let signature = service.sign(&pair, &text).await.unwrap();
                    service
                        .verify(pair.public_key(), &text, signature.as_bytes())
                        .await
                        .unwrap()
                });
                prop_assert!(valid, "{:?}", text);
                Ok(())
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_single_character_change_fails() {
        let pair = key_pair().await;
        let service = service();

        let signature = service.sign(&pair, "hola mundo").await.unwrap();
        assert!(!service
            .verify(pair.public_key(), "hola mundO", signature.as_bytes())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_other_key_fails() {
        let pair = key_pair().await;
        let other = key_pair().await;
        let service = service();

        let signature = service.sign(&pair, "hola").await.unwrap();
        assert!(!service
            .verify(other.public_key(), "hola", signature.as_bytes())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_signatures_are_randomized() {
        let pair = key_pair().await;
        let service = service();

        let a = service.sign(&pair, "hola").await.unwrap();
        let b = service.sign(&pair, "hola").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_corrupted_signature_is_false() {
        let pair = key_pair().await;
        let service = service();

        let mut bytes = service.sign(&pair, "hola").await.unwrap().into_bytes();
        bytes[10] ^= 0xff;
        assert!(!service
            .verify(pair.public_key(), "hola", &bytes)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_wrong_length_is_error() {
        let pair = key_pair().await;
        let err = service()
            .verify(pair.public_key(), "hola", &[1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::SignatureLength {
                expected: 128,
                actual: 3
            }
        ));
    }
}
