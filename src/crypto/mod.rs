pub use rsa::RsaPublicKey;

pub use identity::{IdentityManager, KeyPair, DEFAULT_MODULUS_BITS};
pub use signature::{Signature, SignatureService, SALT_LEN};

mod identity;
mod signature;
