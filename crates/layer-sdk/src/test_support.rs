//! Shared fixtures for unit tests.

use std::sync::OnceLock;

use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// PEM pair (private, public) generated once per test binary.
pub struct TestKeys {
    pub private_pem: String,
    pub public_pem: String,
}

static KEYS: OnceLock<TestKeys> = OnceLock::new();

pub fn keys() -> &'static TestKeys {
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");
        let public = RsaPublicKey::from(&private);
        TestKeys {
            private_pem: private
                .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
                .expect("encode private key")
                .to_string(),
            public_pem: public
                .to_pkcs1_pem(rsa::pkcs8::LineEnding::LF)
                .expect("encode public key"),
        }
    })
}
