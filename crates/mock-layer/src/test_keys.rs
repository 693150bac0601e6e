//! Key pair and identity token fixtures for unit tests.

use std::sync::OnceLock;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use layer_models::IdentityClaims;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

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

/// Identity token for `user_id` bound to `nonce`, signed with `private_pem`.
pub fn identity_token_with(private_pem: &str, user_id: &str, nonce: &str, ttl_secs: i64) -> String {
    let iat = Utc::now().timestamp();
    let claims = IdentityClaims {
        exp: iat + ttl_secs,
        iat,
        iss: "provider-1".into(),
        nce: nonce.into(),
        prn: user_id.into(),
    };
    let mut header = Header::new(Algorithm::RS256);
    header.cty = Some("layer-eit;v=1".into());
    header.kid = Some("key-1".into());
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key");
    encode(&header, &claims, &key).expect("sign identity token")
}

/// Identity token signed with the shared test key.
pub fn identity_token(user_id: &str, nonce: &str) -> String {
    identity_token_with(&keys().private_pem, user_id, nonce, 10_000)
}
