use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use der::Encode;
use x509_cert::builder::{Builder, RequestBuilder};
use x509_cert::name::Name;

use certsign::cert::Certificate;
use certsign::cert::params::{DistinguishedName, Validity};
use certsign::error::Error;
use certsign::key::{KeyFamily, LocalKeyPair};
use certsign::kms::{KmsClient, PublicKeyInfo, SigningAlgorithm, USAGE_SIGN_VERIFY};

pub struct MockKey {
    pair: LocalKeyPair,
    usage: String,
    algorithms: Vec<String>,
    key_spec: Option<String>,
}

/// An in-memory KMS backend holding local key pairs behind ARNs.
#[derive(Default)]
pub struct MockKms {
    keys: HashMap<String, MockKey>,
}

impl MockKms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ec_key(mut self, arn: &str) -> Self {
        self.keys.insert(
            arn.to_string(),
            MockKey {
                pair: LocalKeyPair::generate_ecdsa_p256(),
                usage: USAGE_SIGN_VERIFY.to_string(),
                algorithms: vec!["ECDSA_SHA_256".to_string(), "ECDSA_SHA_384".to_string()],
                key_spec: Some("ECC_NIST_P256".to_string()),
            },
        );
        self
    }

    pub fn with_rsa_key(mut self, arn: &str) -> Self {
        self.keys.insert(
            arn.to_string(),
            MockKey {
                pair: LocalKeyPair::generate_rsa(2048).unwrap(),
                usage: USAGE_SIGN_VERIFY.to_string(),
                algorithms: vec![
                    "RSASSA_PKCS1_V1_5_SHA_256".to_string(),
                    "RSASSA_PKCS1_V1_5_SHA_384".to_string(),
                    "RSASSA_PKCS1_V1_5_SHA_512".to_string(),
                ],
                key_spec: Some("RSA_2048".to_string()),
            },
        );
        self
    }

    pub fn with_usage(mut self, arn: &str, usage: &str) -> Self {
        self.keys.get_mut(arn).unwrap().usage = usage.to_string();
        self
    }

    pub fn without_algorithms(mut self, arn: &str) -> Self {
        self.keys.get_mut(arn).unwrap().algorithms.clear();
        self
    }

    pub fn without_key_spec(mut self, arn: &str) -> Self {
        self.keys.get_mut(arn).unwrap().key_spec = None;
        self
    }

    pub fn key_pair(&self, arn: &str) -> LocalKeyPair {
        self.keys[arn].pair.clone()
    }

    fn key(&self, key_id: &str) -> Result<&MockKey, Error> {
        self.keys.get(key_id).ok_or_else(|| Error::Transport {
            message: format!("no such key: {key_id}"),
        })
    }
}

impl KmsClient for MockKms {
    fn get_public_key(&self, key_id: &str) -> Result<PublicKeyInfo, Error> {
        let key = self.key(key_id)?;
        Ok(PublicKeyInfo {
            key_id: key_id.to_string(),
            key_usage: Some(key.usage.clone()),
            signing_algorithms: key.algorithms.clone(),
            key_spec: key.key_spec.clone(),
            public_key: key.pair.public_key().to_der()?,
        })
    }

    fn sign_digest(
        &self,
        key_id: &str,
        digest: &[u8],
        algorithm: SigningAlgorithm,
    ) -> Result<Vec<u8>, Error> {
        let key = self.key(key_id)?;
        assert_eq!(algorithm.family(), key.pair.family());
        key.pair.sign_digest(digest, algorithm.hash())
    }
}

pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("certsign-it-{}-{name}", std::process::id()))
}

/// Writes a self-signed issuer certificate and its key to temp files.
/// Returns the certificate path, the key path and the key pair.
pub fn write_issuer(
    prefix: &str,
    family: KeyFamily,
    password: Option<&[u8]>,
) -> (PathBuf, PathBuf, LocalKeyPair) {
    let key = match family {
        KeyFamily::Ec => LocalKeyPair::generate_ecdsa_p256(),
        KeyFamily::Rsa => LocalKeyPair::generate_rsa(2048).unwrap(),
    };
    let subject = DistinguishedName::builder()
        .common_name("Integration CA")
        .organization("Example")
        .build();
    let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30)).unwrap();

    let cert_path = temp_path(&format!("{prefix}.crt"));
    let key_path = temp_path(&format!("{prefix}.key"));
    std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
    let key_pem = match password {
        Some(pw) => key.to_pkcs8_encrypted_pem(pw).unwrap(),
        None => key.to_pkcs8_pem().unwrap(),
    };
    std::fs::write(&key_path, key_pem).unwrap();
    (cert_path, key_path, key)
}

/// Writes only the issuer certificate, for remote-key scenarios.
pub fn write_issuer_cert(prefix: &str, key: &LocalKeyPair) -> PathBuf {
    let subject = DistinguishedName::builder()
        .common_name("Remote Integration CA")
        .build();
    let cert = Certificate::new_self_signed(&subject, key, Validity::for_days(30)).unwrap();
    let cert_path = temp_path(&format!("{prefix}.crt"));
    std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
    cert_path
}

/// A fresh DER-encoded P-256 CSR for the given common name.
pub fn generate_csr(common_name: &str) -> Vec<u8> {
    let signer = p256::ecdsa::SigningKey::random(&mut rand_core::OsRng);
    let subject = Name::from_str(&format!("CN={common_name}")).unwrap();
    let builder = RequestBuilder::new(subject, &signer).unwrap();
    let req = builder.build::<p256::ecdsa::DerSignature>().unwrap();
    req.to_der().unwrap()
}
