//! In-process key pairs, parsed from (optionally encrypted) PKCS#8 PEM.

use der::pem::LineEnding;
use rand_core::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::PrehashSigner;

use crate::error::Error;
use crate::key::{HashAlgorithm, KeyFamily, PublicKey, Result};

/// A private key held in memory, with its public half as a named field.
#[derive(Debug, Clone)]
pub enum LocalKeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: p256::ecdsa::SigningKey,
        verifying_key: p256::ecdsa::VerifyingKey,
    },
}

impl LocalKeyPair {
    /// Generates an RSA key pair with the given modulus size.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits).map_err(|e| Error::KeyGeneration {
            message: e.to_string(),
        })?;
        let public = RsaPublicKey::from(&private);
        Ok(LocalKeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generates an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = OsRng;
        let signing_key = p256::ecdsa::SigningKey::random(&mut rng);
        let verifying_key = *signing_key.verifying_key();
        LocalKeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Parses a PEM-encoded PKCS#8 private key, trying RSA first and then
    /// ECDSA P-256.
    pub fn from_pkcs8_pem(pem_str: &str) -> Result<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_pem(pem_str) {
            let public = RsaPublicKey::from(&private);
            return Ok(LocalKeyPair::Rsa {
                private: Box::new(private),
                public,
            });
        }
        match p256::SecretKey::from_pkcs8_pem(pem_str) {
            Ok(secret) => Ok(Self::from_p256_secret(secret)),
            Err(source) => Err(Error::KeyParse {
                context: "not an RSA or EC P-256 PKCS#8 key".to_string(),
                source,
            }),
        }
    }

    /// Parses a PEM-encoded, password-encrypted PKCS#8 private key.
    pub fn from_pkcs8_encrypted_pem(pem_str: &str, password: &[u8]) -> Result<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs8_encrypted_pem(pem_str, password) {
            let public = RsaPublicKey::from(&private);
            return Ok(LocalKeyPair::Rsa {
                private: Box::new(private),
                public,
            });
        }
        match p256::SecretKey::from_pkcs8_encrypted_pem(pem_str, password) {
            Ok(secret) => Ok(Self::from_p256_secret(secret)),
            Err(source) => Err(Error::KeyParse {
                context: "not a decryptable RSA or EC P-256 PKCS#8 key".to_string(),
                source,
            }),
        }
    }

    fn from_p256_secret(secret: p256::SecretKey) -> Self {
        let signing_key = p256::ecdsa::SigningKey::from(&secret);
        let verifying_key = *signing_key.verifying_key();
        LocalKeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    /// Serializes the private key as PKCS#8 PEM.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let pem = match self {
            LocalKeyPair::Rsa { private, .. } => private.to_pkcs8_pem(LineEnding::LF),
            LocalKeyPair::EcdsaP256 { signing_key, .. } => signing_key.to_pkcs8_pem(LineEnding::LF),
        }
        .map_err(|source| Error::KeyParse {
            context: "serializing PKCS#8".to_string(),
            source: source.into(),
        })?;
        Ok(pem.to_string())
    }

    /// Serializes the private key as password-encrypted PKCS#8 PEM.
    pub fn to_pkcs8_encrypted_pem(&self, password: &[u8]) -> Result<String> {
        let mut rng = OsRng;
        let pem = match self {
            LocalKeyPair::Rsa { private, .. } => {
                private.to_pkcs8_encrypted_pem(&mut rng, password, LineEnding::LF)
            }
            LocalKeyPair::EcdsaP256 { signing_key, .. } => {
                signing_key.to_pkcs8_encrypted_pem(&mut rng, password, LineEnding::LF)
            }
        }
        .map_err(|source| Error::KeyParse {
            context: "serializing encrypted PKCS#8".to_string(),
            source: source.into(),
        })?;
        Ok(pem.to_string())
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            LocalKeyPair::Rsa { .. } => KeyFamily::Rsa,
            LocalKeyPair::EcdsaP256 { .. } => KeyFamily::Ec,
        }
    }

    /// The public half of this key pair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            LocalKeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            LocalKeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(*verifying_key),
        }
    }

    /// Signs a digest produced by `hash`.
    ///
    /// ECDSA signatures are DER-encoded to match the encoding remote signers
    /// return.
    pub fn sign_digest(&self, digest: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>> {
        match self {
            LocalKeyPair::Rsa { private, .. } => {
                let scheme = match hash {
                    HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
                    HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
                    HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
                };
                private
                    .sign(scheme, digest)
                    .map_err(|e| Error::Signing {
                        message: e.to_string(),
                    })
            }
            LocalKeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature =
                    signing_key
                        .sign_prehash(digest)
                        .map_err(|e| Error::Signing {
                            message: e.to_string(),
                        })?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs8_pem_round_trip() {
        let pair = LocalKeyPair::generate_ecdsa_p256();
        let pem_str = pair.to_pkcs8_pem().unwrap();

        let reparsed = LocalKeyPair::from_pkcs8_pem(&pem_str).unwrap();
        assert_eq!(
            pair.public_key().to_der().unwrap(),
            reparsed.public_key().to_der().unwrap()
        );
    }

    #[test]
    fn encrypted_pkcs8_requires_password() {
        let pair = LocalKeyPair::generate_ecdsa_p256();
        let pem_str = pair.to_pkcs8_encrypted_pem(b"hunter2").unwrap();

        let reparsed = LocalKeyPair::from_pkcs8_encrypted_pem(&pem_str, b"hunter2").unwrap();
        assert_eq!(
            pair.public_key().to_der().unwrap(),
            reparsed.public_key().to_der().unwrap()
        );

        let wrong = LocalKeyPair::from_pkcs8_encrypted_pem(&pem_str, b"nope");
        assert!(matches!(wrong, Err(Error::KeyParse { .. })));
    }

    #[test]
    fn local_signature_verifies() {
        let pair = LocalKeyPair::generate_ecdsa_p256();
        let digest = HashAlgorithm::Sha256.digest(b"to be signed");

        let signature = pair.sign_digest(&digest, HashAlgorithm::Sha256).unwrap();
        pair.public_key()
            .verify_digest(&digest, &signature, HashAlgorithm::Sha256)
            .unwrap();
    }

    #[test]
    fn rsa_signature_verifies() {
        let pair = LocalKeyPair::generate_rsa(2048).unwrap();
        let digest = HashAlgorithm::Sha256.digest(b"to be signed");

        let signature = pair.sign_digest(&digest, HashAlgorithm::Sha256).unwrap();
        pair.public_key()
            .verify_digest(&digest, &signature, HashAlgorithm::Sha256)
            .unwrap();

        let tampered = HashAlgorithm::Sha256.digest(b"something else");
        assert!(
            pair.public_key()
                .verify_digest(&tampered, &signature, HashAlgorithm::Sha256)
                .is_err()
        );
    }
}
