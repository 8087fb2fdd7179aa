//! Public key classification and the digest-level signing capability.
//!
//! Certificate issuance never signs raw messages: the pipeline digests the
//! to-be-signed body and hands the digest to a [`SigningKey`](signer::SigningKey),
//! which either computes the signature in-process or forwards the digest to a
//! remote key-management service.

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1};
use der::Encode;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use signature::hazmat::PrehashVerifier;
use x509_cert::spki::{SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};

use crate::error::Error;

pub mod local;
pub mod signer;

pub use local::LocalKeyPair;
pub use signer::SigningKey;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The two key families certificates can be signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    Ec,
}

impl fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFamily::Rsa => f.write_str("RSA"),
            KeyFamily::Ec => f.write_str("EC"),
        }
    }
}

/// Hash functions supported for certificate signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Hashes `data` and returns the digest bytes.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => f.write_str("SHA-256"),
            HashAlgorithm::Sha384 => f.write_str("SHA-384"),
            HashAlgorithm::Sha512 => f.write_str("SHA-512"),
        }
    }
}

/// A decoded public key, tagged with its family.
///
/// The set of variants is closed on purpose: everything downstream matches
/// exhaustively instead of type-switching at runtime.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::ecdsa::VerifyingKey),
    EcdsaP384(p384::ecdsa::VerifyingKey),
}

impl PublicKey {
    /// Classifies a DER-encoded public key.
    ///
    /// Attempts a SubjectPublicKeyInfo parse first and falls back to the
    /// legacy PKCS#1 RSA encoding. Anything else is [`Error::KeyFormat`].
    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        match SubjectPublicKeyInfoRef::try_from(der_bytes) {
            Ok(spki) => match spki.algorithm.oid {
                RSA_ENCRYPTION => RsaPublicKey::from_public_key_der(der_bytes)
                    .map(PublicKey::Rsa)
                    .map_err(|_| Error::KeyFormat),
                ID_EC_PUBLIC_KEY => {
                    let curve = spki
                        .algorithm
                        .parameters
                        .ok_or(Error::KeyFormat)?
                        .decode_as::<ObjectIdentifier>()
                        .map_err(|_| Error::KeyFormat)?;
                    match curve {
                        SECP_256_R_1 => p256::ecdsa::VerifyingKey::from_public_key_der(der_bytes)
                            .map(PublicKey::EcdsaP256)
                            .map_err(|_| Error::KeyFormat),
                        SECP_384_R_1 => p384::ecdsa::VerifyingKey::from_public_key_der(der_bytes)
                            .map(PublicKey::EcdsaP384)
                            .map_err(|_| Error::KeyFormat),
                        _ => Err(Error::KeyFormat),
                    }
                }
                _ => Err(Error::KeyFormat),
            },
            Err(_) => RsaPublicKey::from_pkcs1_der(der_bytes)
                .map(PublicKey::Rsa)
                .map_err(|_| Error::KeyFormat),
        }
    }

    /// Classifies the key carried by a SubjectPublicKeyInfo structure.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der_bytes = spki
            .to_der()
            .map_err(|source| Error::der("encoding SubjectPublicKeyInfo", source))?;
        Self::from_der(&der_bytes)
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            PublicKey::Rsa(_) => KeyFamily::Rsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) => KeyFamily::Ec,
        }
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone()),
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
            PublicKey::EcdsaP384(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(*verifying_key)
            }
        }
        .map_err(|source| Error::Spki {
            context: "encoding public key",
            source,
        })
    }

    /// SubjectPublicKeyInfo DER encoding of this key.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_spki()?
            .to_der()
            .map_err(|source| Error::der("encoding SubjectPublicKeyInfo", source))
    }

    /// Verifies `signature` over a message whose `hash` digest is `digest`.
    ///
    /// ECDSA signatures are expected in ASN.1 DER form, matching both the
    /// X.509 signature field and what KMS-style services return.
    pub fn verify_digest(
        &self,
        digest: &[u8],
        signature: &[u8],
        hash: HashAlgorithm,
    ) -> Result<()> {
        match self {
            PublicKey::Rsa(public) => {
                let scheme = match hash {
                    HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
                    HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
                    HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
                };
                public
                    .verify(scheme, digest, signature)
                    .map_err(|e| Error::SignatureVerification {
                        reason: e.to_string(),
                    })
            }
            PublicKey::EcdsaP256(verifying_key) => {
                let sig = p256::ecdsa::Signature::from_der(signature).map_err(|e| {
                    Error::SignatureVerification {
                        reason: e.to_string(),
                    }
                })?;
                verifying_key
                    .verify_prehash(digest, &sig)
                    .map_err(|e| Error::SignatureVerification {
                        reason: e.to_string(),
                    })
            }
            PublicKey::EcdsaP384(verifying_key) => {
                let sig = p384::ecdsa::Signature::from_der(signature).map_err(|e| {
                    Error::SignatureVerification {
                        reason: e.to_string(),
                    }
                })?;
                verifying_key
                    .verify_prehash(digest, &sig)
                    .map_err(|e| Error::SignatureVerification {
                        reason: e.to_string(),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rsa::pkcs1::EncodeRsaPublicKey;

    use super::*;
    use crate::key::local::LocalKeyPair;

    #[test]
    fn classifies_rsa_spki() {
        let pair = LocalKeyPair::generate_rsa(2048).unwrap();
        let der_bytes = pair.public_key().to_der().unwrap();

        let key = PublicKey::from_der(&der_bytes).unwrap();
        assert_eq!(key.family(), KeyFamily::Rsa);
    }

    #[test]
    fn classifies_ec_spki() {
        let pair = LocalKeyPair::generate_ecdsa_p256();
        let der_bytes = pair.public_key().to_der().unwrap();

        let key = PublicKey::from_der(&der_bytes).unwrap();
        assert_eq!(key.family(), KeyFamily::Ec);
        assert!(matches!(key, PublicKey::EcdsaP256(_)));
    }

    #[test]
    fn classifies_legacy_pkcs1_rsa() {
        let pair = LocalKeyPair::generate_rsa(2048).unwrap();
        let PublicKey::Rsa(public) = pair.public_key() else {
            panic!("expected an RSA key");
        };
        let pkcs1 = public.to_pkcs1_der().unwrap();

        let key = PublicKey::from_der(pkcs1.as_bytes()).unwrap();
        assert_eq!(key.family(), KeyFamily::Rsa);
    }

    #[test]
    fn rejects_garbage_der() {
        let err = PublicKey::from_der(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, Error::KeyFormat));
    }

    #[test]
    fn rejects_truncated_spki() {
        let pair = LocalKeyPair::generate_ecdsa_p256();
        let der_bytes = pair.public_key().to_der().unwrap();

        let err = PublicKey::from_der(&der_bytes[..der_bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, Error::KeyFormat));
    }
}
