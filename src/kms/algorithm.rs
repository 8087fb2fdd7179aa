//! Maps a key family and hash function to the signing algorithm identifier
//! the remote service expects.
//!
//! This is a pure lookup: six valid combinations, no fallback and no default
//! hash. Identifiers use the AWS KMS wire names.

use crate::key::{HashAlgorithm, KeyFamily};
use crate::kms::Result;

/// Remote signing algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    RsassaPkcs1V15Sha256,
    RsassaPkcs1V15Sha384,
    RsassaPkcs1V15Sha512,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
}

impl SigningAlgorithm {
    /// The service-side name of this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::RsassaPkcs1V15Sha256 => "RSASSA_PKCS1_V1_5_SHA_256",
            SigningAlgorithm::RsassaPkcs1V15Sha384 => "RSASSA_PKCS1_V1_5_SHA_384",
            SigningAlgorithm::RsassaPkcs1V15Sha512 => "RSASSA_PKCS1_V1_5_SHA_512",
            SigningAlgorithm::EcdsaSha256 => "ECDSA_SHA_256",
            SigningAlgorithm::EcdsaSha384 => "ECDSA_SHA_384",
            SigningAlgorithm::EcdsaSha512 => "ECDSA_SHA_512",
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            SigningAlgorithm::RsassaPkcs1V15Sha256
            | SigningAlgorithm::RsassaPkcs1V15Sha384
            | SigningAlgorithm::RsassaPkcs1V15Sha512 => KeyFamily::Rsa,
            SigningAlgorithm::EcdsaSha256
            | SigningAlgorithm::EcdsaSha384
            | SigningAlgorithm::EcdsaSha512 => KeyFamily::Ec,
        }
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            SigningAlgorithm::RsassaPkcs1V15Sha256 | SigningAlgorithm::EcdsaSha256 => {
                HashAlgorithm::Sha256
            }
            SigningAlgorithm::RsassaPkcs1V15Sha384 | SigningAlgorithm::EcdsaSha384 => {
                HashAlgorithm::Sha384
            }
            SigningAlgorithm::RsassaPkcs1V15Sha512 | SigningAlgorithm::EcdsaSha512 => {
                HashAlgorithm::Sha512
            }
        }
    }
}

/// Selects the signing algorithm for a key family and hash function. Every
/// pair of the closed enums maps to an identifier; whether the key actually
/// advertises it is checked at signing time.
pub fn select(family: KeyFamily, hash: HashAlgorithm) -> Result<SigningAlgorithm> {
    match (family, hash) {
        (KeyFamily::Rsa, HashAlgorithm::Sha256) => Ok(SigningAlgorithm::RsassaPkcs1V15Sha256),
        (KeyFamily::Rsa, HashAlgorithm::Sha384) => Ok(SigningAlgorithm::RsassaPkcs1V15Sha384),
        (KeyFamily::Rsa, HashAlgorithm::Sha512) => Ok(SigningAlgorithm::RsassaPkcs1V15Sha512),
        (KeyFamily::Ec, HashAlgorithm::Sha256) => Ok(SigningAlgorithm::EcdsaSha256),
        (KeyFamily::Ec, HashAlgorithm::Sha384) => Ok(SigningAlgorithm::EcdsaSha384),
        (KeyFamily::Ec, HashAlgorithm::Sha512) => Ok(SigningAlgorithm::EcdsaSha512),
    }
}
