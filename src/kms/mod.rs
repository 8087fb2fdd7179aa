//! The remote key-management-service boundary.
//!
//! A backend only has to provide two operations: fetch public key material
//! plus metadata for a key reference, and sign an already-computed digest
//! with that key. Private key bytes never cross this boundary.

use crate::error::Error;

pub mod algorithm;
pub mod aws;
pub mod resolver;

pub use algorithm::SigningAlgorithm;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Key usage value a remote key must report before it may sign.
pub const USAGE_SIGN_VERIFY: &str = "SIGN_VERIFY";

/// An opaque reference to a key held inside a remote KMS, plus the region
/// the service is contacted in. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReference {
    key_id: String,
    region: String,
}

impl KeyReference {
    /// Parses an AWS KMS ARN of the form
    /// `arn:<partition>:kms:<region>:<account>:key/<id>`.
    pub fn parse(arn: &str) -> Result<Self> {
        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() < 6 || parts[0] != "arn" {
            return Err(Error::InvalidKeyReference {
                value: arn.to_string(),
                reason: "not an ARN",
            });
        }
        if parts[2] != "kms" {
            return Err(Error::InvalidKeyReference {
                value: arn.to_string(),
                reason: "not a KMS ARN",
            });
        }
        if parts[3].is_empty() {
            return Err(Error::InvalidKeyReference {
                value: arn.to_string(),
                reason: "ARN carries no region",
            });
        }
        Ok(KeyReference {
            key_id: arn.to_string(),
            region: parts[3].to_string(),
        })
    }

    /// Builds a reference from an already-separated key id and region, for
    /// backends whose references are not ARNs.
    pub fn new(key_id: impl Into<String>, region: impl Into<String>) -> Self {
        KeyReference {
            key_id: key_id.into(),
            region: region.into(),
        }
    }

    /// Replaces the region the service is contacted in.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// The remote service's metadata snapshot for a key, captured verbatim at
/// resolution time. Validation happens in the resolver, not here.
#[derive(Debug, Clone)]
pub struct PublicKeyInfo {
    /// Canonical key id reported by the service.
    pub key_id: String,
    /// Key usage flag, e.g. `SIGN_VERIFY` or `ENCRYPT_DECRYPT`.
    pub key_usage: Option<String>,
    /// Signing algorithm identifiers the key supports.
    pub signing_algorithms: Vec<String>,
    /// Customer-defined key spec, e.g. `RSA_2048` or `ECC_NIST_P256`.
    pub key_spec: Option<String>,
    /// DER-encoded public key.
    pub public_key: Vec<u8>,
}

/// The two operations this crate requires from any KMS-style backend.
///
/// Implementations are blocking from the caller's perspective; async
/// transports hide their runtime behind this trait. Implementations must
/// be shareable, so one resolved signer can serve concurrent signing
/// calls.
pub trait KmsClient: Send + Sync {
    /// Fetches public key material and metadata for `key_id`.
    fn get_public_key(&self, key_id: &str) -> Result<PublicKeyInfo>;

    /// Signs a pre-computed digest with the named key.
    ///
    /// `digest` must be the output of the hash function `algorithm` names,
    /// never raw message bytes. Implementations submit it with a DIGEST
    /// message-type marker.
    fn sign_digest(
        &self,
        key_id: &str,
        digest: &[u8],
        algorithm: SigningAlgorithm,
    ) -> Result<Vec<u8>>;
}
