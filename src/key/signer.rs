//! The signing capability the issuance pipeline consumes.
//!
//! Exactly two operations exist: expose the public key and sign a digest.
//! Whether the private key lives in process memory or behind a KMS is a
//! variant of [`SigningKey`]; the pipeline never inspects which.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::key::{HashAlgorithm, KeyFamily, LocalKeyPair, PublicKey, Result};
use crate::kms::{KeyReference, KmsClient, PublicKeyInfo, algorithm};

/// A key that signs by reference: the private half never leaves the remote
/// service. Bound at resolution time to one key reference and the metadata
/// snapshot fetched for it.
#[derive(Clone)]
pub struct RemoteKey {
    reference: KeyReference,
    info: PublicKeyInfo,
    public_key: PublicKey,
    client: Arc<dyn KmsClient>,
}

impl RemoteKey {
    pub(crate) fn new(
        reference: KeyReference,
        info: PublicKeyInfo,
        public_key: PublicKey,
        client: Arc<dyn KmsClient>,
    ) -> Self {
        RemoteKey {
            reference,
            info,
            public_key,
            client,
        }
    }

    pub fn reference(&self) -> &KeyReference {
        &self.reference
    }

    /// The metadata snapshot captured when the key was resolved.
    pub fn info(&self) -> &PublicKeyInfo {
        &self.info
    }

    /// The cached public key; no service round-trip happens here.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs `digest` remotely. The digest must already be the output of
    /// `hash`; only the digest travels to the service.
    fn sign_digest(
        &self,
        digest: &[u8],
        hash: HashAlgorithm,
        family: KeyFamily,
    ) -> Result<Vec<u8>> {
        let algorithm = algorithm::select(family, hash)?;
        if !self
            .info
            .signing_algorithms
            .iter()
            .any(|a| a == algorithm.as_str())
        {
            return Err(Error::UnsupportedAlgorithm { family, hash });
        }

        debug!(
            key.reference = %self.reference.key_id(),
            signing.algorithm = algorithm.as_str(),
            "requesting remote signature over digest"
        );
        self.client
            .sign_digest(self.reference.key_id(), digest, algorithm)
    }
}

impl fmt::Debug for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteKey")
            .field("reference", &self.reference)
            .field("key_spec", &self.info.key_spec)
            .finish_non_exhaustive()
    }
}

/// The closed set of signer variants.
///
/// Local keys compute signatures in-process; remote variants delegate to the
/// client captured at resolution. A supplied randomness source would be
/// meaningless for remote variants (the service manages its own), so signing
/// takes none.
#[derive(Debug, Clone)]
pub enum SigningKey {
    Local(LocalKeyPair),
    RemoteRsa(RemoteKey),
    RemoteEc(RemoteKey),
}

impl SigningKey {
    pub fn family(&self) -> KeyFamily {
        match self {
            SigningKey::Local(pair) => pair.family(),
            SigningKey::RemoteRsa(_) => KeyFamily::Rsa,
            SigningKey::RemoteEc(_) => KeyFamily::Ec,
        }
    }

    /// The public key corresponding to the key `sign_digest` uses.
    ///
    /// Pure for remote variants: the key was cached when the reference was
    /// resolved.
    pub fn public_key(&self) -> PublicKey {
        match self {
            SigningKey::Local(pair) => pair.public_key(),
            SigningKey::RemoteRsa(remote) | SigningKey::RemoteEc(remote) => {
                remote.public_key().clone()
            }
        }
    }

    /// The hash function certificates signed by this key should use.
    pub fn default_hash(&self) -> HashAlgorithm {
        match self.public_key() {
            PublicKey::Rsa(_) | PublicKey::EcdsaP256(_) => HashAlgorithm::Sha256,
            PublicKey::EcdsaP384(_) => HashAlgorithm::Sha384,
        }
    }

    /// The X.509 signature algorithm certificates signed with `hash` by
    /// this key will carry.
    pub fn signature_algorithm(&self, hash: HashAlgorithm) -> crate::cert::SignatureAlgorithm {
        crate::cert::SignatureAlgorithm::new(self.family(), hash)
    }

    /// Signs a digest produced by `hash`. Never pass raw message bytes.
    pub fn sign_digest(&self, digest: &[u8], hash: HashAlgorithm) -> Result<Vec<u8>> {
        match self {
            SigningKey::Local(pair) => pair.sign_digest(digest, hash),
            SigningKey::RemoteRsa(remote) => remote.sign_digest(digest, hash, KeyFamily::Rsa),
            SigningKey::RemoteEc(remote) => remote.sign_digest(digest, hash, KeyFamily::Ec),
        }
    }
}
