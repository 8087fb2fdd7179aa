//! Turns a key reference into a usable [`SigningKey`].
//!
//! Resolution fetches the key's metadata once, validates it, classifies the
//! public key and binds everything into the matching remote signer variant.
//! Any failure means the key cannot be used; no partial or degraded signer
//! is ever returned.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::error::Error;
use crate::key::signer::RemoteKey;
use crate::key::{KeyFamily, PublicKey, SigningKey};
use crate::kms::aws::AwsKmsClient;
use crate::kms::{KeyReference, KmsClient, Result, USAGE_SIGN_VERIFY};

/// Resolves `reference` against an already-connected client.
#[instrument(skip(client), fields(key.reference = %reference.key_id()))]
pub fn resolve(client: Arc<dyn KmsClient>, reference: KeyReference) -> Result<SigningKey> {
    let info = client.get_public_key(reference.key_id())?;

    match info.key_usage.as_deref() {
        Some(USAGE_SIGN_VERIFY) => {}
        other => {
            return Err(Error::UnusableKey {
                key_id: reference.key_id().to_string(),
                usage: other.map(str::to_string),
            });
        }
    }
    if info.signing_algorithms.is_empty() {
        return Err(Error::IncompleteKeyMetadata {
            key_id: reference.key_id().to_string(),
            missing: "signing algorithm list",
        });
    }
    if info.key_spec.is_none() {
        return Err(Error::IncompleteKeyMetadata {
            key_id: reference.key_id().to_string(),
            missing: "key spec",
        });
    }

    let public_key = PublicKey::from_der(&info.public_key)?;
    debug!(
        key.family = %public_key.family(),
        key.spec = ?info.key_spec,
        "resolved remote signing key"
    );

    Ok(match public_key.family() {
        KeyFamily::Rsa => {
            SigningKey::RemoteRsa(RemoteKey::new(reference, info, public_key, client))
        }
        KeyFamily::Ec => SigningKey::RemoteEc(RemoteKey::new(reference, info, public_key, client)),
    })
}

/// Connects to AWS KMS in the reference's region and resolves the key there.
/// `deadline` bounds every service round-trip, resolution and later signing
/// alike.
pub fn resolve_aws(reference: KeyReference, deadline: Option<Duration>) -> Result<SigningKey> {
    let client = Arc::new(AwsKmsClient::connect(reference.region(), deadline)?);
    resolve(client, reference)
}
