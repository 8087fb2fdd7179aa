//! AWS KMS backend.
//!
//! The SDK is async; this client owns a single-threaded runtime and blocks
//! on each call, so the rest of the crate stays synchronous. Authentication
//! follows the usual SDK chain (environment, profile, instance metadata).

use std::future::Future;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

use crate::error::Error;
use crate::kms::{KmsClient, PublicKeyInfo, Result, SigningAlgorithm};

pub struct AwsKmsClient {
    runtime: tokio::runtime::Runtime,
    client: aws_sdk_kms::Client,
    deadline: Option<Duration>,
}

impl AwsKmsClient {
    /// Connects to KMS in `region`. Credential resolution happens lazily on
    /// the first call, not here. When `deadline` is set, every service
    /// round-trip must complete within it.
    pub fn connect(region: &str, deadline: Option<Duration>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Transport {
                message: format!("building async runtime: {e}"),
            })?;

        let config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region.to_string()))
                .load(),
        );
        let client = aws_sdk_kms::Client::new(&config);
        debug!(region, ?deadline, "connected KMS client");
        Ok(AwsKmsClient {
            runtime,
            client,
            deadline,
        })
    }

    fn wait<F: Future>(&self, future: F) -> Result<F::Output> {
        block_on_with_deadline(&self.runtime, self.deadline, future)
    }
}

/// Drives `future` to completion, failing once the deadline has passed.
fn block_on_with_deadline<F: Future>(
    runtime: &tokio::runtime::Runtime,
    deadline: Option<Duration>,
    future: F,
) -> Result<F::Output> {
    match deadline {
        Some(limit) => runtime
            .block_on(async { tokio::time::timeout(limit, future).await })
            .map_err(|_| Error::Transport {
                message: format!("request did not complete within {limit:?}"),
            }),
        None => Ok(runtime.block_on(future)),
    }
}

fn spec_for(algorithm: SigningAlgorithm) -> SigningAlgorithmSpec {
    match algorithm {
        SigningAlgorithm::RsassaPkcs1V15Sha256 => SigningAlgorithmSpec::RsassaPkcs1V15Sha256,
        SigningAlgorithm::RsassaPkcs1V15Sha384 => SigningAlgorithmSpec::RsassaPkcs1V15Sha384,
        SigningAlgorithm::RsassaPkcs1V15Sha512 => SigningAlgorithmSpec::RsassaPkcs1V15Sha512,
        SigningAlgorithm::EcdsaSha256 => SigningAlgorithmSpec::EcdsaSha256,
        SigningAlgorithm::EcdsaSha384 => SigningAlgorithmSpec::EcdsaSha384,
        SigningAlgorithm::EcdsaSha512 => SigningAlgorithmSpec::EcdsaSha512,
    }
}

impl KmsClient for AwsKmsClient {
    fn get_public_key(&self, key_id: &str) -> Result<PublicKeyInfo> {
        let output = self
            .wait(self.client.get_public_key().key_id(key_id).send())?
            .map_err(|e| Error::Transport {
                message: DisplayErrorContext(e).to_string(),
            })?;

        let public_key = output
            .public_key()
            .ok_or_else(|| Error::Transport {
                message: format!("no public key returned for {key_id}"),
            })?
            .as_ref()
            .to_vec();

        Ok(PublicKeyInfo {
            key_id: output
                .key_id()
                .map(str::to_string)
                .unwrap_or_else(|| key_id.to_string()),
            key_usage: output.key_usage().map(|u| u.as_str().to_string()),
            signing_algorithms: output
                .signing_algorithms()
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            key_spec: output.key_spec().map(|s| s.as_str().to_string()),
            public_key,
        })
    }

    fn sign_digest(
        &self,
        key_id: &str,
        digest: &[u8],
        algorithm: SigningAlgorithm,
    ) -> Result<Vec<u8>> {
        let output = self
            .wait(
                self.client
                    .sign()
                    .key_id(key_id)
                    .message(Blob::new(digest))
                    .message_type(MessageType::Digest)
                    .signing_algorithm(spec_for(algorithm))
                    .send(),
            )?
            .map_err(|e| Error::Transport {
                message: DisplayErrorContext(e).to_string(),
            })?;

        let signature = output.signature().ok_or_else(|| Error::Transport {
            message: format!("no signature returned for {key_id}"),
        })?;
        Ok(signature.as_ref().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn expired_deadline_is_a_transport_error() {
        let runtime = runtime();
        let err = block_on_with_deadline(
            &runtime,
            Some(Duration::from_millis(10)),
            std::future::pending::<()>(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn completed_call_is_unaffected_by_deadline() {
        let runtime = runtime();
        let value =
            block_on_with_deadline(&runtime, Some(Duration::from_secs(10)), async { 7 }).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn no_deadline_runs_to_completion() {
        let runtime = runtime();
        let value = block_on_with_deadline(&runtime, None, async { 7 }).unwrap();
        assert_eq!(value, 7);
    }
}
