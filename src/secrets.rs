//! Secret retrieval for issuer key passwords.
//!
//! Secrets are fetched by reference at issuance time and never written to
//! disk. The store trait exists so tests can supply secrets without a
//! network.

use aws_config::{BehaviorVersion, Region};
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

use crate::error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fetches one field of a secret identified by `reference`.
///
/// Secrets are JSON objects; `field` names the entry holding the value.
pub trait SecretStore: Send + Sync {
    fn fetch(&self, reference: &str, field: &str) -> Result<Vec<u8>>;
}

/// AWS Secrets Manager backend. Owns its runtime the same way the KMS
/// client does.
pub struct AwsSecretsManagerStore {
    runtime: tokio::runtime::Runtime,
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretsManagerStore {
    pub fn connect(region: &str) -> Result<Self> {
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
        let client = aws_sdk_secretsmanager::Client::new(&config);
        debug!(region, "connected secrets manager client");
        Ok(AwsSecretsManagerStore { runtime, client })
    }
}

impl SecretStore for AwsSecretsManagerStore {
    fn fetch(&self, reference: &str, field: &str) -> Result<Vec<u8>> {
        let output = self
            .runtime
            .block_on(
                self.client
                    .get_secret_value()
                    .secret_id(reference)
                    .send(),
            )
            .map_err(|e| Error::SecretFetch {
                reference: reference.to_string(),
                message: DisplayErrorContext(e).to_string(),
            })?;

        let secret_string = output.secret_string().ok_or_else(|| Error::SecretFetch {
            reference: reference.to_string(),
            message: "secret has no string value".to_string(),
        })?;

        extract_field(reference, secret_string, field)
    }
}

/// Pulls `field` out of a JSON-object secret value.
fn extract_field(reference: &str, secret_string: &str, field: &str) -> Result<Vec<u8>> {
    let value: serde_json::Value =
        serde_json::from_str(secret_string).map_err(|_| Error::SecretField {
            reference: reference.to_string(),
            field: field.to_string(),
        })?;
    value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(|s| s.as_bytes().to_vec())
        .ok_or_else(|| Error::SecretField {
            reference: reference.to_string(),
            field: field.to_string(),
        })
}
