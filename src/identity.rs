//! The issuer identity: a CA certificate plus the key that signs with it.
//!
//! The key half is either a PKCS#8 file on disk or a reference into a
//! remote KMS; which one is decided by the shape of the configured value,
//! never by probing. Every load failure is wrapped so callers see one
//! error kind with the offending path or reference named.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::cert::Certificate;
use crate::error::Error;
use crate::key::{LocalKeyPair, Result, SigningKey};
use crate::kms::{self, KeyReference, KmsClient};
use crate::secrets::SecretStore;

/// Where the issuer's private key lives.
#[derive(Debug, Clone)]
pub enum KeySource {
    Local(PathBuf),
    Remote(KeyReference),
}

impl KeySource {
    /// Classifies a configured key value: ARNs are remote references,
    /// everything else is a filesystem path.
    pub fn parse(value: &str) -> Result<Self> {
        if value.starts_with("arn:") {
            Ok(KeySource::Remote(KeyReference::parse(value)?))
        } else {
            Ok(KeySource::Local(PathBuf::from(value)))
        }
    }
}

/// How to obtain the password for an encrypted local key, if any.
pub enum KeyPassword<'a> {
    None,
    Static(&'a [u8]),
    Secret {
        store: &'a dyn SecretStore,
        reference: &'a str,
        field: &'a str,
    },
}

/// An issuer certificate paired with its signing key.
#[derive(Debug)]
pub struct Identity {
    pub certificate: Certificate,
    pub key: SigningKey,
}

impl Identity {
    /// Loads the issuer certificate and resolves the signing key.
    ///
    /// `kms` overrides the backend used for remote references; when `None`
    /// the AWS client for the reference's region is used, with `deadline`
    /// bounding each of its service calls.
    #[instrument(skip_all, fields(cert = %certificate_path.display()))]
    pub fn load(
        certificate_path: &Path,
        key_source: &KeySource,
        password: KeyPassword<'_>,
        kms: Option<Arc<dyn KmsClient>>,
        deadline: Option<Duration>,
    ) -> Result<Self> {
        let certificate = Certificate::from_pem_file(certificate_path)
            .map_err(|e| Error::identity_load(certificate_path.display().to_string(), e))?;

        let key = match key_source {
            KeySource::Local(path) => {
                let pair = load_local_key(path, password)
                    .map_err(|e| Error::identity_load(path.display().to_string(), e))?;
                SigningKey::Local(pair)
            }
            KeySource::Remote(reference) => {
                debug!(key.reference = reference.key_id(), "resolving remote issuer key");
                let resolved = match kms {
                    Some(client) => kms::resolver::resolve(client, reference.clone()),
                    None => kms::resolver::resolve_aws(reference.clone(), deadline),
                };
                resolved.map_err(|e| Error::identity_load(reference.key_id().to_string(), e))?
            }
        };

        Ok(Identity { certificate, key })
    }
}

fn load_local_key(path: &Path, password: KeyPassword<'_>) -> Result<LocalKeyPair> {
    let pem_str = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match password {
        KeyPassword::None => LocalKeyPair::from_pkcs8_pem(&pem_str),
        KeyPassword::Static(password) => {
            LocalKeyPair::from_pkcs8_encrypted_pem(&pem_str, password)
        }
        KeyPassword::Secret {
            store,
            reference,
            field,
        } => {
            let password = store.fetch(reference, field)?;
            LocalKeyPair::from_pkcs8_encrypted_pem(&pem_str, &password)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::{DistinguishedName, Validity};
    use crate::key::KeyFamily;

    struct FixedSecret(&'static str);

    impl SecretStore for FixedSecret {
        fn fetch(&self, _reference: &str, _field: &str) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("certsign-identity-{}-{name}", std::process::id()))
    }

    fn write_issuer_fixture(prefix: &str, password: Option<&[u8]>) -> (PathBuf, PathBuf) {
        let key = LocalKeyPair::generate_ecdsa_p256();
        let subject = DistinguishedName::builder().common_name("Fixture CA").build();
        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30)).unwrap();

        let cert_path = temp_path(&format!("{prefix}.crt"));
        let key_path = temp_path(&format!("{prefix}.key"));
        std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
        let key_pem = match password {
            Some(pw) => key.to_pkcs8_encrypted_pem(pw).unwrap(),
            None => key.to_pkcs8_pem().unwrap(),
        };
        std::fs::write(&key_path, key_pem).unwrap();
        (cert_path, key_path)
    }

    #[test]
    fn loads_plain_local_identity() {
        let (cert_path, key_path) = write_issuer_fixture("plain", None);

        let identity = Identity::load(
            &cert_path,
            &KeySource::Local(key_path),
            KeyPassword::None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(identity.key.family(), KeyFamily::Ec);
        assert!(matches!(identity.key, SigningKey::Local(_)));
    }

    #[test]
    fn loads_encrypted_identity_with_static_password() {
        let (cert_path, key_path) = write_issuer_fixture("enc", Some(b"hunter2"));

        let identity = Identity::load(
            &cert_path,
            &KeySource::Local(key_path),
            KeyPassword::Static(b"hunter2"),
            None,
            None,
        )
        .unwrap();
        assert!(matches!(identity.key, SigningKey::Local(_)));
    }

    #[test]
    fn loads_encrypted_identity_with_secret_password() {
        let (cert_path, key_path) = write_issuer_fixture("secret", Some(b"s3cret"));
        let store = FixedSecret("s3cret");

        let identity = Identity::load(
            &cert_path,
            &KeySource::Local(key_path),
            KeyPassword::Secret {
                store: &store,
                reference: "arn:aws:secretsmanager:us-west-2:123456789012:secret:ca",
                field: "password",
            },
            None,
            None,
        )
        .unwrap();
        assert!(matches!(identity.key, SigningKey::Local(_)));
    }

    #[test]
    fn wrong_password_fails_as_identity_load() {
        let (cert_path, key_path) = write_issuer_fixture("wrongpw", Some(b"right"));

        let err = Identity::load(
            &cert_path,
            &KeySource::Local(key_path),
            KeyPassword::Static(b"wrong"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::IdentityLoad { .. }));
    }

    #[test]
    fn missing_certificate_fails_as_identity_load() {
        let err = Identity::load(
            &temp_path("missing.crt"),
            &KeySource::Local(temp_path("missing.key")),
            KeyPassword::None,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::IdentityLoad { .. }));
    }

    #[test]
    fn identity_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Identity>();
        assert_send_sync::<SigningKey>();
    }

    #[test]
    fn key_source_classification() {
        assert!(matches!(
            KeySource::parse("./issuer.key").unwrap(),
            KeySource::Local(_)
        ));
        assert!(matches!(
            KeySource::parse("arn:aws:kms:us-east-1:123456789012:key/abc").unwrap(),
            KeySource::Remote(_)
        ));
        assert!(KeySource::parse("arn:aws:s3:::bucket").is_err());
    }
}
