//! End-to-end issuance: CSR in, PEM chain out.
//!
//! The steps always run in the same order: parse the request, verify its
//! self-signature, load the issuer identity, apply the leaf profile, sign,
//! then optionally append the issuer certificate. Verification is not
//! skippable; a request that cannot prove possession of its key is never
//! signed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tracing::{debug, instrument};

use crate::csr::Csr;
use crate::identity::{Identity, KeyPassword, KeySource};
use crate::key::Result;
use crate::kms::KmsClient;
use crate::profile::LeafProfile;
use crate::secrets::SecretStore;

/// Password material fetched from a secret store at issuance time.
pub struct SecretPassword<'a> {
    pub store: &'a dyn SecretStore,
    pub reference: &'a str,
    pub field: &'a str,
}

/// One request to sign a CSR under an issuer.
#[derive(Builder)]
pub struct SignRequest<'a> {
    /// CSR bytes, PEM or DER.
    pub csr: &'a [u8],
    /// Path to the issuer certificate, PEM.
    pub issuer_certificate: &'a Path,
    /// Issuer key: a PKCS#8 file path or a KMS key ARN.
    pub issuer_key: &'a str,
    /// Append the issuer certificate after the leaf.
    #[builder(default)]
    pub bundle: bool,
    /// Password for an encrypted issuer key file.
    pub password: Option<&'a [u8]>,
    /// Password fetched from a secret store; takes precedence over
    /// `password`.
    pub password_secret: Option<SecretPassword<'a>>,
    /// Override for the remote key backend; defaults to AWS KMS.
    pub kms: Option<Arc<dyn KmsClient>>,
    /// Deadline for each remote key service call.
    pub deadline: Option<Duration>,
}

/// Runs the issuance pipeline and returns the PEM output, leaf first.
#[instrument(skip_all, fields(issuer.key = request.issuer_key, bundle = request.bundle))]
pub fn sign_csr(request: SignRequest<'_>) -> Result<String> {
    let csr = Csr::from_bytes(request.csr)?;
    csr.verify_signature()?;
    debug!(subject = %csr.subject(), "verified certification request");

    let key_source = KeySource::parse(request.issuer_key)?;
    let password = match &request.password_secret {
        Some(secret) => KeyPassword::Secret {
            store: secret.store,
            reference: secret.reference,
            field: secret.field,
        },
        None => match request.password {
            Some(password) => KeyPassword::Static(password),
            None => KeyPassword::None,
        },
    };

    let identity = Identity::load(
        request.issuer_certificate,
        &key_source,
        password,
        request.kms,
        request.deadline,
    )?;

    let leaf = LeafProfile::new(&csr, &identity).create()?;

    let mut output = leaf.to_pem()?;
    if request.bundle {
        output.push_str(&identity.certificate.to_pem()?);
    }
    Ok(output)
}
