use std::path::PathBuf;

use thiserror::Error;

use crate::key::{HashAlgorithm, KeyFamily};

/// Errors produced while resolving keys, loading identities and issuing
/// certificates.
///
/// Every failure is terminal for the operation that produced it; callers
/// must not treat any of these as retryable.
#[derive(Debug, Error)]
pub enum Error {
    /// The public key DER was neither a SubjectPublicKeyInfo structure nor a
    /// legacy PKCS#1 RSA public key.
    #[error("error decoding DER public key; bad format")]
    KeyFormat,

    /// The remote key exists but its usage does not permit signing.
    #[error("KMS key {key_id} has usage {usage:?}, expected SIGN_VERIFY")]
    UnusableKey {
        key_id: String,
        usage: Option<String>,
    },

    /// The remote key metadata lacks a field the resolver requires.
    #[error("KMS key {key_id} metadata is missing {missing}")]
    IncompleteKeyMetadata {
        key_id: String,
        missing: &'static str,
    },

    /// No remote signing algorithm exists for the key family/hash pair.
    #[error("no {family} signing algorithm for {hash}")]
    UnsupportedAlgorithm {
        family: KeyFamily,
        hash: HashAlgorithm,
    },

    /// The certificate or CSR declares a signature algorithm this crate does
    /// not implement.
    #[error("unsupported signature algorithm {oid}")]
    UnsupportedSignatureOid { oid: const_oid::ObjectIdentifier },

    /// A network round-trip to the remote service failed. The service error
    /// detail is passed through verbatim.
    #[error("KMS request failed: {message}")]
    Transport { message: String },

    /// Assembling the issuer identity failed; `source` carries the first
    /// underlying failure.
    #[error("failed to load issuer identity ({context})")]
    IdentityLoad {
        context: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to parse certificate signing request")]
    CsrParse {
        #[source]
        source: der::Error,
    },

    #[error("certificate request has an invalid signature")]
    CsrSignature {
        #[source]
        source: Box<Error>,
    },

    #[error("failed to create leaf certificate")]
    CertificateCreation {
        #[source]
        source: Box<Error>,
    },

    #[error("signature verification failed: {reason}")]
    SignatureVerification { reason: String },

    #[error("invalid key reference {value:?}: {reason}")]
    InvalidKeyReference {
        value: String,
        reason: &'static str,
    },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DER error while {context}")]
    Der {
        context: &'static str,
        #[source]
        source: der::Error,
    },

    #[error("SPKI error while {context}")]
    Spki {
        context: &'static str,
        #[source]
        source: x509_cert::spki::Error,
    },

    #[error("failed to decode PEM block")]
    PemDecode {
        #[source]
        source: pem::PemError,
    },

    #[error("failed to parse private key ({context})")]
    KeyParse {
        context: String,
        #[source]
        source: pkcs8::Error,
    },

    #[error("local signing operation failed: {message}")]
    Signing { message: String },

    #[error("key generation error: {message}")]
    KeyGeneration { message: String },

    #[error("failed to fetch secret {reference}: {message}")]
    SecretFetch { reference: String, message: String },

    #[error("secret {reference} has no field {field:?}")]
    SecretField { reference: String, field: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Wraps `source` into an [`Error::IdentityLoad`], naming the file or
    /// key reference that failed.
    pub(crate) fn identity_load(context: impl Into<String>, source: Error) -> Self {
        Error::IdentityLoad {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn der(context: &'static str, source: der::Error) -> Self {
        Error::Der { context, source }
    }
}
