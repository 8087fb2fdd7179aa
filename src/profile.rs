//! The leaf certificate profile.
//!
//! A leaf issued here is always an end-entity TLS certificate: one year of
//! validity, non-CA basic constraints, digital signature and key
//! encipherment usage, server and client authentication purposes, and an
//! authority key identifier pointing at the issuer. Extensions the CSR
//! requests are carried over unless the profile already defines the same
//! OID; the profile always wins that conflict.

use der::Encode;
use der::asn1::BitString;
use sha1::{Digest, Sha1};
use tracing::{debug, instrument};
use x509_cert::certificate::CertificateInner;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, KeyUsage,
    KeyUsages,
};
use crate::cert::params::{ExtensionParam, Validity};
use crate::cert::Certificate;
use crate::csr::Csr;
use crate::error::Error;
use crate::identity::Identity;
use crate::key::Result;
use crate::tbs_certificate::TbsCertificate;

const LEAF_VALIDITY_DAYS: i64 = 365;

/// Issues one leaf certificate from a verified CSR under an issuer
/// identity.
pub struct LeafProfile<'a> {
    csr: &'a Csr,
    identity: &'a Identity,
}

impl<'a> LeafProfile<'a> {
    pub fn new(csr: &'a Csr, identity: &'a Identity) -> Self {
        LeafProfile { csr, identity }
    }

    /// Builds, signs and encodes the leaf certificate.
    #[instrument(skip_all)]
    pub fn create(&self) -> Result<Certificate> {
        self.build().map_err(|source| Error::CertificateCreation {
            source: Box::new(source),
        })
    }

    fn build(&self) -> Result<Certificate> {
        let issuer_cert = &self.identity.certificate;
        let hash = self.identity.key.default_hash();
        let algorithm = self.identity.key.signature_algorithm(hash);

        let validity = Validity::for_days(LEAF_VALIDITY_DAYS);
        let tbs = TbsCertificate {
            serial_number: rand::random::<u64>().to_be_bytes().to_vec(),
            signature_algorithm: algorithm,
            issuer: issuer_cert.subject().clone(),
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject: self.csr.subject().clone(),
            subject_public_key_info: self.csr.spki().clone(),
            extensions: self.extensions()?,
        };
        let tbs_inner = tbs.to_inner()?;
        let tbs_der = tbs_inner
            .to_der()
            .map_err(|source| Error::der("encoding TBS certificate", source))?;

        let digest = hash.digest(&tbs_der);
        let signature = self.identity.key.sign_digest(&digest, hash)?;
        debug!(signature.algorithm = ?algorithm, "signed leaf certificate");

        Ok(Certificate {
            inner: CertificateInner {
                tbs_certificate: tbs_inner,
                signature_algorithm: algorithm.into(),
                signature: BitString::from_bytes(&signature)
                    .map_err(|source| Error::der("encoding signature", source))?,
            },
        })
    }

    /// The profile extension set, followed by any CSR-requested extensions
    /// whose OIDs the profile does not already define.
    fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        let issuer_cert = &self.identity.certificate;

        let basic_constraints = BasicConstraints {
            is_ca: false,
            max_path_length: None,
        };
        let key_usage = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let extended_key_usage = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };

        // Key identifier per RFC 5280 method (1): SHA-1 of the issuer's
        // public key bit string.
        let key_id = Sha1::digest(issuer_cert.spki().subject_public_key.raw_bytes());
        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: key_id.to_vec(),
            authority_cert_issuer: issuer_cert.subject().clone(),
            authority_cert_serial_number: issuer_cert.serial_number_bytes(),
        };

        let mut extensions = vec![
            ExtensionParam::from_extension(&basic_constraints, true)?,
            ExtensionParam::from_extension(&key_usage, true)?,
            ExtensionParam::from_extension(&extended_key_usage, false)?,
            ExtensionParam::from_extension(&authority_key_id, false)?,
        ];

        for requested in self.csr.requested_extensions()? {
            if extensions.iter().any(|e| e.oid == requested.oid) {
                debug!(oid = %requested.oid, "dropping requested extension shadowed by profile");
                continue;
            }
            extensions.push(requested);
        }
        Ok(extensions)
    }
}
