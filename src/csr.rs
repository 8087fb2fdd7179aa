//! Certificate signing request parsing and proof-of-possession.
//!
//! A request is only usable after [`Csr::verify_signature`] succeeds; the
//! issuance pipeline refuses to sign anything whose self-signature does not
//! check out.

use const_oid::AssociatedOid;
use der::{Decode, Encode};
use x509_cert::name::Name;
use x509_cert::request::{CertReq, ExtensionReq};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;
use crate::error::Error;
use crate::key::{PublicKey, Result};
use crate::pem_utils;

/// A parsed certification request with its subject key already classified.
#[derive(Debug, Clone)]
pub struct Csr {
    inner: CertReq,
    public_key: PublicKey,
}

impl Csr {
    /// Parses a CSR from PEM or DER, sniffing the format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let der_bytes = if bytes.trim_ascii_start().starts_with(b"-----BEGIN") {
            let pem_str = std::str::from_utf8(bytes).map_err(|_| {
                Error::InvalidInput("PEM input is not valid UTF-8".to_string())
            })?;
            pem_utils::pem_to_der(pem_str)?
        } else {
            bytes.to_vec()
        };

        let inner = CertReq::from_der(&der_bytes).map_err(|source| Error::CsrParse { source })?;
        let public_key = PublicKey::from_spki(&inner.info.public_key)?;
        Ok(Csr { inner, public_key })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.info.subject
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.info.public_key
    }

    /// Checks the request's self-signature, proving the requester holds the
    /// private key for the embedded public key.
    pub fn verify_signature(&self) -> Result<()> {
        let verify = || -> Result<()> {
            let algorithm = SignatureAlgorithm::from_oid(self.inner.algorithm.oid)?;
            if algorithm.family() != self.public_key.family() {
                return Err(Error::SignatureVerification {
                    reason: format!(
                        "{} signature over a {} key",
                        algorithm.family(),
                        self.public_key.family()
                    ),
                });
            }

            let message = self
                .inner
                .info
                .to_der()
                .map_err(|source| Error::der("encoding certification request info", source))?;
            let signature =
                self.inner
                    .signature
                    .as_bytes()
                    .ok_or_else(|| Error::SignatureVerification {
                        reason: "signature bit string has unused bits".to_string(),
                    })?;

            let digest = algorithm.hash().digest(&message);
            self.public_key
                .verify_digest(&digest, signature, algorithm.hash())
        };
        verify().map_err(|source| Error::CsrSignature {
            source: Box::new(source),
        })
    }

    /// Extensions the requester asked for via the extensionRequest
    /// attribute. Empty if the attribute is absent.
    pub fn requested_extensions(&self) -> Result<Vec<ExtensionParam>> {
        for attribute in self.inner.info.attributes.iter() {
            if attribute.oid != ExtensionReq::OID {
                continue;
            }
            let Some(value) = attribute.values.iter().next() else {
                continue;
            };
            let req = value
                .decode_as::<ExtensionReq>()
                .map_err(|source| Error::der("decoding extension request", source))?;
            return Ok(req.0.iter().map(ExtensionParam::from_x509).collect());
        }
        Ok(Vec::new())
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|source| Error::der("encoding certification request", source))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use der::asn1::Ia5String;
    use x509_cert::builder::{Builder, RequestBuilder};
    use x509_cert::ext::pkix::SubjectAltName;
    use x509_cert::ext::pkix::name::GeneralName;

    use super::*;
    use crate::key::KeyFamily;

    fn p256_csr_der() -> (Vec<u8>, p256::ecdsa::SigningKey) {
        let signer = p256::ecdsa::SigningKey::random(&mut rand_core::OsRng);
        let subject = Name::from_str("CN=leaf.example,O=Example").unwrap();
        let builder = RequestBuilder::new(subject, &signer).unwrap();
        let req = builder.build::<p256::ecdsa::DerSignature>().unwrap();
        (req.to_der().unwrap(), signer)
    }

    #[test]
    fn parses_der_and_verifies() {
        let (der_bytes, _) = p256_csr_der();

        let csr = Csr::from_bytes(&der_bytes).unwrap();
        assert_eq!(csr.public_key().family(), KeyFamily::Ec);
        csr.verify_signature().unwrap();
    }

    #[test]
    fn parses_pem_and_verifies() {
        let (der_bytes, _) = p256_csr_der();
        let pem_str = pem_utils::der_to_pem(&der_bytes, "CERTIFICATE REQUEST");

        let csr = Csr::from_bytes(pem_str.as_bytes()).unwrap();
        csr.verify_signature().unwrap();
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let (mut der_bytes, _) = p256_csr_der();
        let last = der_bytes.len() - 1;
        der_bytes[last] ^= 0x01;

        let csr = Csr::from_bytes(&der_bytes).unwrap();
        let err = csr.verify_signature().unwrap_err();
        assert!(matches!(err, Error::CsrSignature { .. }));
    }

    #[test]
    fn garbage_input_fails_to_parse() {
        let err = Csr::from_bytes(&[0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, Error::CsrParse { .. }));
    }

    #[test]
    fn carries_requested_extensions() {
        let signer = p256::ecdsa::SigningKey::random(&mut rand_core::OsRng);
        let subject = Name::from_str("CN=san.example").unwrap();
        let mut builder = RequestBuilder::new(subject, &signer).unwrap();
        let san = SubjectAltName(vec![GeneralName::DnsName(
            Ia5String::new("san.example").unwrap(),
        )]);
        builder.add_extension(&san).unwrap();
        let req = builder.build::<p256::ecdsa::DerSignature>().unwrap();

        let csr = Csr::from_bytes(&req.to_der().unwrap()).unwrap();
        let extensions = csr.requested_extensions().unwrap();
        assert_eq!(extensions.len(), 1);
        assert_eq!(extensions[0].oid, SubjectAltName::OID);
    }

    #[test]
    fn no_attribute_means_no_requested_extensions() {
        let (der_bytes, _) = p256_csr_der();
        let csr = Csr::from_bytes(&der_bytes).unwrap();
        assert!(csr.requested_extensions().unwrap().is_empty());
    }
}
