//! X.509 certificate handling: parsing, encoding, signature algorithms and
//! self-signed issuance for test fixtures and issuer bootstrap.

pub mod extensions;
pub mod params;

use std::path::Path;

use der::asn1::AnyRef;
use der::{Decode, DecodePem, Encode, EncodePem};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::Error;
use crate::key::{HashAlgorithm, KeyFamily, LocalKeyPair, PublicKey};
use crate::tbs_certificate::TbsCertificate;
use extensions::{BasicConstraints, X509ExtensionValue};
use params::{DistinguishedName, ExtensionParam, Validity};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The six signature algorithms certificates may carry: each key family
/// paired with each supported hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    Sha256WithEcdsa,
    Sha384WithEcdsa,
    Sha512WithEcdsa,
}

impl SignatureAlgorithm {
    pub fn new(family: KeyFamily, hash: HashAlgorithm) -> Self {
        match (family, hash) {
            (KeyFamily::Rsa, HashAlgorithm::Sha256) => SignatureAlgorithm::Sha256WithRsa,
            (KeyFamily::Rsa, HashAlgorithm::Sha384) => SignatureAlgorithm::Sha384WithRsa,
            (KeyFamily::Rsa, HashAlgorithm::Sha512) => SignatureAlgorithm::Sha512WithRsa,
            (KeyFamily::Ec, HashAlgorithm::Sha256) => SignatureAlgorithm::Sha256WithEcdsa,
            (KeyFamily::Ec, HashAlgorithm::Sha384) => SignatureAlgorithm::Sha384WithEcdsa,
            (KeyFamily::Ec, HashAlgorithm::Sha512) => SignatureAlgorithm::Sha512WithEcdsa,
        }
    }

    /// Recognizes a signature algorithm OID, or fails with
    /// [`Error::UnsupportedSignatureOid`].
    pub fn from_oid(oid: const_oid::ObjectIdentifier) -> Result<Self> {
        match oid {
            const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha256WithRsa)
            }
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha384WithRsa)
            }
            const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha512WithRsa)
            }
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256 => Ok(SignatureAlgorithm::Sha256WithEcdsa),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384 => Ok(SignatureAlgorithm::Sha384WithEcdsa),
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => Ok(SignatureAlgorithm::Sha512WithEcdsa),
            other => Err(Error::UnsupportedSignatureOid { oid: other }),
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            SignatureAlgorithm::Sha256WithRsa
            | SignatureAlgorithm::Sha384WithRsa
            | SignatureAlgorithm::Sha512WithRsa => KeyFamily::Rsa,
            SignatureAlgorithm::Sha256WithEcdsa
            | SignatureAlgorithm::Sha384WithEcdsa
            | SignatureAlgorithm::Sha512WithEcdsa => KeyFamily::Ec,
        }
    }

    pub fn hash(&self) -> HashAlgorithm {
        match self {
            SignatureAlgorithm::Sha256WithRsa | SignatureAlgorithm::Sha256WithEcdsa => {
                HashAlgorithm::Sha256
            }
            SignatureAlgorithm::Sha384WithRsa | SignatureAlgorithm::Sha384WithEcdsa => {
                HashAlgorithm::Sha384
            }
            SignatureAlgorithm::Sha512WithRsa | SignatureAlgorithm::Sha512WithEcdsa => {
                HashAlgorithm::Sha512
            }
        }
    }
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        // RSA signature algorithm parameters are an explicit NULL.
        let null = Some(der::Any::from(AnyRef::NULL));
        match value {
            SignatureAlgorithm::Sha256WithRsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: null,
            },
            SignatureAlgorithm::Sha384WithRsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
                parameters: null,
            },
            SignatureAlgorithm::Sha512WithRsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
                parameters: null,
            },
            SignatureAlgorithm::Sha256WithEcdsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithEcdsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Sha512WithEcdsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
                parameters: None,
            },
        }
    }
}

/// An X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub inner: CertificateInner,
}

impl Certificate {
    pub fn from_der(der_bytes: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der_bytes)
            .map_err(|source| Error::der("decoding certificate", source))?;
        Ok(Certificate { inner })
    }

    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let inner = CertificateInner::from_pem(pem_str.as_bytes())
            .map_err(|source| Error::der("decoding PEM certificate", source))?;
        Ok(Certificate { inner })
    }

    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let pem_str = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_pem(&pem_str)
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|source| Error::der("encoding certificate", source))
    }

    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|source| Error::der("encoding PEM certificate", source))
    }

    /// DER encoding of the TBS body this certificate's signature covers.
    pub fn tbs_der(&self) -> Result<Vec<u8>> {
        self.inner
            .tbs_certificate
            .to_der()
            .map_err(|source| Error::der("encoding TBS certificate", source))
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn serial_number_bytes(&self) -> Vec<u8> {
        self.inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .to_vec()
    }

    pub fn spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// The classified subject public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(self.spki())
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::from_oid(self.inner.signature_algorithm.oid)
    }

    /// Verifies this certificate's signature against the signer's public
    /// key.
    pub fn verify_signature(&self, signer_public_key: &PublicKey) -> Result<()> {
        let algorithm = self.signature_algorithm()?;
        let tbs = self.tbs_der()?;
        let digest = algorithm.hash().digest(&tbs);
        let signature =
            self.inner
                .signature
                .as_bytes()
                .ok_or_else(|| Error::SignatureVerification {
                    reason: "signature bit string has unused bits".to_string(),
                })?;
        signer_public_key.verify_digest(&digest, signature, algorithm.hash())
    }

    /// Issues a self-signed CA certificate over `key`, for bootstrapping an
    /// issuer.
    pub fn new_self_signed(
        subject: &DistinguishedName,
        key: &LocalKeyPair,
        validity: Validity,
    ) -> Result<Self> {
        let name = subject.as_x509_name()?;
        let algorithm = SignatureAlgorithm::new(key.family(), HashAlgorithm::Sha256);

        let basic_constraints = BasicConstraints {
            is_ca: true,
            max_path_length: None,
        };
        let extensions = vec![ExtensionParam {
            oid: BasicConstraints::OID,
            critical: true,
            value: basic_constraints.to_x509_extension_value()?,
        }];

        let tbs = TbsCertificate {
            serial_number: rand::random::<u64>().to_be_bytes().to_vec(),
            signature_algorithm: algorithm,
            issuer: name.clone(),
            not_before: validity.not_before,
            not_after: validity.not_after,
            subject: name,
            subject_public_key_info: key.public_key().to_spki()?,
            extensions,
        };
        let tbs_inner = tbs.to_inner()?;
        let tbs_der = tbs_inner
            .to_der()
            .map_err(|source| Error::der("encoding TBS certificate", source))?;

        let digest = HashAlgorithm::Sha256.digest(&tbs_der);
        let signature = key.sign_digest(&digest, HashAlgorithm::Sha256)?;

        Ok(Certificate {
            inner: CertificateInner {
                tbs_certificate: tbs_inner,
                signature_algorithm: algorithm.into(),
                signature: der::asn1::BitString::from_bytes(&signature)
                    .map_err(|source| Error::der("encoding signature", source))?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_signed_certificate_verifies() {
        let key = LocalKeyPair::generate_ecdsa_p256();
        let subject = DistinguishedName::builder()
            .common_name("Test Root")
            .organization("Example")
            .build();

        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30)).unwrap();
        cert.verify_signature(&key.public_key()).unwrap();
        assert_eq!(
            cert.inner.tbs_certificate.issuer,
            cert.inner.tbs_certificate.subject
        );
    }

    #[test]
    fn signature_algorithm_matches_signing_key() {
        let key = LocalKeyPair::generate_rsa(2048).unwrap();
        let subject = DistinguishedName::builder().common_name("RSA Root").build();

        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30)).unwrap();
        assert_eq!(
            cert.signature_algorithm().unwrap(),
            SignatureAlgorithm::Sha256WithRsa
        );
    }

    #[test]
    fn pem_round_trip() {
        let key = LocalKeyPair::generate_ecdsa_p256();
        let subject = DistinguishedName::builder().common_name("PEM Root").build();
        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(30)).unwrap();

        let pem_str = cert.to_pem().unwrap();
        let reparsed = Certificate::from_pem(&pem_str).unwrap();
        assert_eq!(cert.to_der().unwrap(), reparsed.to_der().unwrap());
    }

    #[test]
    fn unknown_signature_oid_is_rejected() {
        let err =
            SignatureAlgorithm::from_oid(const_oid::db::rfc8410::ID_ED_25519).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSignatureOid { .. }));
    }
}
