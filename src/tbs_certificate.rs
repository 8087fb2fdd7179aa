//! The "to be signed" portion of an X.509 certificate.
//!
//! Issuer and subject are carried as full X.501 names so that copying them
//! from a CSR or an issuer certificate loses nothing. The TBS body is what
//! gets digested and handed to the signer.

use der::Encode;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::ExtensionParam;
use crate::error::Error;

pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Lowers into the encodable representation.
    pub fn to_inner(&self) -> Result<TbsCertificateInner, Error> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509)
            .collect::<Result<Vec<_>, _>>()?;

        let not_before = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.not_before.into())
                .map_err(|source| Error::der("encoding notBefore", source))?,
        );
        let not_after = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.not_after.into())
                .map_err(|source| Error::der("encoding notAfter", source))?,
        );

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|source| Error::der("encoding serial number", source))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: x509_cert::time::Validity {
                not_before,
                not_after,
            },
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key_info.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }

    /// DER encoding of the TBS body; this is the exact byte string a
    /// signature covers.
    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.to_inner()?
            .to_der()
            .map_err(|source| Error::der("encoding TBS certificate", source))
    }
}
