//! Building blocks shared by certificate construction: names, validity
//! periods and raw extension parameters.

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::Name;

use super::extensions::X509ExtensionValue;
use crate::error::Error;

/// Distinguished name components for building a certificate subject or
/// issuer. Absent components are omitted from the encoded name.
#[derive(Clone, Debug, Builder, Default)]
#[builder(on(String, into))]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Encodes the name as an X.501 RDN sequence.
    pub fn as_x509_name(&self) -> Result<Name, Error> {
        use core::str::FromStr;
        let mut parts = vec![format!("CN={}", self.common_name)];
        if let Some(ou) = &self.organization_unit {
            parts.push(format!("OU={ou}"));
        }
        if let Some(o) = &self.organization {
            parts.push(format!("O={o}"));
        }
        if let Some(l) = &self.locality {
            parts.push(format!("L={l}"));
        }
        if let Some(st) = &self.state {
            parts.push(format!("ST={st}"));
        }
        if let Some(c) = &self.country {
            parts.push(format!("C={c}"));
        }
        Name::from_str(&parts.join(","))
            .map_err(|source| Error::der("parsing distinguished name", source))
    }
}

/// Certificate validity period.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// A validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }
}

/// A raw X.509 extension: OID, criticality flag and DER-encoded value.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Encodes a typed extension value into its raw form.
    pub fn from_extension<E: X509ExtensionValue>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    pub fn from_x509(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension, Error> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.as_slice())
                .map_err(|source| Error::der("encoding extension value", source))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_omits_absent_components() {
        let dn = DistinguishedName::builder().common_name("leaf.example").build();

        let rendered = dn.as_x509_name().unwrap().to_string();
        assert_eq!(rendered, "CN=leaf.example");
    }

    #[test]
    fn name_carries_all_components() {
        let dn = DistinguishedName::builder()
            .common_name("Issuing CA")
            .country("DE")
            .state("Berlin")
            .locality("Berlin")
            .organization("Example AG")
            .organization_unit("PKI")
            .build();

        let rendered = dn.as_x509_name().unwrap().to_string();
        assert!(rendered.contains("CN=Issuing CA"));
        assert!(rendered.contains("C=DE"));
        assert!(rendered.contains("O=Example AG"));
        assert!(rendered.contains("OU=PKI"));
    }

    #[test]
    fn validity_for_days_spans_requested_period() {
        let validity = Validity::for_days(365);
        let span = validity.not_after - validity.not_before;
        assert_eq!(span.whole_days(), 365);
    }
}
